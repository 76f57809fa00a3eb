use crate::application::ErrorKind;
use crate::application::account::AccountError;
use crate::application::booking::BookingError;
use crate::application::inventory::InventoryError;
use crate::domain::EquipmentValidationError;
use crate::ports::StoreError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーを分類（`ErrorKind`）とメッセージに変換し、
/// HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    fields: Option<Vec<EquipmentValidationError>>,
    /// ログ専用の詳細（クライアントには返さない）
    internal: Option<String>,
}

impl ApiError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            internal: None,
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// エラーの原因を連結した文字列（ログ用）
    fn describe(err: &dyn std::error::Error) -> String {
        let mut chain = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push_str(": ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        chain
    }

    fn from_app_error(kind: ErrorKind, err: &dyn std::error::Error) -> Self {
        let mut api_error = Self::new(kind, err.to_string());
        if kind == ErrorKind::PersistenceFailure {
            api_error.internal = Some(Self::describe(err));
        }
        api_error
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::from_app_error(err.kind(), &err)
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        ApiError::from_app_error(err.kind(), &err)
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        let mut api_error = ApiError::from_app_error(err.kind(), &err);
        if let InventoryError::InvalidEquipment(fields) = err {
            api_error.fields = Some(fields);
        }
        api_error
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::from_app_error(ErrorKind::PersistenceFailure, &err)
    }
}

// 本文・パラメータの解析失敗は、axumの既定のテキスト応答ではなく400のJSONで返す
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self.kind {
            // 404 Not Found - リクエストされたリソースが存在しない
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            // 409 Conflict - 既存の予約・貸出と重なる、メールアドレスの重複
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            // 422 Unprocessable Entity - ビジネスルール違反
            ErrorKind::PolicyViolation => (StatusCode::UNPROCESSABLE_ENTITY, "POLICY_VIOLATION"),
            ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ErrorKind::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            // 500 Internal Server Error - システム障害
            ErrorKind::PersistenceFailure => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_FAILURE")
            }
        };

        // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
        let message = match &self.internal {
            Some(detail) => {
                tracing::error!("Persistence failure: {}", detail);
                "An unexpected error occurred".to_string()
            }
            None => self.message,
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            fields: self.fields,
        });
        (status, body).into_response()
    }
}
