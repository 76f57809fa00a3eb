//! リクエストから呼び出し元・本文・パラメータを取り出すエクストラクタ
//!
//! 本文やパラメータの解析失敗も`ApiError`（400 INVALID_INPUT）として返す。

use crate::application::account;
use crate::domain::{Caller, SessionToken};
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::error::ApiError;
use super::handlers::AppState;

/// `Authorization: Bearer <token>` からトークンを読む
///
/// ヘッダーがなければ`Ok(None)`。
fn bearer_token(parts: &Parts) -> Result<Option<SessionToken>, ApiError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthenticated("Malformed authorization header"))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthenticated("Expected a bearer token"))?;

    token
        .trim()
        .parse::<SessionToken>()
        .map(Some)
        .map_err(|_| ApiError::unauthenticated("Malformed session token"))
}

/// 認証済みの呼び出し元
///
/// 有効なセッションがなければ401を返す。
pub struct AuthenticatedCaller {
    pub caller: Caller,
    pub token: SessionToken,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;
        let caller = account::resolve_caller(&state.service_deps, token, Utc::now()).await?;
        Ok(AuthenticatedCaller { caller, token })
    }
}

/// 任意のセッショントークン（遷移先ページの判定用）
///
/// ヘッダーの欠落・形式不正はどちらも`None`。
pub struct OptionalSession(pub Option<SessionToken>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalSession(bearer_token(parts).ok().flatten()))
    }
}

/// JSON本文
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// クエリ文字列
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(value))
    }
}

/// パスパラメータ
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}
