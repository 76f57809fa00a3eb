use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::account::SessionGrant;
use crate::domain::{
    AtelierId, EquipmentId, EquipmentTypeId, EquipmentValidationError, LandingPage, PersonId, Role,
    commands::{
        RegisterEquipment, RegisterPerson, RequestReservation, UpdateEquipment, UpdateProfile,
    },
};

/// 利用者登録リクエスト（POST /auth/register）
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn to_command(self, registered_at: DateTime<Utc>) -> RegisterPerson {
        RegisterPerson {
            first_name: self.first_name,
            surname: self.surname,
            email: self.email,
            password: self.password,
            registered_at,
        }
    }
}

/// ログインリクエスト（POST /auth/login）
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// ログイン・登録のレスポンス
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: Uuid,
    pub person_id: PersonId,
    pub role: Option<Role>,
    pub landing_page: &'static str,
}

impl From<SessionGrant> for SessionResponse {
    fn from(grant: SessionGrant) -> Self {
        Self {
            token: grant.token.value(),
            person_id: grant.person.person_id,
            role: grant.person.role,
            landing_page: grant.landing_page.path(),
        }
    }
}

/// 遷移先ページ（GET /auth/landing）
#[derive(Debug, Serialize)]
pub struct LandingResponse {
    pub landing_page: &'static str,
}

impl From<LandingPage> for LandingResponse {
    fn from(page: LandingPage) -> Self {
        Self {
            landing_page: page.path(),
        }
    }
}

/// 空き状況のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// 空き状況レスポンス
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub equipment_id: EquipmentId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

/// 予約申請リクエスト（POST /reservations）
///
/// 予約者は認証済みの呼び出し元。
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub equipment_id: EquipmentId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CreateReservationRequest {
    pub fn to_command(&self, requested_at: DateTime<Utc>) -> RequestReservation {
        RequestReservation {
            equipment_id: self.equipment_id,
            start: self.start,
            end: self.end,
            requested_at,
        }
    }
}

/// 名前だけを持つ作成・変更リクエスト（アトリエ・機材種別）
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// メンバー追加リクエスト
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub person_id: PersonId,
}

/// 機材登録・編集リクエスト（POST /equipment, PUT /equipment/:id）
#[derive(Debug, Deserialize)]
pub struct RegisterEquipmentRequest {
    pub name: String,
    pub atelier_id: AtelierId,
    pub type_id: EquipmentTypeId,
    pub manufacture_date: NaiveDate,
    pub purchase_date: NaiveDate,
    pub max_loan_duration_days: i32,
}

impl RegisterEquipmentRequest {
    pub fn to_command(self) -> RegisterEquipment {
        RegisterEquipment {
            name: self.name,
            atelier_id: self.atelier_id,
            type_id: self.type_id,
            manufacture_date: self.manufacture_date,
            purchase_date: self.purchase_date,
            max_loan_duration_days: self.max_loan_duration_days,
        }
    }

    pub fn to_update_command(self, equipment_id: EquipmentId) -> UpdateEquipment {
        UpdateEquipment {
            equipment_id,
            name: self.name,
            atelier_id: self.atelier_id,
            type_id: self.type_id,
            manufacture_date: self.manufacture_date,
            purchase_date: self.purchase_date,
            max_loan_duration_days: self.max_loan_duration_days,
        }
    }
}

/// プロフィール編集リクエスト（PUT /account）
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub surname: String,
    pub email: String,
}

impl UpdateProfileRequest {
    pub fn to_command(self) -> UpdateProfile {
        UpdateProfile {
            first_name: self.first_name,
            surname: self.surname,
            email: self.email,
        }
    }
}

/// ロール変更リクエスト（PUT /persons/:id/role）
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// 機材登録の項目別エラー
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<EquipmentValidationError>>,
}
