use crate::application::{
    ServiceDependencies, account, booking, calendar, calendar::CalendarEvent, dashboard,
    dashboard::Dashboard, inventory,
};
use crate::domain::{
    Atelier, AtelierId, BookingEvent, Equipment, EquipmentId, EquipmentType, EquipmentTypeId, Loan,
    LoanId, Person, PersonId, Reservation, ReservationId,
    commands::{AcceptReservation, CancelReservation, ChangeRole, ReturnLoan},
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use std::sync::Arc;

use super::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery, AuthenticatedCaller, OptionalSession},
    types::{
        AddMemberRequest, AvailabilityQuery, AvailabilityResponse, ChangeRoleRequest,
        CreateReservationRequest, LandingResponse, LoginRequest, NameRequest,
        RegisterEquipmentRequest, RegisterRequest, SessionResponse, UpdateProfileRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Accounts
// ============================================================================

/// POST /auth/register - 利用者登録（登録後はそのままログイン状態）
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let grant = account::register(&state.service_deps, req.to_command(Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(grant.into())))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let grant = account::login(&state.service_deps, &req.email, &req.password, Utc::now()).await?;
    Ok(Json(grant.into()))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
) -> Result<StatusCode, ApiError> {
    account::logout(&state.service_deps, auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/landing - ロールに応じた遷移先ページ
///
/// セッションがなければログインページ。
pub async fn landing(
    State(state): State<Arc<AppState>>,
    OptionalSession(token): OptionalSession,
) -> Result<Json<LandingResponse>, ApiError> {
    let page = account::landing_for(&state.service_deps, token, Utc::now()).await?;
    Ok(Json(page.into()))
}

/// GET /dashboard - ロール別ダッシュボード
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
) -> Result<Json<Dashboard>, ApiError> {
    let view = dashboard::dashboard(&state.service_deps, &auth.caller).await?;
    Ok(Json(view))
}

/// PUT /account - 自分の氏名・メールアドレスの編集
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<Person>, ApiError> {
    let person =
        account::update_profile(&state.service_deps, &auth.caller, req.to_command()).await?;
    Ok(Json(person))
}

/// PUT /persons/:id/role
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(person_id): ApiPath<i64>,
    ApiJson(req): ApiJson<ChangeRoleRequest>,
) -> Result<Json<Person>, ApiError> {
    let cmd = ChangeRole {
        person_id: PersonId::from_i64(person_id),
        role: req.role,
    };
    let person = account::change_role(&state.service_deps, &auth.caller, cmd).await?;
    Ok(Json(person))
}

/// DELETE /persons/:id
pub async fn delete_person(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(person_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    account::delete_person(
        &state.service_deps,
        &auth.caller,
        PersonId::from_i64(person_id),
        Utc::now(),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Bookings
// ============================================================================

/// GET /equipment/:id/availability?start=&end=
pub async fn availability(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedCaller,
    ApiPath(equipment_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let equipment_id = EquipmentId::from_i64(equipment_id);
    let available =
        booking::is_available(&state.service_deps, equipment_id, query.start, query.end).await?;

    Ok(Json(AvailabilityResponse {
        equipment_id,
        start: query.start,
        end: query.end,
        available,
    }))
}

/// GET /equipment/:id/calendar
pub async fn equipment_calendar(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedCaller,
    ApiPath(equipment_id): ApiPath<i64>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let events =
        calendar::equipment_calendar(&state.service_deps, EquipmentId::from_i64(equipment_id))
            .await?;
    Ok(Json(events))
}

/// GET /equipment/:id/history - 予約・貸出の履歴（職員のみ）
pub async fn equipment_history(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(equipment_id): ApiPath<i64>,
) -> Result<Json<Vec<BookingEvent>>, ApiError> {
    if !auth.caller.role.is_staff() {
        return Err(booking::BookingError::Forbidden("only staff may read booking history").into());
    }
    let events =
        booking::equipment_history(&state.service_deps, EquipmentId::from_i64(equipment_id))
            .await?;
    Ok(Json(events))
}

/// POST /reservations - 予約申請
///
/// 強制されるビジネスルール:
/// - 機材が存在すること
/// - 既存の予約・貸出と重ならないこと
/// - 開始が過去でないこと
/// - 期間が機材の最大貸出日数以下であること
pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiJson(req): ApiJson<CreateReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let reservation =
        booking::request_reservation(&state.service_deps, &auth.caller, req.to_command(Utc::now()))
            .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// POST /reservations/:id/accept - 予約を承認して貸出を作成
pub async fn accept_reservation(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(reservation_id): ApiPath<i64>,
) -> Result<(StatusCode, Json<Loan>), ApiError> {
    let cmd = AcceptReservation {
        reservation_id: ReservationId::from_i64(reservation_id),
        accepted_at: Utc::now(),
    };
    let loan = booking::accept_reservation(&state.service_deps, &auth.caller, cmd).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// DELETE /reservations/:id - 予約の取消
pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(reservation_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    let cmd = CancelReservation {
        reservation_id: ReservationId::from_i64(reservation_id),
        cancelled_at: Utc::now(),
    };
    booking::cancel_reservation(&state.service_deps, &auth.caller, cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /loans/:id/return - 貸出の返却
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(loan_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    let cmd = ReturnLoan {
        loan_id: LoanId::from_i64(loan_id),
        returned_at: Utc::now(),
    };
    booking::return_loan(&state.service_deps, &auth.caller, cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Inventory
// ============================================================================

/// POST /ateliers
pub async fn create_atelier(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiJson(req): ApiJson<NameRequest>,
) -> Result<(StatusCode, Json<Atelier>), ApiError> {
    let atelier = inventory::create_atelier(&state.service_deps, &auth.caller, &req.name).await?;
    Ok((StatusCode::CREATED, Json(atelier)))
}

/// PUT /ateliers/:id - アトリエ名の変更
pub async fn rename_atelier(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(atelier_id): ApiPath<i64>,
    ApiJson(req): ApiJson<NameRequest>,
) -> Result<Json<Atelier>, ApiError> {
    let atelier = inventory::rename_atelier(
        &state.service_deps,
        &auth.caller,
        AtelierId::from_i64(atelier_id),
        &req.name,
    )
    .await?;
    Ok(Json(atelier))
}

/// DELETE /ateliers/:id
pub async fn delete_atelier(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(atelier_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    inventory::delete_atelier(&state.service_deps, &auth.caller, AtelierId::from_i64(atelier_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /ateliers/:id/members
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(atelier_id): ApiPath<i64>,
    ApiJson(req): ApiJson<AddMemberRequest>,
) -> Result<StatusCode, ApiError> {
    inventory::add_member(
        &state.service_deps,
        &auth.caller,
        AtelierId::from_i64(atelier_id),
        req.person_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /ateliers/:id/members/:person_id
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath((atelier_id, person_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    inventory::remove_member(
        &state.service_deps,
        &auth.caller,
        AtelierId::from_i64(atelier_id),
        PersonId::from_i64(person_id),
        Utc::now(),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /equipment-types
pub async fn create_equipment_type(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiJson(req): ApiJson<NameRequest>,
) -> Result<(StatusCode, Json<EquipmentType>), ApiError> {
    let equipment_type =
        inventory::create_equipment_type(&state.service_deps, &auth.caller, &req.name).await?;
    Ok((StatusCode::CREATED, Json(equipment_type)))
}

/// PUT /equipment-types/:id - 機材種別名の変更
pub async fn rename_equipment_type(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(type_id): ApiPath<i64>,
    ApiJson(req): ApiJson<NameRequest>,
) -> Result<Json<EquipmentType>, ApiError> {
    let equipment_type = inventory::rename_equipment_type(
        &state.service_deps,
        &auth.caller,
        EquipmentTypeId::from_i64(type_id),
        &req.name,
    )
    .await?;
    Ok(Json(equipment_type))
}

/// DELETE /equipment-types/:id
pub async fn delete_equipment_type(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(type_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    inventory::delete_equipment_type(
        &state.service_deps,
        &auth.caller,
        EquipmentTypeId::from_i64(type_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /equipment - 機材登録
///
/// 強制されるビジネスルール:
/// - 名前は2〜100文字
/// - 製造日 <= 購入日 <= 今日
/// - 最大貸出日数は1〜365日
pub async fn register_equipment(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiJson(req): ApiJson<RegisterEquipmentRequest>,
) -> Result<(StatusCode, Json<Equipment>), ApiError> {
    let equipment = inventory::register_equipment(
        &state.service_deps,
        &auth.caller,
        req.to_command(),
        Utc::now().date_naive(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// PUT /equipment/:id - 機材情報の編集（登録と同じ検証）
pub async fn update_equipment(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(equipment_id): ApiPath<i64>,
    ApiJson(req): ApiJson<RegisterEquipmentRequest>,
) -> Result<Json<Equipment>, ApiError> {
    let equipment = inventory::update_equipment(
        &state.service_deps,
        &auth.caller,
        req.to_update_command(EquipmentId::from_i64(equipment_id)),
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(equipment))
}

/// DELETE /equipment/:id
pub async fn delete_equipment(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedCaller,
    ApiPath(equipment_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    inventory::delete_equipment(
        &state.service_deps,
        &auth.caller,
        EquipmentId::from_i64(equipment_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
