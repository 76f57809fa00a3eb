pub mod booking_store;
pub mod inventory_store;
pub mod person_store;
pub mod session_store;

// パブリックに型を再エクスポート
pub use booking_store::BookingStore as PostgresBookingStore;
pub use inventory_store::InventoryStore as PostgresInventoryStore;
pub use person_store::PersonStore as PostgresPersonStore;
pub use session_store::SessionStore as PostgresSessionStore;

use crate::application::ServiceDependencies;
use crate::domain::{
    AtelierId, AuthorizationScope, BookingEvent, EquipmentId, Loan, LoanId, LoanStatus, PersonId,
    Reservation, ReservationId, TimeWindow,
};
use crate::ports::{Result, StoreError};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use std::str::FromStr;
use std::sync::Arc;

/// メールアドレスの一意制約名（マイグレーションで定義）
const PERSONS_EMAIL_KEY: &str = "persons_email_key";

pub(crate) const RESERVATION_COLUMNS: &str =
    "reservation_id, equipment_id, person_id, start_at, end_at, created_at";
pub(crate) const LOAN_COLUMNS: &str =
    "loan_id, equipment_id, person_id, atelier_id, start_at, end_at, status";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() && db_err.constraint() == Some(PERSONS_EMAIL_KEY) {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::backend(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::backend(err)
    }
}

fn invalid_data(message: String) -> StoreError {
    StoreError::backend(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// 行の開始・終了から時間帯を復元する
fn map_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<TimeWindow> {
    TimeWindow::new(start, end)
        .map_err(|_| invalid_data(format!("stored window is empty: {} .. {}", start, end)))
}

/// reservations の行を予約に変換する
pub(crate) fn map_reservation(row: &PgRow) -> Result<Reservation> {
    Ok(Reservation {
        reservation_id: ReservationId::from_i64(row.get("reservation_id")),
        equipment_id: EquipmentId::from_i64(row.get("equipment_id")),
        person_id: PersonId::from_i64(row.get("person_id")),
        window: map_window(row.get("start_at"), row.get("end_at"))?,
        created_at: row.get("created_at"),
    })
}

/// loans の行を貸出に変換する
pub(crate) fn map_loan(row: &PgRow) -> Result<Loan> {
    let status_str: &str = row.get("status");
    let status = LoanStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(Loan {
        loan_id: LoanId::from_i64(row.get("loan_id")),
        equipment_id: EquipmentId::from_i64(row.get("equipment_id")),
        person_id: PersonId::from_i64(row.get("person_id")),
        atelier_id: AtelierId::from_i64(row.get("atelier_id")),
        window: map_window(row.get("start_at"), row.get("end_at"))?,
        status,
    })
}

/// 履歴イベントを追記する（呼び出し側のトランザクション内で）
pub(crate) async fn append_event(conn: &mut PgConnection, event: &BookingEvent) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO booking_events (equipment_id, event_type, event_data, occurred_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(event.equipment_id().value())
    .bind(event.event_type())
    .bind(serde_json::to_value(event)?)
    .bind(event.occurred_at())
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) fn atelier_values(ateliers: &[AtelierId]) -> Vec<i64> {
    ateliers.iter().map(AtelierId::value).collect()
}

/// PostgreSQLストアを使うサービス依存関係を組み立てる
pub fn postgres_dependencies(
    pool: PgPool,
    authorization_scope: AuthorizationScope,
) -> ServiceDependencies {
    ServiceDependencies::new(
        Arc::new(PostgresBookingStore::new(pool.clone())),
        Arc::new(PostgresInventoryStore::new(pool.clone())),
        Arc::new(PostgresPersonStore::new(pool.clone())),
        Arc::new(PostgresSessionStore::new(pool)),
        authorization_scope,
    )
}
