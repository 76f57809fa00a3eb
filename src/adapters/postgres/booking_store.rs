use crate::domain::{
    AtelierId, BookingConflict, BookingEvent, EquipmentId, Loan, LoanDraft, LoanId, PersonId,
    Reservation, ReservationDraft, ReservationId,
};
use crate::ports::booking_store::BookingStore as BookingStoreTrait;
use crate::ports::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Row};

use super::{
    LOAN_COLUMNS, RESERVATION_COLUMNS, append_event, atelier_values, map_loan, map_reservation,
};

/// BookingStoreのPostgreSQL実装
///
/// 書き込みはすべて SERIALIZABLE トランザクションで行い、
/// 重複の再検証・行の変更・履歴イベントの追記を同じトランザクションに収める。
/// テーブル側の EXCLUDE 制約が最後の防衛線になる。
pub struct BookingStore {
    pool: PgPool,
}

impl BookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// トランザクション分離レベルを SERIALIZABLE に設定する
///
/// トランザクション内の最初の文として実行すること。
async fn set_serializable(conn: &mut PgConnection) -> Result<()> {
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(conn)
        .await?;
    Ok(())
}

/// 時間帯が同じ機材の予約・貸出と重ならないか確認する
///
/// 重複条件：existing.start < new.end AND new.start < existing.end
/// `ignore`の予約は対象外。
async fn find_overlap(
    conn: &mut PgConnection,
    equipment_id: EquipmentId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    ignore: Option<ReservationId>,
) -> Result<Option<BookingConflict>> {
    let reservation: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT reservation_id
        FROM reservations
        WHERE equipment_id = $1
          AND start_at < $3
          AND $2 < end_at
          AND ($4::BIGINT IS NULL OR reservation_id <> $4)
        ORDER BY reservation_id
        LIMIT 1
        "#,
    )
    .bind(equipment_id.value())
    .bind(start)
    .bind(end)
    .bind(ignore.map(|id| id.value()))
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = reservation {
        return Ok(Some(BookingConflict::Reservation(ReservationId::from_i64(id))));
    }

    let loan: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT loan_id
        FROM loans
        WHERE equipment_id = $1
          AND start_at < $3
          AND $2 < end_at
        ORDER BY loan_id
        LIMIT 1
        "#,
    )
    .bind(equipment_id.value())
    .bind(start)
    .bind(end)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(loan.map(|id| BookingConflict::Loan(LoanId::from_i64(id))))
}

#[async_trait]
impl BookingStoreTrait for BookingStore {
    async fn reservations_for_equipment(
        &self,
        equipment_id: EquipmentId,
    ) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE equipment_id = $1 ORDER BY start_at"
        ))
        .bind(equipment_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_reservation).collect()
    }

    async fn loans_for_equipment(&self, equipment_id: EquipmentId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE equipment_id = $1 ORDER BY start_at"
        ))
        .bind(equipment_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_loan).collect()
    }

    async fn get_reservation(&self, reservation_id: ReservationId) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE reservation_id = $1"
        ))
        .bind(reservation_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_reservation).transpose()
    }

    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!("SELECT {LOAN_COLUMNS} FROM loans WHERE loan_id = $1"))
            .bind(loan_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_loan).transpose()
    }

    async fn reservations_for_person(&self, person_id: PersonId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE person_id = $1 ORDER BY start_at"
        ))
        .bind(person_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_reservation).collect()
    }

    async fn loans_for_person(&self, person_id: PersonId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE person_id = $1 ORDER BY start_at"
        ))
        .bind(person_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_loan).collect()
    }

    async fn reservations_for_ateliers(&self, ateliers: &[AtelierId]) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT r.reservation_id, r.equipment_id, r.person_id, r.start_at, r.end_at, r.created_at
            FROM reservations r
            JOIN equipment e ON e.equipment_id = r.equipment_id
            WHERE e.atelier_id = ANY($1)
            ORDER BY r.start_at
            "#,
        )
        .bind(atelier_values(ateliers))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_reservation).collect()
    }

    async fn loans_for_ateliers(&self, ateliers: &[AtelierId]) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE atelier_id = ANY($1) ORDER BY start_at"
        ))
        .bind(atelier_values(ateliers))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_loan).collect()
    }

    async fn all_reservations(&self) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations ORDER BY start_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_reservation).collect()
    }

    async fn all_loans(&self) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!("SELECT {LOAN_COLUMNS} FROM loans ORDER BY start_at"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_loan).collect()
    }

    async fn insert_reservation(&self, draft: ReservationDraft) -> Result<Reservation> {
        let mut tx = self.pool.begin().await?;
        set_serializable(&mut tx).await?;

        // ① 機材の存在確認
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT equipment_id FROM equipment WHERE equipment_id = $1")
                .bind(draft.equipment_id.value())
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(StoreError::NotFound);
        }

        // ② 重複の再検証
        let window = draft.window;
        if let Some(conflict) =
            find_overlap(&mut tx, draft.equipment_id, window.start(), window.end(), None).await?
        {
            return Err(StoreError::Overlap(conflict));
        }

        // ③ 予約の挿入
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO reservations (equipment_id, person_id, start_at, end_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(draft.equipment_id.value())
        .bind(draft.person_id.value())
        .bind(window.start())
        .bind(window.end())
        .bind(draft.created_at)
        .fetch_one(&mut *tx)
        .await?;
        let reservation = map_reservation(&row)?;

        append_event(&mut tx, &BookingEvent::reservation_requested(&reservation)).await?;

        tx.commit().await?;
        Ok(reservation)
    }

    async fn promote_reservation(
        &self,
        reservation_id: ReservationId,
        draft: LoanDraft,
        accepted_by: PersonId,
    ) -> Result<Loan> {
        let mut tx = self.pool.begin().await?;
        set_serializable(&mut tx).await?;

        // ① 予約の削除（なければ NotFound）
        let deleted: Option<i64> = sqlx::query_scalar(
            "DELETE FROM reservations WHERE reservation_id = $1 RETURNING reservation_id",
        )
        .bind(reservation_id.value())
        .fetch_optional(&mut *tx)
        .await?;
        if deleted.is_none() {
            return Err(StoreError::NotFound);
        }

        // ② 前倒しになった貸出期間の再検証（予約は削除済みなので自分自身とは衝突しない）
        let window = draft.window;
        if let Some(conflict) =
            find_overlap(&mut tx, draft.equipment_id, window.start(), window.end(), None).await?
        {
            return Err(StoreError::Overlap(conflict));
        }

        // ③ 貸出の作成
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO loans (equipment_id, person_id, atelier_id, start_at, end_at, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {LOAN_COLUMNS}
            "#
        ))
        .bind(draft.equipment_id.value())
        .bind(draft.person_id.value())
        .bind(draft.atelier_id.value())
        .bind(window.start())
        .bind(window.end())
        .bind(draft.status.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let loan = map_loan(&row)?;

        append_event(
            &mut tx,
            &BookingEvent::reservation_accepted(reservation_id, &loan, accepted_by),
        )
        .await?;

        tx.commit().await?;
        Ok(loan)
    }

    async fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
        cancelled_by: PersonId,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Reservation> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "DELETE FROM reservations WHERE reservation_id = $1 RETURNING {RESERVATION_COLUMNS}"
        ))
        .bind(reservation_id.value())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;
        let reservation = map_reservation(&row)?;

        append_event(
            &mut tx,
            &BookingEvent::reservation_cancelled(&reservation, cancelled_by, cancelled_at),
        )
        .await?;

        tx.commit().await?;
        Ok(reservation)
    }

    async fn return_loan(
        &self,
        loan_id: LoanId,
        returned_by: PersonId,
        returned_at: DateTime<Utc>,
    ) -> Result<Loan> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "DELETE FROM loans WHERE loan_id = $1 RETURNING {LOAN_COLUMNS}"
        ))
        .bind(loan_id.value())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;
        let loan = map_loan(&row)?;

        append_event(
            &mut tx,
            &BookingEvent::loan_returned(&loan, returned_by, returned_at),
        )
        .await?;

        tx.commit().await?;
        Ok(loan)
    }

    async fn history_for_equipment(&self, equipment_id: EquipmentId) -> Result<Vec<BookingEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT event_data
            FROM booking_events
            WHERE equipment_id = $1
            ORDER BY event_id
            "#,
        )
        .bind(equipment_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<BookingEvent> {
                let data: serde_json::Value = row.get("event_data");
                Ok(serde_json::from_value(data)?)
            })
            .collect()
    }
}
