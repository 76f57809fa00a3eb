use crate::domain::{BookingEvent, Person, PersonDraft, PersonId, Role};
use crate::ports::person_store::PersonStore as PersonStoreTrait;
use crate::ports::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{LOAN_COLUMNS, RESERVATION_COLUMNS, append_event, map_loan, map_reservation};

const PERSON_COLUMNS: &str = "person_id, first_name, surname, email, role, password_hash, created_at";

/// persons の行を利用者に変換する
///
/// 未知のロール文字列はロールなしとして読み込む。
fn map_person(row: &PgRow) -> Person {
    let role: Option<String> = row.get("role");
    Person {
        person_id: PersonId::from_i64(row.get("person_id")),
        first_name: row.get("first_name"),
        surname: row.get("surname"),
        email: row.get("email"),
        role: role.as_deref().and_then(Role::parse),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

/// PersonStoreのPostgreSQL実装
pub struct PersonStore {
    pool: PgPool,
}

impl PersonStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonStoreTrait for PersonStore {
    async fn insert_person(&self, draft: PersonDraft) -> Result<Person> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO persons (first_name, surname, email, role, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PERSON_COLUMNS}
            "#
        ))
        .bind(&draft.first_name)
        .bind(&draft.surname)
        .bind(&draft.email)
        .bind(draft.role.map(|r| r.as_str()))
        .bind(&draft.password_hash)
        .bind(draft.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_person(&row))
    }

    async fn get_person(&self, person_id: PersonId) -> Result<Option<Person>> {
        let row = sqlx::query(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE person_id = $1"
        ))
        .bind(person_id.value())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_person))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>> {
        let row = sqlx::query(&format!("SELECT {PERSON_COLUMNS} FROM persons WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_person))
    }

    async fn list_persons(&self) -> Result<Vec<Person>> {
        let rows = sqlx::query(&format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY person_id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_person).collect())
    }

    async fn update_role(&self, person_id: PersonId, role: Role) -> Result<Person> {
        let row = sqlx::query(&format!(
            "UPDATE persons SET role = $2 WHERE person_id = $1 RETURNING {PERSON_COLUMNS}"
        ))
        .bind(person_id.value())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(map_person(&row))
    }

    async fn update_profile(
        &self,
        person_id: PersonId,
        first_name: &str,
        surname: &str,
        email: &str,
    ) -> Result<Person> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE persons SET first_name = $2, surname = $3, email = $4
            WHERE person_id = $1
            RETURNING {PERSON_COLUMNS}
            "#
        ))
        .bind(person_id.value())
        .bind(first_name)
        .bind(surname)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(map_person(&row))
    }

    /// 予約・貸出を先に削除して履歴を残し、残りは外部キーの連鎖に任せる
    async fn delete_person(
        &self,
        person_id: PersonId,
        deleted_by: PersonId,
        deleted_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let reservations = sqlx::query(&format!(
            "DELETE FROM reservations WHERE person_id = $1 RETURNING {RESERVATION_COLUMNS}"
        ))
        .bind(person_id.value())
        .fetch_all(&mut *tx)
        .await?;
        for row in &reservations {
            let reservation = map_reservation(row)?;
            append_event(
                &mut tx,
                &BookingEvent::reservation_cancelled(&reservation, deleted_by, deleted_at),
            )
            .await?;
        }

        let loans = sqlx::query(&format!(
            "DELETE FROM loans WHERE person_id = $1 RETURNING {LOAN_COLUMNS}"
        ))
        .bind(person_id.value())
        .fetch_all(&mut *tx)
        .await?;
        for row in &loans {
            let loan = map_loan(row)?;
            append_event(
                &mut tx,
                &BookingEvent::loan_returned(&loan, deleted_by, deleted_at),
            )
            .await?;
        }

        let result = sqlx::query("DELETE FROM persons WHERE person_id = $1")
            .bind(person_id.value())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
