use crate::domain::{PersonId, SessionToken};
use crate::ports::Result;
use crate::ports::session_store::SessionStore as SessionStoreTrait;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// SessionStoreのPostgreSQL実装
///
/// 利用者の削除で外部キー経由でセッションも消える。
/// 期限切れの行はセッションを開くたびに削除する。
pub struct SessionStore {
    pool: PgPool,
}

impl SessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStoreTrait for SessionStore {
    async fn open_session(
        &self,
        person_id: PersonId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionToken> {
        let mut tx = self.pool.begin().await?;

        let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(issued_at)
            .execute(&mut *tx)
            .await?;
        if purged.rows_affected() > 0 {
            tracing::debug!(count = purged.rows_affected(), "Purged expired sessions");
        }

        let token = SessionToken::new();
        sqlx::query(
            r#"
            INSERT INTO sessions (token, person_id, issued_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token.value())
        .bind(person_id.value())
        .bind(issued_at)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(token)
    }

    async fn resolve_session(
        &self,
        token: SessionToken,
        at: DateTime<Utc>,
    ) -> Result<Option<PersonId>> {
        let person_id: Option<i64> = sqlx::query_scalar(
            "SELECT person_id FROM sessions WHERE token = $1 AND expires_at > $2",
        )
        .bind(token.value())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(person_id.map(PersonId::from_i64))
    }

    async fn close_session(&self, token: SessionToken) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
