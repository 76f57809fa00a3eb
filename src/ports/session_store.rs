use crate::domain::{PersonId, SessionToken};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::Result;

/// セッションストアポート（認証・セッション提供者）
///
/// トークンから利用者IDを解決する。ロールや所属の解決はアプリケーション層。
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// セッションを開く
    ///
    /// `issued_at`の時点で期限切れのセッションはここで削除する。
    async fn open_session(
        &self,
        person_id: PersonId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionToken>;

    /// `at`の時点で有効なセッションなら利用者IDを返す
    async fn resolve_session(&self, token: SessionToken, at: DateTime<Utc>)
    -> Result<Option<PersonId>>;

    /// セッションを破棄する（存在しなくてもエラーにしない）
    async fn close_session(&self, token: SessionToken) -> Result<()>;
}
