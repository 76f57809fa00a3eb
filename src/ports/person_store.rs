use crate::domain::{Person, PersonDraft, PersonId, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::Result;

/// 利用者ストアポート
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// 利用者を登録する
    ///
    /// メールアドレスが既に使われていれば`StoreError::DuplicateEmail`。
    async fn insert_person(&self, draft: PersonDraft) -> Result<Person>;

    async fn get_person(&self, person_id: PersonId) -> Result<Option<Person>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>>;

    async fn list_persons(&self) -> Result<Vec<Person>>;

    async fn update_role(&self, person_id: PersonId, role: Role) -> Result<Person>;

    /// 氏名とメールアドレスを更新する
    ///
    /// メールアドレスが他の利用者に使われていれば`StoreError::DuplicateEmail`。
    async fn update_profile(
        &self,
        person_id: PersonId,
        first_name: &str,
        surname: &str,
        email: &str,
    ) -> Result<Person>;

    /// 利用者を削除する（予約・貸出・所属・セッションへ連鎖）
    ///
    /// 削除した予約には取消イベント、貸出には返却イベントを`deleted_by`の名義で追記する。
    async fn delete_person(
        &self,
        person_id: PersonId,
        deleted_by: PersonId,
        deleted_at: DateTime<Utc>,
    ) -> Result<()>;
}
