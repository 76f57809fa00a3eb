use crate::domain::AuthorizationScope;
use crate::ports::*;
use chrono::Duration;
use std::sync::Arc;

use super::booking::EquipmentLocks;

/// セッションの既定の有効期間（24時間）
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、各ユースケース関数に引数として渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub booking_store: Arc<dyn BookingStore>,
    pub inventory_store: Arc<dyn InventoryStore>,
    pub person_store: Arc<dyn PersonStore>,
    pub session_store: Arc<dyn SessionStore>,
    /// 機材ごとの排他ロック（重複判定から書き込みまでを直列化する）
    pub equipment_locks: EquipmentLocks,
    /// 職員が予約・貸出を操作できる範囲
    pub authorization_scope: AuthorizationScope,
    /// 発行からこの期間を過ぎたセッションは無効
    pub session_ttl: Duration,
}

impl ServiceDependencies {
    pub fn new(
        booking_store: Arc<dyn BookingStore>,
        inventory_store: Arc<dyn InventoryStore>,
        person_store: Arc<dyn PersonStore>,
        session_store: Arc<dyn SessionStore>,
        authorization_scope: AuthorizationScope,
    ) -> Self {
        Self {
            booking_store,
            inventory_store,
            person_store,
            session_store,
            equipment_locks: EquipmentLocks::new(),
            authorization_scope,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }
}
