use crate::domain::EquipmentId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 機材ごとの非同期ミューテックス
///
/// 同じ機材への予約申請・承認を直列化し、重複判定と挿入の間に
/// 他の呼び出しが割り込めないようにする。異なる機材は並行に処理できる。
/// プロセスをまたぐ競合はストア側のトランザクションで防ぐ。
#[derive(Clone, Default)]
pub struct EquipmentLocks {
    locks: Arc<DashMap<EquipmentId, Arc<Mutex<()>>>>,
}

impl EquipmentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 機材のロックを取得する。ガードを落とすまで保持される。
    pub async fn acquire(&self, equipment_id: EquipmentId) -> OwnedMutexGuard<()> {
        // DashMapのシャードロックはawait前に解放する
        let lock = self.locks.entry(equipment_id).or_default().clone();
        lock.lock_owned().await
    }

    /// 削除された機材のロックを表から外す
    ///
    /// 保持中のガードはそのまま有効。
    pub fn forget(&self, equipment_id: EquipmentId) {
        self.locks.remove(&equipment_id);
    }

    /// 表に載っている機材の数
    pub fn tracked(&self) -> usize {
        self.locks.len()
    }
}
