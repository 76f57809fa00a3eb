//! インメモリ実装
//!
//! 4つのストアポートを1つの状態で実装する。
//! 状態全体を1つのMutexで守るため、各書き込みは他の操作と直列化され、
//! 重複の再検証と挿入が不可分になる。

mod booking_store;
mod inventory_store;
mod person_store;
mod session_store;

use crate::application::ServiceDependencies;
use crate::domain::{
    Atelier, AtelierId, AuthorizationScope, BookingEvent, Equipment, EquipmentId, EquipmentType,
    EquipmentTypeId, Loan, LoanId, Person, PersonId, Reservation, ReservationId, SessionToken,
};
use crate::ports::{Result, StoreError};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct State {
    next_id: i64,
    persons: BTreeMap<PersonId, Person>,
    ateliers: BTreeMap<AtelierId, Atelier>,
    equipment_types: BTreeMap<EquipmentTypeId, EquipmentType>,
    equipment: BTreeMap<EquipmentId, Equipment>,
    /// (利用者, アトリエ)
    memberships: BTreeSet<(PersonId, AtelierId)>,
    reservations: BTreeMap<ReservationId, Reservation>,
    loans: BTreeMap<LoanId, Loan>,
    events: Vec<BookingEvent>,
    sessions: HashMap<SessionToken, SessionEntry>,
}

struct SessionEntry {
    person_id: PersonId,
    expires_at: DateTime<Utc>,
}

impl State {
    /// 全エンティティ共通の連番
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// 条件に合う予約を削除し、それぞれに取消イベントを追記する
    fn cancel_reservations_where(
        &mut self,
        cancelled_by: PersonId,
        cancelled_at: DateTime<Utc>,
        predicate: impl Fn(&Reservation) -> bool,
    ) {
        let doomed: Vec<ReservationId> = self
            .reservations
            .values()
            .filter(|r| predicate(r))
            .map(|r| r.reservation_id)
            .collect();
        for reservation_id in doomed {
            if let Some(reservation) = self.reservations.remove(&reservation_id) {
                self.events.push(BookingEvent::reservation_cancelled(
                    &reservation,
                    cancelled_by,
                    cancelled_at,
                ));
            }
        }
    }

    fn remove_equipment_cascade(&mut self, equipment_id: EquipmentId) {
        self.equipment.remove(&equipment_id);
        self.reservations.retain(|_, r| r.equipment_id != equipment_id);
        self.loans.retain(|_, l| l.equipment_id != equipment_id);
    }
}

/// インメモリのストア
///
/// テストとデモ用。プロセス終了で内容は失われる。
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }
}

/// インメモリストアを使うサービス依存関係を組み立てる
pub fn in_memory_dependencies(authorization_scope: AuthorizationScope) -> ServiceDependencies {
    let store = Arc::new(InMemoryStore::new());
    ServiceDependencies::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        authorization_scope,
    )
}
