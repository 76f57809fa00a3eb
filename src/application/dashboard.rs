//! ロール別ダッシュボード

use crate::application::ServiceDependencies;
use crate::domain::{
    self, Atelier, Caller, Equipment, EquipmentType, LandingPage, Loan, Person, Reservation, Role,
};
use crate::ports::Result;
use serde::Serialize;

/// ダッシュボードの内容
///
/// ロールによって埋まる項目が異なる（対象外の項目は空）。
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub landing_page: Option<LandingPage>,
    /// 本人の予約
    pub my_reservations: Vec<Reservation>,
    /// 本人の貸出
    pub my_loans: Vec<Loan>,
    /// 予約・貸出できる機材
    pub equipment: Vec<Equipment>,
    /// 承認待ちの予約（職員のみ）
    pub reservation_requests: Vec<Reservation>,
    /// 対応範囲の貸出（職員のみ）
    pub atelier_loans: Vec<Loan>,
    /// 管理対象のアトリエ
    pub ateliers: Vec<Atelier>,
    pub equipment_types: Vec<EquipmentType>,
    /// 管理対象の利用者（管理者・アトリエ管理者のみ）
    pub persons: Vec<Person>,
}

/// 呼び出し元のロールに応じたダッシュボードを組み立てる
///
/// - 管理者：すべて
/// - アトリエ管理者：所属アトリエの機材・予約・貸出・メンバー
/// - 教員：所属アトリエの機材・予約・貸出
/// - 利用者：所属アトリエの機材と本人の予約・貸出
pub async fn dashboard(deps: &ServiceDependencies, caller: &Caller) -> Result<Dashboard> {
    let booking = &deps.booking_store;
    let inventory = &deps.inventory_store;

    let (my_reservations, my_loans) = futures::try_join!(
        booking.reservations_for_person(caller.person_id),
        booking.loans_for_person(caller.person_id),
    )?;

    let mut view = Dashboard {
        landing_page: Some(domain::landing_page(Some(caller.role))),
        my_reservations,
        my_loans,
        ..Dashboard::default()
    };

    match caller.role {
        Role::Admin => {
            let (equipment, reservation_requests, atelier_loans, ateliers, equipment_types, persons) =
                futures::try_join!(
                    inventory.list_equipment(),
                    booking.all_reservations(),
                    booking.all_loans(),
                    inventory.list_ateliers(),
                    inventory.list_equipment_types(),
                    deps.person_store.list_persons(),
                )?;
            view.equipment = equipment;
            view.reservation_requests = reservation_requests;
            view.atelier_loans = atelier_loans;
            view.ateliers = ateliers;
            view.equipment_types = equipment_types;
            view.persons = persons;
        }
        Role::AtelierManager | Role::Teacher => {
            let (equipment, reservation_requests, atelier_loans, equipment_types) = futures::try_join!(
                inventory.equipment_in_ateliers(&caller.ateliers),
                booking.reservations_for_ateliers(&caller.ateliers),
                booking.loans_for_ateliers(&caller.ateliers),
                inventory.list_equipment_types(),
            )?;
            view.equipment = equipment;
            view.reservation_requests = reservation_requests;
            view.atelier_loans = atelier_loans;
            view.equipment_types = equipment_types;

            if caller.role == Role::AtelierManager {
                view.ateliers = managed_ateliers(deps, caller).await?;
                view.persons = atelier_members(deps, caller).await?;
            }
        }
        Role::User => {
            view.equipment = inventory.equipment_in_ateliers(&caller.ateliers).await?;
        }
    }

    Ok(view)
}

async fn managed_ateliers(deps: &ServiceDependencies, caller: &Caller) -> Result<Vec<Atelier>> {
    let mut ateliers = Vec::with_capacity(caller.ateliers.len());
    for atelier_id in &caller.ateliers {
        if let Some(atelier) = deps.inventory_store.get_atelier(*atelier_id).await? {
            ateliers.push(atelier);
        }
    }
    Ok(ateliers)
}

/// 所属アトリエのメンバー（重複なし、ID順）
async fn atelier_members(deps: &ServiceDependencies, caller: &Caller) -> Result<Vec<Person>> {
    let mut member_ids = Vec::new();
    for atelier_id in &caller.ateliers {
        member_ids.extend(deps.inventory_store.members_of(*atelier_id).await?);
    }
    member_ids.sort();
    member_ids.dedup();

    let mut persons = Vec::with_capacity(member_ids.len());
    for person_id in member_ids {
        if let Some(person) = deps.person_store.get_person(person_id).await? {
            persons.push(person);
        }
    }
    Ok(persons)
}
