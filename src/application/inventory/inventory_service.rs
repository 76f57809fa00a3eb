use crate::application::ServiceDependencies;
use crate::domain::{
    self, Atelier, AtelierId, Caller, Equipment, EquipmentDraft, EquipmentId, EquipmentType,
    EquipmentTypeId, PersonId, Role, commands::*,
};
use crate::ports::StoreError;
use chrono::{DateTime, NaiveDate, Utc};

use super::errors::{InventoryError, Result};

const ATELIER_NAME_MAX_LEN: usize = 100;
const EQUIPMENT_TYPE_NAME_MAX_LEN: usize = 30;

fn require_admin(caller: &Caller, reason: &'static str) -> Result<()> {
    if caller.role == Role::Admin {
        Ok(())
    } else {
        Err(InventoryError::Forbidden(reason))
    }
}

fn not_found_as(err: StoreError, not_found: InventoryError) -> InventoryError {
    match err {
        StoreError::NotFound => not_found,
        other => other.into(),
    }
}

/// アトリエを作成する（管理者のみ）
pub async fn create_atelier(deps: &ServiceDependencies, caller: &Caller, name: &str) -> Result<Atelier> {
    require_admin(caller, "only administrators may create ateliers")?;

    if !domain::validate_label(name, ATELIER_NAME_MAX_LEN) {
        return Err(InventoryError::InvalidName(
            "atelier name must be between 1 and 100 characters",
        ));
    }

    let atelier = deps.inventory_store.create_atelier(name.trim()).await?;
    tracing::info!(atelier_id = %atelier.atelier_id, "atelier created");
    Ok(atelier)
}

/// アトリエ名を変更する（管理者のみ）
pub async fn rename_atelier(
    deps: &ServiceDependencies,
    caller: &Caller,
    atelier_id: AtelierId,
    name: &str,
) -> Result<Atelier> {
    require_admin(caller, "only administrators may rename ateliers")?;

    if !domain::validate_label(name, ATELIER_NAME_MAX_LEN) {
        return Err(InventoryError::InvalidName(
            "atelier name must be between 1 and 100 characters",
        ));
    }

    let atelier = deps
        .inventory_store
        .rename_atelier(atelier_id, name.trim())
        .await
        .map_err(|e| not_found_as(e, InventoryError::AtelierNotFound))?;

    tracing::info!(atelier_id = %atelier_id, "atelier renamed");
    Ok(atelier)
}

/// アトリエを削除する（管理者のみ）
///
/// 機材・所属・予約・貸出も削除される。
pub async fn delete_atelier(
    deps: &ServiceDependencies,
    caller: &Caller,
    atelier_id: AtelierId,
) -> Result<()> {
    require_admin(caller, "only administrators may delete ateliers")?;

    let owned = deps.inventory_store.equipment_in_ateliers(&[atelier_id]).await?;

    deps.inventory_store
        .delete_atelier(atelier_id)
        .await
        .map_err(|e| not_found_as(e, InventoryError::AtelierNotFound))?;

    for equipment in &owned {
        deps.equipment_locks.forget(equipment.equipment_id);
    }

    tracing::info!(atelier_id = %atelier_id, "atelier deleted");
    Ok(())
}

/// 機材種別を作成する（管理者・アトリエ管理者）
pub async fn create_equipment_type(
    deps: &ServiceDependencies,
    caller: &Caller,
    name: &str,
) -> Result<EquipmentType> {
    if !matches!(caller.role, Role::Admin | Role::AtelierManager) {
        return Err(InventoryError::Forbidden(
            "only administrators and atelier managers may create equipment types",
        ));
    }

    if !domain::validate_label(name, EQUIPMENT_TYPE_NAME_MAX_LEN) {
        return Err(InventoryError::InvalidName(
            "equipment type name must be between 1 and 30 characters",
        ));
    }

    let equipment_type = deps.inventory_store.create_equipment_type(name.trim()).await?;
    tracing::info!(type_id = %equipment_type.type_id, "equipment type created");
    Ok(equipment_type)
}

/// 機材種別の名前を変更する（管理者・アトリエ管理者）
pub async fn rename_equipment_type(
    deps: &ServiceDependencies,
    caller: &Caller,
    type_id: EquipmentTypeId,
    name: &str,
) -> Result<EquipmentType> {
    if !matches!(caller.role, Role::Admin | Role::AtelierManager) {
        return Err(InventoryError::Forbidden(
            "only administrators and atelier managers may rename equipment types",
        ));
    }

    if !domain::validate_label(name, EQUIPMENT_TYPE_NAME_MAX_LEN) {
        return Err(InventoryError::InvalidName(
            "equipment type name must be between 1 and 30 characters",
        ));
    }

    let equipment_type = deps
        .inventory_store
        .rename_equipment_type(type_id, name.trim())
        .await
        .map_err(|e| not_found_as(e, InventoryError::EquipmentTypeNotFound))?;

    tracing::info!(type_id = %type_id, "equipment type renamed");
    Ok(equipment_type)
}

/// 機材種別を削除する（管理者のみ、その種別の機材も削除される）
pub async fn delete_equipment_type(
    deps: &ServiceDependencies,
    caller: &Caller,
    type_id: EquipmentTypeId,
) -> Result<()> {
    require_admin(caller, "only administrators may delete equipment types")?;

    let typed: Vec<EquipmentId> = deps
        .inventory_store
        .list_equipment()
        .await?
        .into_iter()
        .filter(|e| e.type_id == type_id)
        .map(|e| e.equipment_id)
        .collect();

    deps.inventory_store
        .delete_equipment_type(type_id)
        .await
        .map_err(|e| not_found_as(e, InventoryError::EquipmentTypeNotFound))?;

    for equipment_id in typed {
        deps.equipment_locks.forget(equipment_id);
    }

    tracing::info!(type_id = %type_id, "equipment type deleted");
    Ok(())
}

/// 機材を登録する
///
/// ビジネスルール：
/// - アトリエと機材種別が存在すること
/// - 管理者以外の職員は所属アトリエに限る
/// - 名前・日付・最大貸出日数の検証（違反は項目ごとにまとめて返す）
pub async fn register_equipment(
    deps: &ServiceDependencies,
    caller: &Caller,
    cmd: RegisterEquipment,
    today: NaiveDate,
) -> Result<Equipment> {
    deps.inventory_store
        .get_atelier(cmd.atelier_id)
        .await?
        .ok_or(InventoryError::AtelierNotFound)?;

    if !domain::can_manage_equipment(caller, cmd.atelier_id) {
        return Err(InventoryError::Forbidden(
            "equipment can only be registered in your own ateliers",
        ));
    }

    deps.inventory_store
        .get_equipment_type(cmd.type_id)
        .await?
        .ok_or(InventoryError::EquipmentTypeNotFound)?;

    let draft = EquipmentDraft {
        name: cmd.name.trim().to_string(),
        atelier_id: cmd.atelier_id,
        type_id: cmd.type_id,
        manufacture_date: cmd.manufacture_date,
        purchase_date: cmd.purchase_date,
        max_loan_duration_days: cmd.max_loan_duration_days,
    };

    domain::validate_equipment(&draft, today).map_err(InventoryError::InvalidEquipment)?;

    let equipment = deps.inventory_store.insert_equipment(draft).await?;

    tracing::info!(
        equipment_id = %equipment.equipment_id,
        atelier_id = %equipment.atelier_id,
        "equipment registered"
    );

    Ok(equipment)
}

/// 機材情報を編集する
///
/// 登録と同じ検証に加え、管理者以外の職員は移動元・移動先の両方が所属アトリエであること。
/// 既存の予約・貸出は変更しない。
pub async fn update_equipment(
    deps: &ServiceDependencies,
    caller: &Caller,
    cmd: UpdateEquipment,
    today: NaiveDate,
) -> Result<Equipment> {
    let current = deps
        .inventory_store
        .get_equipment(cmd.equipment_id)
        .await?
        .ok_or(InventoryError::EquipmentNotFound)?;

    if !domain::can_manage_equipment(caller, current.atelier_id) {
        return Err(InventoryError::Forbidden(
            "equipment can only be edited in your own ateliers",
        ));
    }

    deps.inventory_store
        .get_atelier(cmd.atelier_id)
        .await?
        .ok_or(InventoryError::AtelierNotFound)?;

    if !domain::can_manage_equipment(caller, cmd.atelier_id) {
        return Err(InventoryError::Forbidden(
            "equipment can only be moved into your own ateliers",
        ));
    }

    deps.inventory_store
        .get_equipment_type(cmd.type_id)
        .await?
        .ok_or(InventoryError::EquipmentTypeNotFound)?;

    let draft = EquipmentDraft {
        name: cmd.name.trim().to_string(),
        atelier_id: cmd.atelier_id,
        type_id: cmd.type_id,
        manufacture_date: cmd.manufacture_date,
        purchase_date: cmd.purchase_date,
        max_loan_duration_days: cmd.max_loan_duration_days,
    };

    domain::validate_equipment(&draft, today).map_err(InventoryError::InvalidEquipment)?;

    // 予約申請の方針判定と入れ違いにならないようにする
    let _guard = deps.equipment_locks.acquire(cmd.equipment_id).await;

    let equipment = deps
        .inventory_store
        .update_equipment(cmd.equipment_id, draft)
        .await
        .map_err(|e| not_found_as(e, InventoryError::EquipmentNotFound))?;

    tracing::info!(
        equipment_id = %equipment.equipment_id,
        atelier_id = %equipment.atelier_id,
        "equipment updated"
    );

    Ok(equipment)
}

/// 機材を削除する（予約・貸出も削除される）
pub async fn delete_equipment(
    deps: &ServiceDependencies,
    caller: &Caller,
    equipment_id: EquipmentId,
) -> Result<()> {
    let equipment = deps
        .inventory_store
        .get_equipment(equipment_id)
        .await?
        .ok_or(InventoryError::EquipmentNotFound)?;

    if !domain::can_manage_equipment(caller, equipment.atelier_id) {
        return Err(InventoryError::Forbidden(
            "equipment can only be deleted from your own ateliers",
        ));
    }

    // 削除中に同じ機材の予約が作られないようにする
    let _guard = deps.equipment_locks.acquire(equipment_id).await;

    deps.inventory_store
        .delete_equipment(equipment_id)
        .await
        .map_err(|e| not_found_as(e, InventoryError::EquipmentNotFound))?;
    deps.equipment_locks.forget(equipment_id);

    tracing::info!(equipment_id = %equipment_id, "equipment deleted");
    Ok(())
}

/// アトリエにメンバーを追加する（既に所属していれば何もしない）
pub async fn add_member(
    deps: &ServiceDependencies,
    caller: &Caller,
    atelier_id: AtelierId,
    person_id: PersonId,
) -> Result<()> {
    deps.inventory_store
        .get_atelier(atelier_id)
        .await?
        .ok_or(InventoryError::AtelierNotFound)?;

    if !domain::can_manage_members(caller, atelier_id) {
        return Err(InventoryError::Forbidden(
            "members can only be managed in your own ateliers",
        ));
    }

    deps.person_store
        .get_person(person_id)
        .await?
        .ok_or(InventoryError::PersonNotFound)?;

    deps.inventory_store.add_member(person_id, atelier_id).await?;

    tracing::info!(atelier_id = %atelier_id, person_id = %person_id, "member added");
    Ok(())
}

/// アトリエからメンバーを外す
///
/// そのアトリエの機材に対する本人の予約も取り消される（取消は呼び出し元の名義で履歴に残る）。
pub async fn remove_member(
    deps: &ServiceDependencies,
    caller: &Caller,
    atelier_id: AtelierId,
    person_id: PersonId,
    removed_at: DateTime<Utc>,
) -> Result<()> {
    if !domain::can_manage_members(caller, atelier_id) {
        return Err(InventoryError::Forbidden(
            "members can only be managed in your own ateliers",
        ));
    }

    deps.inventory_store
        .remove_member(person_id, atelier_id, caller.person_id, removed_at)
        .await
        .map_err(|e| not_found_as(e, InventoryError::NotAMember))?;

    tracing::info!(atelier_id = %atelier_id, person_id = %person_id, "member removed");
    Ok(())
}
