use crate::domain::{
    Atelier, AtelierId, Equipment, EquipmentDraft, EquipmentId, EquipmentType, EquipmentTypeId,
    PersonId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::Result;

/// 在庫ストアポート
///
/// アトリエ・機材種別・機材・アトリエ所属を扱う。
/// 削除は関連する行へ連鎖する（機材の予約・貸出を含む）。
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn create_atelier(&self, name: &str) -> Result<Atelier>;

    async fn get_atelier(&self, atelier_id: AtelierId) -> Result<Option<Atelier>>;

    async fn list_ateliers(&self) -> Result<Vec<Atelier>>;

    async fn rename_atelier(&self, atelier_id: AtelierId, name: &str) -> Result<Atelier>;

    /// アトリエを削除する（機材・所属・予約・貸出へ連鎖）
    async fn delete_atelier(&self, atelier_id: AtelierId) -> Result<()>;

    async fn create_equipment_type(&self, name: &str) -> Result<EquipmentType>;

    async fn get_equipment_type(&self, type_id: EquipmentTypeId) -> Result<Option<EquipmentType>>;

    async fn list_equipment_types(&self) -> Result<Vec<EquipmentType>>;

    async fn rename_equipment_type(
        &self,
        type_id: EquipmentTypeId,
        name: &str,
    ) -> Result<EquipmentType>;

    /// 機材種別を削除する（その種別の機材へ連鎖）
    async fn delete_equipment_type(&self, type_id: EquipmentTypeId) -> Result<()>;

    async fn insert_equipment(&self, draft: EquipmentDraft) -> Result<Equipment>;

    async fn get_equipment(&self, equipment_id: EquipmentId) -> Result<Option<Equipment>>;

    async fn list_equipment(&self) -> Result<Vec<Equipment>>;

    /// 機材情報を置き換える（既存の予約・貸出はそのまま）
    async fn update_equipment(
        &self,
        equipment_id: EquipmentId,
        draft: EquipmentDraft,
    ) -> Result<Equipment>;

    async fn equipment_in_ateliers(&self, ateliers: &[AtelierId]) -> Result<Vec<Equipment>>;

    /// 機材を削除する（予約・貸出へ連鎖）
    async fn delete_equipment(&self, equipment_id: EquipmentId) -> Result<()>;

    /// アトリエに所属を追加する（既に所属していれば何もしない）
    async fn add_member(&self, person_id: PersonId, atelier_id: AtelierId) -> Result<()>;

    /// アトリエから所属を外す
    ///
    /// そのアトリエの機材に対する本人の予約も削除し、
    /// 削除した予約ごとに取消イベントを`removed_by`の名義で追記する。
    async fn remove_member(
        &self,
        person_id: PersonId,
        atelier_id: AtelierId,
        removed_by: PersonId,
        removed_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn ateliers_of(&self, person_id: PersonId) -> Result<Vec<AtelierId>>;

    async fn members_of(&self, atelier_id: AtelierId) -> Result<Vec<PersonId>>;
}
