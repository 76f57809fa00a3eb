use crate::domain::{
    Atelier, AtelierId, BookingEvent, Equipment, EquipmentDraft, EquipmentId, EquipmentType,
    EquipmentTypeId, PersonId,
};
use crate::ports::inventory_store::InventoryStore as InventoryStoreTrait;
use crate::ports::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{append_event, atelier_values, map_reservation};

const EQUIPMENT_COLUMNS: &str = "equipment_id, name, atelier_id, type_id, manufacture_date, \
     purchase_date, max_loan_duration_days";

fn map_equipment(row: &PgRow) -> Equipment {
    Equipment {
        equipment_id: EquipmentId::from_i64(row.get("equipment_id")),
        name: row.get("name"),
        atelier_id: AtelierId::from_i64(row.get("atelier_id")),
        type_id: EquipmentTypeId::from_i64(row.get("type_id")),
        manufacture_date: row.get("manufacture_date"),
        purchase_date: row.get("purchase_date"),
        max_loan_duration_days: row.get("max_loan_duration_days"),
    }
}

fn map_atelier(row: &PgRow) -> Atelier {
    Atelier {
        atelier_id: AtelierId::from_i64(row.get("atelier_id")),
        name: row.get("name"),
    }
}

fn map_equipment_type(row: &PgRow) -> EquipmentType {
    EquipmentType {
        type_id: EquipmentTypeId::from_i64(row.get("type_id")),
        name: row.get("name"),
    }
}

/// 削除件数が0なら NotFound
fn require_affected(rows_affected: u64) -> Result<()> {
    if rows_affected == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

/// InventoryStoreのPostgreSQL実装
///
/// 削除の連鎖は外部キーの ON DELETE CASCADE に任せる。
pub struct InventoryStore {
    pool: PgPool,
}

impl InventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStoreTrait for InventoryStore {
    async fn create_atelier(&self, name: &str) -> Result<Atelier> {
        let row = sqlx::query("INSERT INTO ateliers (name) VALUES ($1) RETURNING atelier_id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(map_atelier(&row))
    }

    async fn get_atelier(&self, atelier_id: AtelierId) -> Result<Option<Atelier>> {
        let row = sqlx::query("SELECT atelier_id, name FROM ateliers WHERE atelier_id = $1")
            .bind(atelier_id.value())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_atelier))
    }

    async fn list_ateliers(&self) -> Result<Vec<Atelier>> {
        let rows = sqlx::query("SELECT atelier_id, name FROM ateliers ORDER BY atelier_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_atelier).collect())
    }

    async fn rename_atelier(&self, atelier_id: AtelierId, name: &str) -> Result<Atelier> {
        let row = sqlx::query(
            "UPDATE ateliers SET name = $2 WHERE atelier_id = $1 RETURNING atelier_id, name",
        )
        .bind(atelier_id.value())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(map_atelier(&row))
    }

    async fn delete_atelier(&self, atelier_id: AtelierId) -> Result<()> {
        let result = sqlx::query("DELETE FROM ateliers WHERE atelier_id = $1")
            .bind(atelier_id.value())
            .execute(&self.pool)
            .await?;
        require_affected(result.rows_affected())
    }

    async fn create_equipment_type(&self, name: &str) -> Result<EquipmentType> {
        let row =
            sqlx::query("INSERT INTO equipment_types (name) VALUES ($1) RETURNING type_id, name")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(map_equipment_type(&row))
    }

    async fn get_equipment_type(&self, type_id: EquipmentTypeId) -> Result<Option<EquipmentType>> {
        let row = sqlx::query("SELECT type_id, name FROM equipment_types WHERE type_id = $1")
            .bind(type_id.value())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_equipment_type))
    }

    async fn list_equipment_types(&self) -> Result<Vec<EquipmentType>> {
        let rows = sqlx::query("SELECT type_id, name FROM equipment_types ORDER BY type_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_equipment_type).collect())
    }

    async fn rename_equipment_type(
        &self,
        type_id: EquipmentTypeId,
        name: &str,
    ) -> Result<EquipmentType> {
        let row = sqlx::query(
            "UPDATE equipment_types SET name = $2 WHERE type_id = $1 RETURNING type_id, name",
        )
        .bind(type_id.value())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(map_equipment_type(&row))
    }

    async fn delete_equipment_type(&self, type_id: EquipmentTypeId) -> Result<()> {
        let result = sqlx::query("DELETE FROM equipment_types WHERE type_id = $1")
            .bind(type_id.value())
            .execute(&self.pool)
            .await?;
        require_affected(result.rows_affected())
    }

    async fn insert_equipment(&self, draft: EquipmentDraft) -> Result<Equipment> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO equipment (
                name, atelier_id, type_id, manufacture_date, purchase_date, max_loan_duration_days
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {EQUIPMENT_COLUMNS}
            "#
        ))
        .bind(&draft.name)
        .bind(draft.atelier_id.value())
        .bind(draft.type_id.value())
        .bind(draft.manufacture_date)
        .bind(draft.purchase_date)
        .bind(draft.max_loan_duration_days)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_equipment(&row))
    }

    async fn get_equipment(&self, equipment_id: EquipmentId) -> Result<Option<Equipment>> {
        let row = sqlx::query(&format!(
            "SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE equipment_id = $1"
        ))
        .bind(equipment_id.value())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_equipment))
    }

    async fn list_equipment(&self) -> Result<Vec<Equipment>> {
        let rows = sqlx::query(&format!(
            "SELECT {EQUIPMENT_COLUMNS} FROM equipment ORDER BY equipment_id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_equipment).collect())
    }

    async fn update_equipment(
        &self,
        equipment_id: EquipmentId,
        draft: EquipmentDraft,
    ) -> Result<Equipment> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE equipment
            SET name = $2, atelier_id = $3, type_id = $4, manufacture_date = $5,
                purchase_date = $6, max_loan_duration_days = $7
            WHERE equipment_id = $1
            RETURNING {EQUIPMENT_COLUMNS}
            "#
        ))
        .bind(equipment_id.value())
        .bind(&draft.name)
        .bind(draft.atelier_id.value())
        .bind(draft.type_id.value())
        .bind(draft.manufacture_date)
        .bind(draft.purchase_date)
        .bind(draft.max_loan_duration_days)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(map_equipment(&row))
    }

    async fn equipment_in_ateliers(&self, ateliers: &[AtelierId]) -> Result<Vec<Equipment>> {
        let rows = sqlx::query(&format!(
            "SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE atelier_id = ANY($1) ORDER BY equipment_id"
        ))
        .bind(atelier_values(ateliers))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_equipment).collect())
    }

    async fn delete_equipment(&self, equipment_id: EquipmentId) -> Result<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE equipment_id = $1")
            .bind(equipment_id.value())
            .execute(&self.pool)
            .await?;
        require_affected(result.rows_affected())
    }

    async fn add_member(&self, person_id: PersonId, atelier_id: AtelierId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO atelier_persons (person_id, atelier_id)
            VALUES ($1, $2)
            ON CONFLICT (person_id, atelier_id) DO NOTHING
            "#,
        )
        .bind(person_id.value())
        .bind(atelier_id.value())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_member(
        &self,
        person_id: PersonId,
        atelier_id: AtelierId,
        removed_by: PersonId,
        removed_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("DELETE FROM atelier_persons WHERE person_id = $1 AND atelier_id = $2")
                .bind(person_id.value())
                .bind(atelier_id.value())
                .execute(&mut *tx)
                .await?;
        require_affected(result.rows_affected())?;

        // そのアトリエの機材に対する本人の予約も取り消す
        let rows = sqlx::query(
            r#"
            DELETE FROM reservations r
            USING equipment e
            WHERE r.equipment_id = e.equipment_id
              AND r.person_id = $1
              AND e.atelier_id = $2
            RETURNING r.reservation_id, r.equipment_id, r.person_id,
                      r.start_at, r.end_at, r.created_at
            "#,
        )
        .bind(person_id.value())
        .bind(atelier_id.value())
        .fetch_all(&mut *tx)
        .await?;

        for row in &rows {
            let reservation = map_reservation(row)?;
            append_event(
                &mut tx,
                &BookingEvent::reservation_cancelled(&reservation, removed_by, removed_at),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn ateliers_of(&self, person_id: PersonId) -> Result<Vec<AtelierId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT atelier_id FROM atelier_persons WHERE person_id = $1 ORDER BY atelier_id",
        )
        .bind(person_id.value())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(AtelierId::from_i64).collect())
    }

    async fn members_of(&self, atelier_id: AtelierId) -> Result<Vec<PersonId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT person_id FROM atelier_persons WHERE atelier_id = $1 ORDER BY person_id",
        )
        .bind(atelier_id.value())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(PersonId::from_i64).collect())
    }
}
