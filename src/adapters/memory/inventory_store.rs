use crate::domain::{
    Atelier, AtelierId, Equipment, EquipmentDraft, EquipmentId, EquipmentType, EquipmentTypeId,
    PersonId,
};
use crate::ports::{InventoryStore, Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::InMemoryStore;

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn create_atelier(&self, name: &str) -> Result<Atelier> {
        let mut state = self.state()?;
        let atelier = Atelier {
            atelier_id: AtelierId::from_i64(state.next_id()),
            name: name.to_string(),
        };
        state.ateliers.insert(atelier.atelier_id, atelier.clone());
        Ok(atelier)
    }

    async fn get_atelier(&self, atelier_id: AtelierId) -> Result<Option<Atelier>> {
        Ok(self.state()?.ateliers.get(&atelier_id).cloned())
    }

    async fn list_ateliers(&self) -> Result<Vec<Atelier>> {
        Ok(self.state()?.ateliers.values().cloned().collect())
    }

    async fn rename_atelier(&self, atelier_id: AtelierId, name: &str) -> Result<Atelier> {
        let mut state = self.state()?;
        let atelier = state
            .ateliers
            .get_mut(&atelier_id)
            .ok_or(StoreError::NotFound)?;
        atelier.name = name.to_string();
        Ok(atelier.clone())
    }

    async fn delete_atelier(&self, atelier_id: AtelierId) -> Result<()> {
        let mut state = self.state()?;
        state
            .ateliers
            .remove(&atelier_id)
            .ok_or(StoreError::NotFound)?;

        let owned: Vec<EquipmentId> = state
            .equipment
            .values()
            .filter(|e| e.atelier_id == atelier_id)
            .map(|e| e.equipment_id)
            .collect();
        for equipment_id in owned {
            state.remove_equipment_cascade(equipment_id);
        }
        state.memberships.retain(|(_, a)| *a != atelier_id);
        Ok(())
    }

    async fn create_equipment_type(&self, name: &str) -> Result<EquipmentType> {
        let mut state = self.state()?;
        let equipment_type = EquipmentType {
            type_id: EquipmentTypeId::from_i64(state.next_id()),
            name: name.to_string(),
        };
        state
            .equipment_types
            .insert(equipment_type.type_id, equipment_type.clone());
        Ok(equipment_type)
    }

    async fn get_equipment_type(&self, type_id: EquipmentTypeId) -> Result<Option<EquipmentType>> {
        Ok(self.state()?.equipment_types.get(&type_id).cloned())
    }

    async fn list_equipment_types(&self) -> Result<Vec<EquipmentType>> {
        Ok(self.state()?.equipment_types.values().cloned().collect())
    }

    async fn rename_equipment_type(
        &self,
        type_id: EquipmentTypeId,
        name: &str,
    ) -> Result<EquipmentType> {
        let mut state = self.state()?;
        let equipment_type = state
            .equipment_types
            .get_mut(&type_id)
            .ok_or(StoreError::NotFound)?;
        equipment_type.name = name.to_string();
        Ok(equipment_type.clone())
    }

    async fn delete_equipment_type(&self, type_id: EquipmentTypeId) -> Result<()> {
        let mut state = self.state()?;
        state
            .equipment_types
            .remove(&type_id)
            .ok_or(StoreError::NotFound)?;

        let typed: Vec<EquipmentId> = state
            .equipment
            .values()
            .filter(|e| e.type_id == type_id)
            .map(|e| e.equipment_id)
            .collect();
        for equipment_id in typed {
            state.remove_equipment_cascade(equipment_id);
        }
        Ok(())
    }

    async fn insert_equipment(&self, draft: EquipmentDraft) -> Result<Equipment> {
        let mut state = self.state()?;
        if !state.ateliers.contains_key(&draft.atelier_id)
            || !state.equipment_types.contains_key(&draft.type_id)
        {
            return Err(StoreError::NotFound);
        }

        let equipment = Equipment {
            equipment_id: EquipmentId::from_i64(state.next_id()),
            name: draft.name,
            atelier_id: draft.atelier_id,
            type_id: draft.type_id,
            manufacture_date: draft.manufacture_date,
            purchase_date: draft.purchase_date,
            max_loan_duration_days: draft.max_loan_duration_days,
        };
        state
            .equipment
            .insert(equipment.equipment_id, equipment.clone());
        Ok(equipment)
    }

    async fn get_equipment(&self, equipment_id: EquipmentId) -> Result<Option<Equipment>> {
        Ok(self.state()?.equipment.get(&equipment_id).cloned())
    }

    async fn list_equipment(&self) -> Result<Vec<Equipment>> {
        Ok(self.state()?.equipment.values().cloned().collect())
    }

    async fn update_equipment(
        &self,
        equipment_id: EquipmentId,
        draft: EquipmentDraft,
    ) -> Result<Equipment> {
        let mut state = self.state()?;
        if !state.ateliers.contains_key(&draft.atelier_id)
            || !state.equipment_types.contains_key(&draft.type_id)
        {
            return Err(StoreError::NotFound);
        }

        let equipment = state
            .equipment
            .get_mut(&equipment_id)
            .ok_or(StoreError::NotFound)?;
        equipment.name = draft.name;
        equipment.atelier_id = draft.atelier_id;
        equipment.type_id = draft.type_id;
        equipment.manufacture_date = draft.manufacture_date;
        equipment.purchase_date = draft.purchase_date;
        equipment.max_loan_duration_days = draft.max_loan_duration_days;
        Ok(equipment.clone())
    }

    async fn equipment_in_ateliers(&self, ateliers: &[AtelierId]) -> Result<Vec<Equipment>> {
        Ok(self
            .state()?
            .equipment
            .values()
            .filter(|e| ateliers.contains(&e.atelier_id))
            .cloned()
            .collect())
    }

    async fn delete_equipment(&self, equipment_id: EquipmentId) -> Result<()> {
        let mut state = self.state()?;
        if !state.equipment.contains_key(&equipment_id) {
            return Err(StoreError::NotFound);
        }
        state.remove_equipment_cascade(equipment_id);
        Ok(())
    }

    async fn add_member(&self, person_id: PersonId, atelier_id: AtelierId) -> Result<()> {
        let mut state = self.state()?;
        if !state.persons.contains_key(&person_id) || !state.ateliers.contains_key(&atelier_id) {
            return Err(StoreError::NotFound);
        }
        state.memberships.insert((person_id, atelier_id));
        Ok(())
    }

    async fn remove_member(
        &self,
        person_id: PersonId,
        atelier_id: AtelierId,
        removed_by: PersonId,
        removed_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state()?;
        if !state.memberships.remove(&(person_id, atelier_id)) {
            return Err(StoreError::NotFound);
        }

        let owned: Vec<EquipmentId> = state
            .equipment
            .values()
            .filter(|e| e.atelier_id == atelier_id)
            .map(|e| e.equipment_id)
            .collect();
        state.cancel_reservations_where(removed_by, removed_at, |r| {
            r.person_id == person_id && owned.contains(&r.equipment_id)
        });
        Ok(())
    }

    async fn ateliers_of(&self, person_id: PersonId) -> Result<Vec<AtelierId>> {
        Ok(self
            .state()?
            .memberships
            .iter()
            .filter(|(p, _)| *p == person_id)
            .map(|(_, a)| *a)
            .collect())
    }

    async fn members_of(&self, atelier_id: AtelierId) -> Result<Vec<PersonId>> {
        Ok(self
            .state()?
            .memberships
            .iter()
            .filter(|(_, a)| *a == atelier_id)
            .map(|(p, _)| *p)
            .collect())
    }
}
