mod errors;
mod inventory_service;

pub use errors::{InventoryError, Result};
pub use inventory_service::{
    add_member, create_atelier, create_equipment_type, delete_atelier, delete_equipment,
    delete_equipment_type, register_equipment, remove_member, rename_atelier,
    rename_equipment_type, update_equipment,
};
