pub mod booking_store;
pub mod error;
pub mod inventory_store;
pub mod person_store;
pub mod session_store;

pub use booking_store::*;
pub use error::{Result, StoreError};
pub use inventory_store::*;
pub use person_store::*;
pub use session_store::*;
