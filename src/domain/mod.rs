pub mod access;
pub mod availability;
pub mod booking;
pub mod commands;
pub mod errors;
pub mod events;
pub mod inventory;
pub mod person;
pub mod value_objects;

pub use access::*;
pub use availability::*;
pub use booking::*;
pub use errors::*;
pub use events::*;
pub use inventory::*;
pub use person::*;
pub use value_objects::*;
