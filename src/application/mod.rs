pub mod account;
pub mod booking;
pub mod calendar;
pub mod dashboard;
mod dependencies;
mod error_kind;
pub mod inventory;

pub use dependencies::{DEFAULT_SESSION_TTL_SECS, ServiceDependencies};
pub use error_kind::ErrorKind;
