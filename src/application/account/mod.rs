mod account_service;
mod errors;
mod password;

pub use account_service::{
    SessionGrant, change_role, delete_person, landing_for, login, logout, register,
    resolve_caller, update_profile,
};
pub use errors::{AccountError, Result};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
};
