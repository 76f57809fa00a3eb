mod booking_service;
mod errors;
mod locks;

pub use booking_service::{
    accept_reservation, cancel_reservation, equipment_history, is_available, request_reservation,
    return_loan,
};
pub use errors::{BookingError, Result};
pub use locks::EquipmentLocks;
