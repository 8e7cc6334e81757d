pub mod booking;
pub mod inventory;
pub mod payments;
pub mod proof;
pub mod ratings;
