pub mod admin;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod health;
pub mod payments;
pub mod ratings;
pub mod seats;
