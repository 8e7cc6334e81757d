pub mod booking;
pub mod rating;
pub mod route;
pub mod schedule;
pub mod user;

pub use booking::Booking;
pub use rating::{AppRating, Rating};
pub use route::BusRoute;
pub use schedule::Schedule;
pub use user::User;
