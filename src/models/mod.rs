pub mod user;
pub mod movie;
pub mod show;
pub mod booking;

pub use user::User;
pub use movie::Movie;
pub use show::{Show, ShowWithMovie};
pub use booking::{Booking, BookingStatus, BookingWithShow};
