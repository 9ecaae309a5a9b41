pub mod auth;
pub mod reservation;

pub use auth::{AuthError, TokenService};
pub use reservation::{BookingError, ReservationService};
