pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod error;
pub mod extract;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(auth::routes())
        .merge(catalog::routes())
        .merge(bookings::routes())
}
