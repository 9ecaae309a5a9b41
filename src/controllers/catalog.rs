use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::error::ApiError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/{id}/shows", get(list_movie_shows))
}

// GET /api/movies
async fn list_movies(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let movies = state.cache.get_movies().await?;
    Ok(Json(movies))
}

// GET /api/movies/{id}/shows
async fn list_movie_shows(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let shows = state
        .cache
        .get_shows_for_movie(movie_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Movie not found.".to_string()))?;
    Ok(Json(shows))
}
