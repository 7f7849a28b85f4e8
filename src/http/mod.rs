use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use error::AppError;
pub use auth::AuthUser;

/// Room for multipart framing and text fields on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = state.upload_max_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .merge(routes::health())
        .merge(routes::posts())
        .merge(routes::users())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
