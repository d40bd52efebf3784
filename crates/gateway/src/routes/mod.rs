//! Route modules and the `/api/v1` route group.

pub mod dialogs;
pub mod health;
pub mod reviews;

use axum::Router;

use crate::state::AppState;

/// All routes under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(reviews::router())
        .merge(dialogs::router())
}
