pub mod health;
pub mod tryon;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /trial                                           POST submit trial try-on
/// /premium                                         POST submit premium try-on
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(tryon::router())
}
