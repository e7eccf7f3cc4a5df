use axum::routing::post;
use axum::Router;

use crate::handlers::tryon;
use crate::state::AppState;

/// Try-on intake routes mounted under `/api/v1`.
///
/// ```text
/// POST   /trial             -> submit_trial
/// POST   /premium           -> submit_premium
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trial", post(tryon::submit_trial))
        .route("/premium", post(tryon::submit_premium))
}
