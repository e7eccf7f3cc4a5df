//! Handlers for try-on intake.
//!
//! Both endpoints validate the request, hand it to the background queue and
//! answer `202 Accepted` straight away. Results arrive later as a single
//! notification; nothing about processing is ever reported over HTTP.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use drapely_core::types::{Tier, TryOnRequest};
use drapely_core::validation::validate_request;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::ApiKeyAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Message returned with every accepted request.
pub const ACCEPTED_MESSAGE: &str =
    "Request received. Processing in background. You will receive an email with results shortly.";

/// Request body shared by both tiers.
///
/// `garment_images` keeps the JSON key order.
#[derive(Debug, Deserialize)]
pub struct TryOnBody {
    pub user_id: String,
    pub email: String,
    pub garment_images: IndexMap<String, String>,
    pub person_image: String,
}

impl TryOnBody {
    fn into_request(self, tier: Tier) -> TryOnRequest {
        TryOnRequest {
            owner_id: self.user_id,
            notify_address: self.email,
            subject_image_url: self.person_image,
            garments: self.garment_images,
            tier,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Accepted {
    pub request_id: Uuid,
    pub user_id: String,
    pub message: &'static str,
}

/// POST /api/v1/trial
pub async fn submit_trial(
    _auth: ApiKeyAuth,
    State(state): State<AppState>,
    Json(body): Json<TryOnBody>,
) -> AppResult<impl IntoResponse> {
    submit(&state, body.into_request(Tier::Trial))
}

/// POST /api/v1/premium
pub async fn submit_premium(
    _auth: ApiKeyAuth,
    State(state): State<AppState>,
    Json(body): Json<TryOnBody>,
) -> AppResult<impl IntoResponse> {
    submit(&state, body.into_request(Tier::Premium))
}

fn submit(state: &AppState, request: TryOnRequest) -> AppResult<impl IntoResponse> {
    validate_request(&request)?;

    let user_id = request.owner_id.clone();
    let tier = request.tier;
    let garments = request.garments.len();
    let request_id = state.queue.submit(request)?;

    tracing::info!(%request_id, user_id = %user_id, %tier, garments, "Try-on request accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: Accepted {
                request_id,
                user_id,
                message: ACCEPTED_MESSAGE,
            },
        }),
    ))
}
