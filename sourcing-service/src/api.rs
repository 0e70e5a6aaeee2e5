use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use bigdecimal::BigDecimal;
use shared::*;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::back_office::BackOffice;
use crate::error::{ServiceError, ServiceResult};
use crate::handlers::CommandHandler;
use crate::models::{
    CadUploadRequest, FeedbackEntry, PrototypeSubmissionRequest, SpecEditRequest, SubmitBidRequest,
};
use crate::store::ItemStore;

#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<CommandHandler>,
    pub back_office: Arc<BackOffice>,
    pub api_token: Arc<str>,
}

impl AppState {
    pub fn new(cad_fee: BigDecimal, api_token: impl Into<Arc<str>>) -> Self {
        let store = Arc::new(ItemStore::new());
        Self {
            commands: Arc::new(CommandHandler::new(store.clone(), cad_fee)),
            back_office: Arc::new(BackOffice::new(store)),
            api_token: api_token.into(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let items = Router::new()
        .route("/items", post(create_item))
        .route("/items/:item_id/state", get(item_state))
        .route("/items/:item_id/timeline", get(item_timeline))
        .route("/items/:item_id/commands", post(execute_command))
        .route("/items/:item_id/specs", patch(edit_specs))
        .route("/items/:item_id/bids", post(submit_bid))
        .route("/items/:item_id/bids/:bid_id/withdraw", post(withdraw_bid))
        .route("/items/:item_id/cad/uploads", post(upload_cad))
        .route("/items/:item_id/prototype/submissions", post(submit_prototype))
        .route("/items/:item_id/prototype/feedback", get(prototype_feedback))
        .route("/payments/:payment_id/received", post(mark_payment_received))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .merge(items)
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
}

async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match presented {
        Some(token) if token == &*state.api_token => Ok(next.run(request).await),
        _ => Err(ServiceError::Unauthorized),
    }
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(item): Json<Item>,
) -> ServiceResult<(StatusCode, Json<ItemSnapshot>)> {
    let snapshot = state.back_office.create_item(item).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn item_state(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> ServiceResult<Json<ItemSnapshot>> {
    Ok(Json(state.back_office.snapshot(item_id).await?))
}

pub async fn item_timeline(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> ServiceResult<Json<Timeline>> {
    Ok(Json(state.back_office.timeline(item_id).await?))
}

/// Failed commands answer 422 with the reply as body, so the caller sees
/// the same message a successful round trip would carry.
pub async fn execute_command(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(command): Json<Command>,
) -> ServiceResult<Response> {
    if command.item_id != item_id {
        return Err(ServiceError::BadRequest(format!(
            "Command targets item {} but was posted to item {}",
            command.item_id, item_id
        )));
    }
    let reply = state.commands.handle_command(command).await;
    let status = if reply.is_success() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(reply)).into_response())
}

pub async fn edit_specs(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(edit): Json<SpecEditRequest>,
) -> ServiceResult<Json<ItemSnapshot>> {
    Ok(Json(state.back_office.edit_specs(item_id, edit).await?))
}

pub async fn submit_bid(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(request): Json<SubmitBidRequest>,
) -> ServiceResult<(StatusCode, Json<Bid>)> {
    let bid = state.back_office.submit_bid(item_id, request).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

pub async fn withdraw_bid(
    State(state): State<AppState>,
    Path((item_id, bid_id)): Path<(i64, i64)>,
) -> ServiceResult<Json<ItemSnapshot>> {
    Ok(Json(state.back_office.withdraw_bid(item_id, bid_id).await?))
}

pub async fn upload_cad(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(request): Json<CadUploadRequest>,
) -> ServiceResult<Json<CadState>> {
    Ok(Json(state.back_office.upload_cad(item_id, request).await?))
}

pub async fn submit_prototype(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(request): Json<PrototypeSubmissionRequest>,
) -> ServiceResult<Json<PrototypeState>> {
    Ok(Json(state.back_office.submit_prototype(item_id, request).await?))
}

pub async fn prototype_feedback(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> ServiceResult<Json<Vec<FeedbackEntry>>> {
    Ok(Json(state.back_office.feedback(item_id).await?))
}

pub async fn mark_payment_received(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> ServiceResult<Json<PaymentRecord>> {
    Ok(Json(state.back_office.mark_payment_received(payment_id).await?))
}

pub async fn health_check() -> &'static str {
    "OK"
}
