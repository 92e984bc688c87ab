use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::Response,
    routing::put,
    Router,
};

use crate::errors::ServiceError;
use crate::handlers::{require_json, success_response};
use crate::models::CheckoutRequest;
use crate::services::CheckoutService;

/// Creates the router for the checkout endpoint
pub fn checkout_routes() -> Router<Arc<CheckoutService>> {
    Router::new().route("/checkout", put(checkout_order))
}

/// Record a checkout for an order, idempotently
async fn checkout_order(
    State(service): State<Arc<CheckoutService>>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let payload = require_json(payload)?;
    let record = service.checkout(payload.order_id, payload.amount).await?;
    Ok(success_response(record))
}
