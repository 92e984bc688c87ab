use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::handlers::{require_json, success_response, validate_input};
use crate::models::Item;
use crate::services::CartService;

/// Creates the router for cart endpoints. The entry-removal route is a
/// deployment decision, so it only exists when configuration enables it.
pub fn carts_routes(expose_entry_removal: bool) -> Router<Arc<CartService>> {
    let mut router = Router::new()
        .route("/carts", post(create_cart))
        .route("/carts/:cart_id", get(get_cart))
        .route("/carts/:cart_id/add", put(add_to_cart))
        .route("/carts/:cart_id/checkout", put(checkout_cart));

    if expose_entry_removal {
        router = router.route(
            "/carts/:cart_id/items/:entry_id",
            delete(remove_cart_entry),
        );
    }

    router
}

/// Create a new empty cart
async fn create_cart(State(service): State<Arc<CartService>>) -> Result<Response, ServiceError> {
    let snapshot = service.create_cart().await?;
    Ok(success_response(snapshot))
}

/// Get a cart snapshot
async fn get_cart(
    State(service): State<Arc<CartService>>,
    Path(cart_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let snapshot = service.get_cart(cart_id)?;
    Ok(success_response(snapshot))
}

/// Add an item to a cart
async fn add_to_cart(
    State(service): State<Arc<CartService>>,
    Path(cart_id): Path<Uuid>,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let payload = require_json(payload)?;
    validate_input(&payload)?;

    let item = Item {
        id: payload.item.id,
        name: payload.item.name,
        price: payload.item.price,
    };
    service.add_item(cart_id, item, payload.quantity).await?;

    Ok(success_response(json!({ "message": "OK" })))
}

/// Remove one entry from a cart
async fn remove_cart_entry(
    State(service): State<Arc<CartService>>,
    Path((cart_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ServiceError> {
    service.remove_item(cart_id, entry_id).await?;
    Ok(success_response(json!({ "message": "OK" })))
}

/// Submit the cart for checkout
async fn checkout_cart(
    State(service): State<Arc<CartService>>,
    Path(cart_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let checkout_id = service.checkout_cart(cart_id).await?;
    Ok(success_response(json!({ "checkout_id": checkout_id })))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    #[validate]
    pub item: ItemPayload,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ItemPayload {
    pub id: String,
    pub name: String,
    pub price: u64,
}
