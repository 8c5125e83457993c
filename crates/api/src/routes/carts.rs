//! Cart lifecycle endpoints.
//!
//! Each cart maps to one workflow instance keyed by its [`CartId`].
//! Mutations are delivered as signals and acknowledged with `202
//! Accepted`; the instance applies them asynchronously, one at a time.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CartId;
use domain::{CartItem, Catalog, price_cart};
use orchestrator::{CartSignal, CartSnapshot, CartWorkflow};
use runtime::InMemoryRuntime;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub runtime: InMemoryRuntime,
    pub workflow: Arc<CartWorkflow>,
    pub catalog: Catalog,
}

// -- Request types --

#[derive(Deserialize)]
pub struct UpdateCartRequest {
    pub items: Vec<CartItemRequest>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct CartItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartCreatedResponse {
    pub cart_id: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct SignalAcceptedResponse {
    pub cart_id: String,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub cart_id: String,
    pub status: String,
    pub email: Option<String>,
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
    /// Set when the terminal activity exhausted its retries; lets
    /// callers tell a failed charge apart from a captured one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_error: Option<String>,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
}

// -- Handlers --

/// POST /carts — create a cart and start its workflow instance.
#[tracing::instrument(skip(state))]
pub async fn create(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<CartCreatedResponse>), ApiError> {
    let cart_id = CartId::new();
    state
        .runtime
        .start_workflow(&cart_id.to_string(), state.workflow.clone())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CartCreatedResponse {
            cart_id: cart_id.to_string(),
            status: "Open".to_string(),
        }),
    ))
}

/// PUT /carts/:id — replace cart contents and/or set the email.
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCartRequest>,
) -> Result<(StatusCode, Json<SignalAcceptedResponse>), ApiError> {
    let cart_id = parse_cart_id(&id)?;

    // Validate at the boundary so the caller gets a synchronous 422;
    // the instance re-validates before applying.
    let items: Vec<CartItem> = req
        .items
        .into_iter()
        .map(|item| CartItem::new(item.product_id, item.quantity))
        .collect();
    for item in &items {
        item.validate()?;
    }

    let signal = CartSignal::UpdateCart {
        items,
        email: req.email,
    };
    let payload = serde_json::to_value(&signal).map_err(|e| ApiError::Internal(e.to_string()))?;
    state.runtime.signal(&cart_id.to_string(), payload).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SignalAcceptedResponse {
            cart_id: cart_id.to_string(),
        }),
    ))
}

/// POST /carts/:id/checkout — request finalization via payment charge.
#[tracing::instrument(skip(state))]
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SignalAcceptedResponse>), ApiError> {
    let cart_id = parse_cart_id(&id)?;

    let payload = serde_json::to_value(&CartSignal::Checkout)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    state.runtime.signal(&cart_id.to_string(), payload).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SignalAcceptedResponse {
            cart_id: cart_id.to_string(),
        }),
    ))
}

/// DELETE /carts/:id — cancel the instance; neither terminal activity runs.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SignalAcceptedResponse>), ApiError> {
    let cart_id = parse_cart_id(&id)?;
    state.runtime.cancel(&cart_id.to_string()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SignalAcceptedResponse {
            cart_id: cart_id.to_string(),
        }),
    ))
}

/// GET /carts/:id — query the instance's latest published snapshot.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart_id = parse_cart_id(&id)?;

    let snapshot = state
        .runtime
        .query_state(&cart_id.to_string())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cart {id} has no published state yet")))?;
    let snapshot: CartSnapshot =
        serde_json::from_value(snapshot).map_err(|e| ApiError::Internal(e.to_string()))?;

    let priced = price_cart(&state.catalog, &snapshot.cart);
    let items: Vec<CartItemResponse> = snapshot
        .cart
        .items
        .iter()
        .map(|item| CartItemResponse {
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
        })
        .collect();

    Ok(Json(CartResponse {
        cart_id: cart_id.to_string(),
        status: snapshot.status.to_string(),
        email: snapshot.cart.email.clone(),
        items,
        total_cents: priced.total.cents(),
        activity_error: snapshot.activity_error,
    }))
}

/// GET /products — list the catalog the storefront sells from.
#[tracing::instrument(skip(state))]
pub async fn products(State(state): State<Arc<AppState>>) -> Json<Vec<ProductResponse>> {
    let mut products: Vec<ProductResponse> = state
        .catalog
        .products()
        .map(|p| ProductResponse {
            id: p.id.to_string(),
            name: p.name.clone(),
            price_cents: p.price.cents(),
        })
        .collect();
    products.sort_by(|a, b| a.id.cmp(&b.id));
    Json(products)
}

fn parse_cart_id(id: &str) -> Result<CartId, ApiError> {
    id.parse::<CartId>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid cart id: {e}")))
}
