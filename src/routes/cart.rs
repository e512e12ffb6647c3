use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    cart::CartSnapshot,
    dto::cart::{AddCartItemRequest, UpdateCartLineRequest},
    error::AppResult,
    middleware::tenant::StaffContext,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart).delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/{product_id}", patch(update_quantity))
        .route("/items/{product_id}", delete(remove_item))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current order lines and total", body = ApiResponse<CartSnapshot>)
    ),
    tag = "Cart"
)]
pub async fn view_cart(State(state): State<AppState>) -> Json<ApiResponse<CartSnapshot>> {
    Json(ApiResponse::success("OK", state.cart.snapshot(), None))
}

/// Ring up one unit of a product. The product's name and price are captured
/// into the line at this moment; stock is not checked here.
#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Line added or incremented", body = ApiResponse<CartSnapshot>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    ctx: StaffContext,
    Json(payload): Json<AddCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    let product = product_service::fetch_product(&state.pool, &ctx, payload.product_id).await?;
    let snapshot = state.cart.add_item(&product)?;
    Ok(Json(ApiResponse::success("Added to order", snapshot, None)))
}

#[utoipa::path(
    patch,
    path = "/api/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateCartLineRequest,
    responses(
        (status = 200, description = "Quantity set (zero or less removes the line)", body = ApiResponse<CartSnapshot>),
        (status = 404, description = "No such line"),
    ),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateCartLineRequest>,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    let snapshot = state.cart.update_quantity(product_id, payload.quantity)?;
    Ok(Json(ApiResponse::success("Quantity updated", snapshot, None)))
}

/// Removing a line that is not in the order is a no-op, not an error.
#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Line removed if present", body = ApiResponse<CartSnapshot>),
    ),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    let snapshot = state.cart.remove_item(product_id)?;
    Ok(Json(ApiResponse::success("Removed from order", snapshot, None)))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Order emptied", body = ApiResponse<CartSnapshot>),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    let snapshot = state.cart.clear()?;
    Ok(Json(ApiResponse::success("Order cleared", snapshot, None)))
}
