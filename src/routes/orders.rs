//! The cart and checkout HTTP surface. Paths mirror the storefront routes;
//! responses use the JSON envelope. Cart endpoints refresh the session
//! cookie on every response so a fresh browser picks up its cart id.

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderName, header},
    response::AppendHeaders,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        cart::{AddToCartRequest, CartView},
        orders::{CheckoutPreview, CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    },
    error::AppResult,
    middleware::auth::{AuthUser, OptionalAuthUser},
    models::Order,
    response::ApiResponse,
    services::{cart_service, order_service},
    session::SessionId,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(view_cart))
        .route("/add_to_cart", post(add_to_cart))
        .route("/remove_from_cart/{product_id}", get(remove_from_cart))
        .route("/clear_cart", get(clear_cart))
        .route("/checkout", get(checkout_preview).post(checkout))
        .route("/order_confirmation/{order_id}", get(order_confirmation))
        .route("/my_orders", get(my_orders))
        .route("/order/{order_id}", get(order_detail))
        .route("/restaurant_orders", get(restaurant_orders))
        .route("/update_order_status/{order_id}", post(update_order_status))
}

type SessionCookie = AppendHeaders<[(HeaderName, String); 1]>;

fn session_cookie(session: SessionId) -> SessionCookie {
    AppendHeaders([(header::SET_COOKIE, session.cookie_value())])
}

#[utoipa::path(
    get,
    path = "/orders/cart",
    responses(
        (status = 200, description = "Priced cart for this session", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    session: SessionId,
) -> AppResult<(SessionCookie, Json<ApiResponse<CartView>>)> {
    let resp = cart_service::view_cart(&state, session).await?;
    Ok((session_cookie(session), Json(resp)))
}

#[utoipa::path(
    post,
    path = "/orders/add_to_cart",
    request_body(content = AddToCartRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Item added or incremented", body = ApiResponse<CartView>),
        (status = 400, description = "Bad quantity or unknown product"),
        (status = 409, description = "Cart already holds another restaurant's items"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: SessionId,
    Form(payload): Form<AddToCartRequest>,
) -> AppResult<(SessionCookie, Json<ApiResponse<CartView>>)> {
    let resp = cart_service::add_to_cart(&state, session, payload).await?;
    Ok((session_cookie(session), Json(resp)))
}

#[utoipa::path(
    get,
    path = "/orders/remove_from_cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    session: SessionId,
    Path(product_id): Path<Uuid>,
) -> AppResult<(SessionCookie, Json<ApiResponse<CartView>>)> {
    let resp = cart_service::remove_from_cart(&state, session, product_id).await?;
    Ok((session_cookie(session), Json(resp)))
}

#[utoipa::path(
    get,
    path = "/orders/clear_cart",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<serde_json::Value>)
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    session: SessionId,
) -> AppResult<(SessionCookie, Json<ApiResponse<serde_json::Value>>)> {
    let resp = cart_service::clear_cart(&state, session).await?;
    Ok((session_cookie(session), Json(resp)))
}

#[utoipa::path(
    get,
    path = "/orders/checkout",
    responses(
        (status = 200, description = "Priced checkout summary", body = ApiResponse<CheckoutPreview>),
        (status = 400, description = "Empty cart or below the restaurant minimum"),
    ),
    tag = "Checkout"
)]
pub async fn checkout_preview(
    State(state): State<AppState>,
    OptionalAuthUser(identity): OptionalAuthUser,
    session: SessionId,
) -> AppResult<Json<ApiResponse<CheckoutPreview>>> {
    let resp = order_service::checkout_preview(&state, session, identity.as_ref()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/orders/checkout",
    request_body(content = CheckoutRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Order placed", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Empty cart, below minimum, or missing customer details"),
    ),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    OptionalAuthUser(identity): OptionalAuthUser,
    session: SessionId,
    Form(payload): Form<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::checkout(&state, session, identity, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/orders/order_confirmation/{order_id}",
    params(
        ("order_id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order receipt, guest-accessible", body = ApiResponse<OrderWithItems>),
        (status = 403, description = "Authenticated requester does not own this order"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn order_confirmation(
    State(state): State<AppState>,
    OptionalAuthUser(identity): OptionalAuthUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::order_confirmation(&state, identity.as_ref(), order_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/orders/my_orders",
    responses(
        (status = 200, description = "Order history, newest first", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::my_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/orders/order/{order_id}",
    params(
        ("order_id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order detail", body = ApiResponse<OrderWithItems>),
        (status = 403, description = "Requester is neither the customer nor the restaurant owner"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn order_detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::order_detail(&state, &user, order_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/orders/restaurant_orders",
    responses(
        (status = 200, description = "Incoming orders for the owner's restaurant", body = ApiResponse<OrderList>),
        (status = 403, description = "Requester is not a restaurant owner"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn restaurant_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::restaurant_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/orders/update_order_status/{order_id}",
    params(
        ("order_id" = Uuid, Path, description = "Order ID")
    ),
    request_body(content = UpdateOrderStatusRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Not the owner of this order's restaurant"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Form(payload): Form<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp =
        order_service::update_order_status(&state, &user, order_id, &payload.status).await?;
    Ok(Json(resp))
}
