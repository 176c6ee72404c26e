//! Checkout orchestration and post-checkout order queries.
//!
//! Checkout runs a linear pipeline: empty check, pricing against the live
//! catalog, minimum-order check, identity resolution, and a single SeaORM
//! transaction inserting the order and its items. The session cart is only
//! cleared after the transaction commits, so a failed attempt can be
//! retried with the cart intact.

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::{
        cart::PricedCart,
        orders::{CheckoutPreview, CheckoutRequest, OrderList, OrderWithItems},
    },
    entity::{
        Restaurants, Users,
        orders::{ActiveModel as OrderActive, Entity as Orders},
        order_items::ActiveModel as OrderItemActive,
        restaurants::Column as RestaurantCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner},
    models::{Order, OrderItem, OrderStatus, Restaurant},
    response::{ApiResponse, Meta},
    services::cart_service,
    session::{CartSession, SessionId},
    state::AppState,
};

/// Customer fields resolved for an order: either copied from the account or
/// captured from the guest checkout form.
#[derive(Debug)]
pub struct OrderDetails {
    pub user_id: Option<Uuid>,
    pub is_guest: bool,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_address: String,
}

fn required_field(value: Option<String>, name: &str) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(format!("{name} is required"))),
    }
}

/// Insert the order row and one item row per priced line on `conn`. Callers
/// run this inside a transaction; any error propagates before commit and
/// rolls the whole attempt back, leaving no partial rows.
pub async fn persist_order<C: ConnectionTrait>(
    conn: &C,
    priced: &PricedCart,
    details: OrderDetails,
) -> AppResult<(Order, Vec<OrderItem>)> {
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(details.user_id),
        restaurant_id: Set(priced.restaurant.id),
        total: Set(priced.subtotal + priced.restaurant.delivery_fee),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        delivery_address: Set(details.delivery_address),
        customer_name: Set(details.customer_name),
        customer_email: Set(details.customer_email),
        customer_phone: Set(details.customer_phone),
        is_guest: Set(details.is_guest),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(priced.lines.len());
    for line in &priced.lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product.id),
            quantity: Set(line.quantity),
            price: Set(line.unit_price),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
        items.push(item.into());
    }

    Ok((order.into(), items))
}

/// Priced summary for the checkout page, rejecting carts that cannot be
/// checked out so the caller can send the customer back to the cart view.
pub async fn checkout_preview(
    state: &AppState,
    session: SessionId,
    identity: Option<&AuthUser>,
) -> AppResult<ApiResponse<CheckoutPreview>> {
    let cart = CartSession::new(&state.pool, session).load().await?;
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let priced = cart_service::price_cart(&state.orm, &cart)
        .await?
        .ok_or(AppError::EmptyCart)?;
    if priced.subtotal < priced.restaurant.min_order {
        return Err(AppError::BelowMinimum(priced.restaurant.min_order));
    }

    let delivery_fee = priced.restaurant.delivery_fee;
    let preview = CheckoutPreview {
        grand_total: priced.subtotal + delivery_fee,
        delivery_fee,
        subtotal: priced.subtotal,
        is_guest: identity.is_none(),
        restaurant: priced.restaurant,
        lines: priced.lines,
    };
    Ok(ApiResponse::success("Checkout", preview, None))
}

pub async fn checkout(
    state: &AppState,
    session: SessionId,
    identity: Option<AuthUser>,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let store = CartSession::new(&state.pool, session);
    let cart = store.load().await?;
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let txn = state.orm.begin().await?;

    // Prices come from the catalog inside the transaction, never from the
    // session blob.
    let priced = cart_service::price_cart(&txn, &cart)
        .await?
        .ok_or(AppError::EmptyCart)?;

    if priced.subtotal < priced.restaurant.min_order {
        return Err(AppError::BelowMinimum(priced.restaurant.min_order));
    }

    // Customer details are only validated once the cart itself has passed.
    let delivery_address = required_field(payload.address, "address")?;

    let details = match identity {
        Some(auth) => {
            let user = Users::find_by_id(auth.user_id)
                .one(&txn)
                .await?
                .ok_or(AppError::Forbidden)?;
            OrderDetails {
                user_id: Some(user.id),
                is_guest: false,
                customer_name: Some(user.username),
                customer_email: Some(user.email),
                customer_phone: user.phone,
                delivery_address,
            }
        }
        None => OrderDetails {
            user_id: None,
            is_guest: true,
            customer_name: Some(required_field(payload.name, "name")?),
            customer_email: Some(required_field(payload.email, "email")?),
            customer_phone: Some(required_field(payload.phone, "phone")?),
            delivery_address,
        },
    };

    let (order, items) = persist_order(&txn, &priced, details).await?;
    txn.commit().await?;

    // Only a committed order empties the cart. If the clear itself fails the
    // order still stands; log and move on.
    if let Err(err) = store.clear().await {
        tracing::warn!(error = %err, order_id = %order.id, "failed to clear cart after checkout");
    }

    Ok(ApiResponse::success(
        "Your order has been placed",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

/// Order receipt. Guests carry no identity, so an unauthenticated request
/// is served without an ownership check; the v4 order id acts as the
/// capability. An authenticated requester must be the ordering user.
pub async fn order_confirmation(
    state: &AppState,
    identity: Option<&AuthUser>,
    order_id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = fetch_order(state, order_id).await?;

    if let Some(auth) = identity {
        if order.user_id != Some(auth.user_id) {
            return Err(AppError::Forbidden);
        }
    }

    let items = fetch_items(state, order.id).await?;
    Ok(ApiResponse::success(
        "Order confirmation",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

pub async fn my_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let items = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Your orders",
        OrderList { items },
        Some(Meta::single_page(total)),
    ))
}

/// Full order detail; visible to the ordering user and to the owner of the
/// restaurant the order was placed with.
pub async fn order_detail(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = fetch_order(state, order_id).await?;

    let restaurant: Option<Restaurant> =
        sqlx::query_as("SELECT * FROM restaurants WHERE id = $1")
            .bind(order.restaurant_id)
            .fetch_optional(&state.pool)
            .await?;

    let is_customer = order.user_id == Some(user.user_id);
    let is_restaurant_owner = restaurant
        .map(|r| r.user_id == user.user_id)
        .unwrap_or(false);
    if !is_customer && !is_restaurant_owner {
        return Err(AppError::Forbidden);
    }

    let items = fetch_items(state, order.id).await?;
    Ok(ApiResponse::success(
        "Order detail",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

/// Incoming orders for the requester's restaurant, newest first.
pub async fn restaurant_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_owner(user)?;

    let restaurant: Restaurant =
        sqlx::query_as("SELECT * FROM restaurants WHERE user_id = $1 LIMIT 1")
            .bind(user.user_id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(AppError::NotFound)?;

    let items = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE restaurant_id = $1 ORDER BY created_at DESC",
    )
    .bind(restaurant.id)
    .fetch_all(&state.pool)
    .await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Restaurant orders",
        OrderList { items },
        Some(Meta::single_page(total)),
    ))
}

/// Status transition, guarded to the owner of the order's restaurant. Any
/// enumerated status is accepted from any prior status; updates are
/// last-write-wins.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    raw_status: &str,
) -> AppResult<ApiResponse<Order>> {
    ensure_owner(user)?;

    let status = OrderStatus::parse(raw_status)
        .ok_or_else(|| AppError::BadRequest("Invalid status".to_string()))?;

    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let restaurant = Restaurants::find()
        .filter(RestaurantCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.restaurant_id != restaurant.id {
        return Err(AppError::Forbidden);
    }

    let mut active: OrderActive = order.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Order status updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

async fn fetch_order(state: &AppState, order_id: Uuid) -> AppResult<Order> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)
}

async fn fetch_items(state: &AppState, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at",
    )
    .bind(order_id)
    .fetch_all(&state.pool)
    .await?)
}
