//! Cart mutations and the pricing engine.
//!
//! Mutations load the session cart, apply one change through the cart's
//! single mutation entry point, and save the canonical shape back. Pricing
//! re-reads every product from the live catalog; a line whose product has
//! disappeared or been discontinued is dropped rather than failing the
//! whole cart.

use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::{
    cart::{self, Cart},
    dto::cart::{AddToCartRequest, CartView, PricedCart, PricedLine},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    services::catalog,
    session::{CartSession, SessionId},
    state::AppState,
};

/// Compute the priced view of a cart. `None` means the cart has no
/// surviving lines. The restaurant is resolved once, from the first
/// surviving line.
pub async fn price_cart<C: ConnectionTrait>(
    conn: &C,
    cart: &Cart,
) -> AppResult<Option<PricedCart>> {
    if cart.is_empty() {
        return Ok(None);
    }

    let mut lines: Vec<PricedLine> = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let Some(product) = catalog::get_product(conn, line.product_id).await? else {
            tracing::warn!(product_id = %line.product_id, "dropping cart line, product gone");
            continue;
        };
        if !product.is_available {
            tracing::warn!(product_id = %line.product_id, "dropping cart line, product discontinued");
            continue;
        }
        let unit_price = product.price;
        lines.push(PricedLine {
            product: product.into(),
            quantity: line.quantity,
            unit_price,
            subtotal: unit_price * i64::from(line.quantity),
        });
    }

    let Some(first) = lines.first() else {
        return Ok(None);
    };

    let restaurant = catalog::get_restaurant(conn, first.product.restaurant_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let subtotal = lines.iter().map(|line| line.subtotal).sum();

    Ok(Some(PricedCart {
        restaurant: restaurant.into(),
        lines,
        subtotal,
    }))
}

pub async fn view_cart(
    state: &AppState,
    session: SessionId,
) -> AppResult<ApiResponse<CartView>> {
    let cart = CartSession::new(&state.pool, session).load().await?;
    let priced = price_cart(&state.orm, &cart).await?;
    Ok(ApiResponse::success("Cart", CartView::from(priced), None))
}

pub async fn add_to_cart(
    state: &AppState,
    session: SessionId,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    let quantity = cart::coerce_quantity(payload.quantity.as_deref())?;

    let product = catalog::get_product(&state.orm, payload.product_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;
    if product.restaurant_id != payload.restaurant_id {
        return Err(AppError::BadRequest(
            "product does not belong to this restaurant".to_string(),
        ));
    }

    let store = CartSession::new(&state.pool, session);
    let mut cart = store.load().await?;
    cart.add_or_increment(payload.product_id, payload.restaurant_id, quantity)?;
    store.save(&cart).await?;

    let priced = price_cart(&state.orm, &cart).await?;
    Ok(ApiResponse::success(
        "Item added to cart",
        CartView::from(priced),
        None,
    ))
}

pub async fn remove_from_cart(
    state: &AppState,
    session: SessionId,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let store = CartSession::new(&state.pool, session);
    let mut cart = store.load().await?;
    cart.remove_line(product_id);
    store.save(&cart).await?;

    let priced = price_cart(&state.orm, &cart).await?;
    Ok(ApiResponse::success(
        "Item removed from cart",
        CartView::from(priced),
        None,
    ))
}

pub async fn clear_cart(
    state: &AppState,
    session: SessionId,
) -> AppResult<ApiResponse<serde_json::Value>> {
    CartSession::new(&state.pool, session).clear().await?;
    Ok(ApiResponse::success(
        "Cart emptied",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
