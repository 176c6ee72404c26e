use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Product, Restaurant};

/// Form posted from a restaurant's menu page. `quantity` arrives as a raw
/// form string and is coerced server-side; absent means 1.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub restaurant_id: Uuid,
    pub quantity: Option<String>,
}

/// A cart line re-priced against the live catalog. Never persisted; prices
/// are not trusted from the session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PricedLine {
    pub product: Product,
    pub quantity: i32,
    pub unit_price: i64,
    pub subtotal: i64,
}

/// Non-empty priced cart: the engine's output.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PricedCart {
    pub restaurant: Restaurant,
    pub lines: Vec<PricedLine>,
    pub subtotal: i64,
}

/// What `GET /orders/cart` renders; an empty cart has no restaurant.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub restaurant: Option<Restaurant>,
    pub lines: Vec<PricedLine>,
    pub subtotal: i64,
}

impl From<Option<PricedCart>> for CartView {
    fn from(priced: Option<PricedCart>) -> Self {
        match priced {
            Some(priced) => CartView {
                restaurant: Some(priced.restaurant),
                lines: priced.lines,
                subtotal: priced.subtotal,
            },
            None => CartView {
                restaurant: None,
                lines: Vec::new(),
                subtotal: 0,
            },
        }
    }
}
