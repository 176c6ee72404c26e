use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::cart::PricedLine;
use crate::models::{Order, OrderItem, Restaurant};

/// Checkout form. Guests must supply name, email and phone; registered
/// customers have them copied from the account. The delivery address is
/// required on both paths.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Priced summary rendered by `GET /orders/checkout`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutPreview {
    pub restaurant: Restaurant,
    pub lines: Vec<PricedLine>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub grand_total: i64,
    pub is_guest: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Form field posted by the restaurant dashboard.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}
