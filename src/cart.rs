//! Session-resident shopping cart.
//!
//! The cart lives as a JSON blob inside the browser session. Two on-disk
//! shapes exist historically: the canonical sequence of lines, and a legacy
//! dictionary keyed by product id with the restaurant id held separately.
//! [`normalize`] is the single place both shapes are decoded; everything
//! downstream only ever sees the canonical [`Cart`], and saves always write
//! the sequence form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub restaurant_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

#[derive(Debug, Deserialize)]
struct LegacyItem {
    quantity: i32,
}

/// Old dictionary shape: `{"restaurant_id": ..., "items": {"<product_id>": {"quantity": n}}}`.
#[derive(Debug, Deserialize)]
struct LegacyCart {
    restaurant_id: Uuid,
    #[serde(default)]
    items: BTreeMap<Uuid, LegacyItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCart {
    Lines(Vec<CartLine>),
    Legacy(LegacyCart),
}

/// Decode either historical cart shape into the canonical one. Blobs that
/// match neither shape decode as an empty cart rather than failing the
/// request. Lines with a non-positive quantity are discarded.
pub fn normalize(raw: Value) -> Cart {
    match serde_json::from_value::<RawCart>(raw) {
        Ok(RawCart::Lines(lines)) => Cart {
            lines: lines.into_iter().filter(|l| l.quantity >= 1).collect(),
        },
        Ok(RawCart::Legacy(legacy)) => {
            let LegacyCart {
                restaurant_id,
                items,
            } = legacy;
            Cart {
                lines: items
                    .into_iter()
                    .filter(|(_, item)| item.quantity >= 1)
                    .map(|(product_id, item)| CartLine {
                        product_id,
                        restaurant_id,
                        quantity: item.quantity,
                    })
                    .collect(),
            }
        }
        Err(_) => Cart::default(),
    }
}

/// Coerce a raw form quantity into a positive integer. A missing field
/// defaults to 1; anything non-numeric or non-positive is rejected.
pub fn coerce_quantity(raw: Option<&str>) -> AppResult<i32> {
    let quantity = match raw {
        None => 1,
        Some(s) => s
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::BadRequest("quantity must be a positive integer".into()))?,
    };
    if quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be a positive integer".into(),
        ));
    }
    Ok(quantity)
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The single restaurant this cart is bound to, if any.
    pub fn restaurant_id(&self) -> Option<Uuid> {
        self.lines.first().map(|line| line.restaurant_id)
    }

    /// Canonical serialized form, always the sequence shape.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.lines).unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    /// Single mutation entry point for adding items. An empty cart accepts
    /// any restaurant; a non-empty cart rejects a differing restaurant and
    /// is left untouched. An existing line for the product is incremented,
    /// otherwise a new line is appended preserving insertion order.
    pub fn add_or_increment(
        &mut self,
        product_id: Uuid,
        restaurant_id: Uuid,
        quantity: i32,
    ) -> AppResult<()> {
        if quantity < 1 {
            return Err(AppError::BadRequest(
                "quantity must be a positive integer".into(),
            ));
        }

        if let Some(established) = self.restaurant_id() {
            if established != restaurant_id {
                return Err(AppError::CrossRestaurantConflict);
            }
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| AppError::BadRequest("quantity is too large".into()))?;
            return Ok(());
        }

        self.lines.push(CartLine {
            product_id,
            restaurant_id,
            quantity,
        });
        Ok(())
    }

    /// Overwrite the quantity of an existing line.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: i32) -> AppResult<()> {
        if quantity < 1 {
            return Err(AppError::BadRequest(
                "quantity must be a positive integer".into(),
            ));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or(AppError::NotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove the line for a product. Removing a product that is not in the
    /// cart is a no-op.
    pub fn remove_line(&mut self, product_id: Uuid) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
