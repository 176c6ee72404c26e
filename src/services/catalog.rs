//! Read-only catalog lookups.
//!
//! Generic over [`ConnectionTrait`] so the same accessors serve the live
//! connection and the checkout transaction, which re-prices the cart inside
//! its own snapshot.

use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::{
    entity::{Products, Restaurants, products, restaurants},
    error::AppResult,
};

pub async fn get_product<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<Option<products::Model>> {
    Ok(Products::find_by_id(id).one(conn).await?)
}

pub async fn get_restaurant<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<Option<restaurants::Model>> {
    Ok(Restaurants::find_by_id(id).one(conn).await?)
}
