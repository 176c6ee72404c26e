//! Catalog browse reads: the storefront side of the Catalog Accessor.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    models::{Product, Restaurant},
    response::{ApiResponse, Meta},
    routes::params::RestaurantQuery,
};

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct RestaurantList {
    pub items: Vec<Restaurant>,
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct RestaurantDetail {
    pub restaurant: Restaurant,
    pub menu: Vec<Product>,
}

pub async fn list_restaurants(
    pool: &DbPool,
    query: RestaurantQuery,
) -> AppResult<ApiResponse<RestaurantList>> {
    let (page, limit, offset) = query.pagination.resolve();
    // Empty or whitespace-only search terms list everything.
    let pattern = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{q}%"));

    let (items, total) = match &pattern {
        Some(pattern) => {
            let items = sqlx::query_as::<_, Restaurant>(
                "SELECT * FROM restaurants WHERE is_active AND name ILIKE $1 \
                 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
            let total: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM restaurants WHERE is_active AND name ILIKE $1",
            )
            .bind(pattern)
            .fetch_one(pool)
            .await?;
            (items, total)
        }
        None => {
            let items = sqlx::query_as::<_, Restaurant>(
                "SELECT * FROM restaurants WHERE is_active ORDER BY created_at DESC \
                 LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
            let total: (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM restaurants WHERE is_active")
                    .fetch_one(pool)
                    .await?;
            (items, total)
        }
    };

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Restaurants",
        RestaurantList { items },
        Some(meta),
    ))
}

pub async fn get_restaurant(
    pool: &DbPool,
    id: Uuid,
) -> AppResult<ApiResponse<RestaurantDetail>> {
    let restaurant: Restaurant = sqlx::query_as("SELECT * FROM restaurants WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let menu = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE restaurant_id = $1 AND is_available ORDER BY name",
    )
    .bind(restaurant.id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Restaurant",
        RestaurantDetail { restaurant, menu },
        None,
    ))
}
