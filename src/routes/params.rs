use serde::Deserialize;
use utoipa::ToSchema;

/// Shared pagination query for listings.
#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// Clamp to sane values and derive the SQL offset.
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page, (page - 1) * per_page)
    }
}

/// Storefront restaurant listing: pagination plus an optional
/// case-insensitive name search.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RestaurantQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub q: Option<String>,
}
