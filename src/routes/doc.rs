use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, CartView, PricedCart, PricedLine},
        orders::{
            CheckoutPreview, CheckoutRequest, OrderList, OrderWithItems,
            UpdateOrderStatusRequest,
        },
    },
    models::{Order, OrderItem, OrderStatus, Product, Restaurant, User},
    response::{ApiResponse, Meta},
    routes::{auth, health, orders, params, restaurants},
    services::restaurant_service::{RestaurantDetail, RestaurantList},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        restaurants::list_restaurants,
        restaurants::restaurant_detail,
        orders::view_cart,
        orders::add_to_cart,
        orders::remove_from_cart,
        orders::clear_cart,
        orders::checkout_preview,
        orders::checkout,
        orders::order_confirmation,
        orders::my_orders,
        orders::order_detail,
        orders::restaurant_orders,
        orders::update_order_status,
    ),
    components(
        schemas(
            User,
            Restaurant,
            Product,
            Order,
            OrderItem,
            OrderStatus,
            AddToCartRequest,
            PricedLine,
            PricedCart,
            CartView,
            CheckoutRequest,
            CheckoutPreview,
            OrderWithItems,
            OrderList,
            UpdateOrderStatusRequest,
            RestaurantList,
            RestaurantDetail,
            params::Pagination,
            params::RestaurantQuery,
            Meta,
            ApiResponse<CartView>,
            ApiResponse<CheckoutPreview>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<RestaurantList>,
            ApiResponse<RestaurantDetail>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Restaurants", description = "Restaurant browsing"),
        (name = "Cart", description = "Session cart endpoints"),
        (name = "Checkout", description = "Checkout endpoints"),
        (name = "Orders", description = "Order queries and status updates"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
