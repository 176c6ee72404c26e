pub mod auth_service;
pub mod cart_service;
pub mod catalog;
pub mod order_service;
pub mod restaurant_service;
