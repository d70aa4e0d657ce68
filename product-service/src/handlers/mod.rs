pub mod health;
pub mod products;

pub use health::{health_check, welcome, WELCOME_MESSAGE};
pub use products::create_product;
