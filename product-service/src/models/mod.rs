pub mod product;

pub use product::{format_timestamp, whole_number, Product, DEFAULT_TITLE};
