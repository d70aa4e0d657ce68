pub mod products;

pub use products::{
    validation_message, ApiResponse, CreateProductRequest, ValidationError, CREATED_MESSAGE,
    REQUIRED_FIELDS_MESSAGE,
};
