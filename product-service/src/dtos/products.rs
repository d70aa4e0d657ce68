use crate::models::{Product, DEFAULT_TITLE};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const REQUIRED_FIELDS_MESSAGE: &str = "ASIN and Cost are required fields.";
pub const CREATED_MESSAGE: &str = "Product created successfully!";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ASIN is required.")]
    MissingAsin,
    #[error("Cost is required.")]
    MissingCost,
    #[error("Cost must be a valid number.")]
    InvalidCost,
    #[error("{0} must be a string.")]
    InvalidField(&'static str),
}

impl ValidationError {
    fn is_missing_required(&self) -> bool {
        matches!(self, Self::MissingAsin | Self::MissingCost)
    }
}

/// Client-facing message for a rejected payload.
pub fn validation_message(errors: &[ValidationError]) -> String {
    if errors.iter().any(ValidationError::is_missing_required) {
        return REQUIRED_FIELDS_MESSAGE.to_string();
    }
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| REQUIRED_FIELDS_MESSAGE.to_string())
}

/// Raw body of `POST /api/products`. Fields stay untyped until [`validate`]
/// so absent, `null` and wrongly-typed values can be told apart.
///
/// [`validate`]: CreateProductRequest::validate
#[derive(Debug, Default, Clone)]
pub struct CreateProductRequest {
    fields: Map<String, Value>,
}

impl CreateProductRequest {
    /// An empty body reads as `{}`. Valid JSON that is not an object carries
    /// no fields. Malformed JSON is an error.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let fields = match serde_json::from_slice::<Value>(body)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };

        Ok(Self { fields })
    }

    pub fn validate(&self, now: DateTime<Utc>) -> Result<Product, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let asin = match self.fields.get("asin") {
            Some(Value::String(asin)) if !asin.is_empty() => Some(asin.clone()),
            _ => {
                errors.push(ValidationError::MissingAsin);
                None
            }
        };

        let cost = match self.fields.get("cost") {
            None | Some(Value::Null) => {
                errors.push(ValidationError::MissingCost);
                None
            }
            Some(value) => {
                let cost = coerce_number(value);
                if cost.is_none() {
                    errors.push(ValidationError::InvalidCost);
                }
                cost
            }
        };

        let upc = self.optional_text("upc", &mut errors);
        let sku = self.optional_text("sku", &mut errors);
        let title = self.optional_text("title", &mut errors);

        match (asin, cost) {
            (Some(asin), Some(cost)) if errors.is_empty() => Ok(Product {
                asin,
                upc,
                sku,
                title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                cost,
                created_at: now,
                updated_at: now,
            }),
            _ => Err(errors),
        }
    }

    /// Absent, `null` and `""` map to `None`; numbers are kept as their
    /// decimal text.
    fn optional_text(
        &self,
        field: &'static str,
        errors: &mut Vec<ValidationError>,
    ) -> Option<String> {
        match self.fields.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) if text.is_empty() => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            Some(_) => {
                errors.push(ValidationError::InvalidField(field));
                None
            }
        }
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            text.parse::<f64>().ok()?
        }
        _ => return None,
    };

    number.is_finite().then_some(number)
}

/// Envelope for successful responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}
