use crate::models::Product;
use crate::services::firestore::{Document, FirestoreDb};
use async_trait::async_trait;
use service_core::error::AppError;

/// Persistence seam for product records. Handlers only see this trait, so
/// tests can swap in their own implementation.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Create-or-replace keyed by `product.asin`. No merge with an existing
    /// record.
    async fn upsert(&self, product: &Product) -> Result<(), AppError>;
}

#[async_trait]
impl ProductStore for FirestoreDb {
    async fn upsert(&self, product: &Product) -> Result<(), AppError> {
        self.set_document(self.collection(), &product.asin, &Document::from(product))
            .await
    }
}
