pub mod credentials;
pub mod firestore;
pub mod store;

pub use credentials::{CredentialError, ServiceAccountKey};
pub use firestore::{Document, FieldValue, FirestoreDb};
pub use store::ProductStore;
