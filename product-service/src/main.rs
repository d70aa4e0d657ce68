use product_service::config::ProductConfig;
use product_service::services::{FirestoreDb, ProductStore};
use product_service::startup::Application;
use service_core::observability::init_tracing;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("product-service", "info");

    let config = ProductConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    // Credential failures are fatal: returning the error exits with status 1.
    let db = FirestoreDb::connect(&config.firestore)?;
    let store: Arc<dyn ProductStore> = Arc::new(db);

    let application = Application::build(&config, store).await?;
    application.run_until_stopped().await?;

    tracing::info!("Server stopped");
    Ok(())
}
