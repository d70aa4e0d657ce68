//! Test helpers for product-service integration tests.
//!
//! The application is spawned on a random port with an in-memory
//! `ProductStore`, so no Firestore project is needed.

#![allow(dead_code)]

use async_trait::async_trait;
use product_service::config::{FirestoreConfig, ProductConfig};
use product_service::models::Product;
use product_service::services::ProductStore;
use product_service::startup::Application;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Last-write-wins map keyed by ASIN, mirroring document replacement.
#[derive(Default)]
pub struct InMemoryStore {
    products: Mutex<HashMap<String, Product>>,
    writes: Mutex<usize>,
}

impl InMemoryStore {
    pub fn get(&self, asin: &str) -> Option<Product> {
        self.products.lock().unwrap().get(asin).cloned()
    }

    pub fn len(&self) -> usize {
        self.products.lock().unwrap().len()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn upsert(&self, product: &Product) -> Result<(), AppError> {
        self.products
            .lock()
            .unwrap()
            .insert(product.asin.clone(), product.clone());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}

/// Store whose every write fails, as if the database were unreachable.
pub struct FailingStore;

#[async_trait]
impl ProductStore for FailingStore {
    async fn upsert(&self, _product: &Product) -> Result<(), AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!(
            "connection refused: firestore.googleapis.com:443"
        )))
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    pub async fn spawn(store: Arc<dyn ProductStore>) -> Self {
        let config = ProductConfig {
            common: CoreConfig { port: 0 }, // Random port for testing
            firestore: FirestoreConfig::default(),
        };

        let app = Application::build(&config, store)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }

    pub async fn post_product(&self, body: serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/products", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_raw(&self, body: &'static str) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/products", self.address))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
