use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_CREDENTIALS_PATH: &str = "serviceAccountKey.json";
pub const DEFAULT_COLLECTION: &str = "products";
pub const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com";

#[derive(Debug, Clone)]
pub struct ProductConfig {
    pub common: core_config::Config,
    pub firestore: FirestoreConfig,
}

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Service-account key file, relative to the working directory.
    pub credentials_path: String,
    pub collection: String,
    /// `host:port` of a local emulator. Skips the OAuth exchange when set.
    pub emulator_host: Option<String>,
    pub api_base_url: String,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            credentials_path: DEFAULT_CREDENTIALS_PATH.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            emulator_host: None,
            api_base_url: FIRESTORE_API_BASE.to_string(),
        }
    }
}

impl FirestoreConfig {
    /// Base URL requests are sent to: the emulator if configured, otherwise
    /// the public API.
    pub fn base_url(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!("http://{}", host),
            None => self.api_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl ProductConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env, PORT and APP__ prefix)
        let common = core_config::Config::load()?;

        Ok(ProductConfig {
            common,
            firestore: FirestoreConfig {
                credentials_path: get_env(
                    "GOOGLE_APPLICATION_CREDENTIALS",
                    DEFAULT_CREDENTIALS_PATH,
                ),
                collection: get_env("FIRESTORE_COLLECTION", DEFAULT_COLLECTION),
                emulator_host: env::var("FIRESTORE_EMULATOR_HOST")
                    .ok()
                    .filter(|host| !host.trim().is_empty()),
                api_base_url: get_env("FIRESTORE_API_BASE_URL", FIRESTORE_API_BASE),
            },
        })
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|val| !val.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
