//! Cloud Firestore client over the REST API.
//!
//! Authenticates with a service-account key: a signed RS256 assertion is
//! exchanged for an OAuth2 access token, which is cached until shortly
//! before it expires. Against the emulator no token exchange happens.

use crate::config::FirestoreConfig;
use crate::models::{format_timestamp, whole_number, Product};
use crate::services::credentials::{CredentialError, ServiceAccountKey};
use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
const EMULATOR_TOKEN: &str = "owner";

/// A typed Firestore field value, serialized in the REST wire format
/// (`{"stringValue": "..."}`, `{"nullValue": null}`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    StringValue(String),
    /// int64 travels as a decimal string.
    IntegerValue(String),
    DoubleValue(f64),
    NullValue(()),
}

impl FieldValue {
    pub fn optional_string(value: Option<&str>) -> Self {
        match value {
            Some(value) => FieldValue::StringValue(value.to_string()),
            None => FieldValue::NullValue(()),
        }
    }

    pub fn number(value: f64) -> Self {
        match whole_number(value) {
            Some(whole) => FieldValue::IntegerValue(whole.to_string()),
            None => FieldValue::DoubleValue(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub fields: BTreeMap<String, FieldValue>,
}

impl From<&Product> for Document {
    fn from(product: &Product) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            "asin".to_string(),
            FieldValue::StringValue(product.asin.clone()),
        );
        fields.insert(
            "upc".to_string(),
            FieldValue::optional_string(product.upc.as_deref()),
        );
        fields.insert(
            "sku".to_string(),
            FieldValue::optional_string(product.sku.as_deref()),
        );
        fields.insert(
            "title".to_string(),
            FieldValue::StringValue(product.title.clone()),
        );
        fields.insert("cost".to_string(), FieldValue::number(product.cost));
        fields.insert(
            "createdAt".to_string(),
            FieldValue::StringValue(format_timestamp(&product.created_at)),
        );
        fields.insert(
            "updatedAt".to_string(),
            FieldValue::StringValue(format_timestamp(&product.updated_at)),
        );
        Self { fields }
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

enum Auth {
    ServiceAccount {
        key: ServiceAccountKey,
        signing_key: EncodingKey,
        cache: RwLock<Option<CachedToken>>,
    },
    Emulator,
}

/// Authenticated handle to one Firestore database. Cheap to clone.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Client,
    base_url: String,
    project_id: String,
    collection: String,
    auth: Arc<Auth>,
}

impl FirestoreDb {
    /// Loads the service-account key and builds the handle. Logs a
    /// diagnostic telling a missing key file apart from a corrupt one; the
    /// caller decides whether to exit.
    pub fn connect(config: &FirestoreConfig) -> Result<Self, CredentialError> {
        let result = Self::from_config(config);

        match &result {
            Ok(db) => tracing::info!(
                project_id = %db.project_id,
                collection = %db.collection,
                base_url = %db.base_url,
                "Firestore connected successfully using service-account key file"
            ),
            Err(CredentialError::NotFound(path)) => tracing::error!(
                path = %path,
                "FATAL: service-account key file not found. Place it at this path or set GOOGLE_APPLICATION_CREDENTIALS"
            ),
            Err(e) => tracing::error!(
                error = %e,
                "FATAL: could not initialize Firestore. The service-account key file may be corrupt or invalid"
            ),
        }

        result
    }

    fn from_config(config: &FirestoreConfig) -> Result<Self, CredentialError> {
        let key = ServiceAccountKey::from_file(&config.credentials_path)?;

        let auth = if config.emulator_host.is_some() {
            Auth::Emulator
        } else {
            let signing_key = key.encoding_key().map_err(|e| CredentialError::Invalid {
                path: config.credentials_path.clone(),
                reason: format!("private_key is not a valid RSA key: {}", e),
            })?;
            Auth::ServiceAccount {
                key: key.clone(),
                signing_key,
                cache: RwLock::new(None),
            }
        };

        Ok(Self {
            client: Client::new(),
            base_url: config.base_url(),
            project_id: key.project_id,
            collection: config.collection.clone(),
            auth: Arc::new(auth),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.base_url,
            self.project_id,
            urlencoding::encode(collection),
            urlencoding::encode(id)
        )
    }

    /// Creates the document or fully replaces an existing one. No update
    /// mask is sent, so fields absent from `document` are removed.
    pub async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: &Document,
    ) -> Result<(), AppError> {
        let token = self.access_token().await?;
        let url = self.document_url(collection, id);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&token)
            .json(document)
            .send()
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow!("Failed to connect to Firestore: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::DatabaseError(anyhow!(
                "Firestore returned error status {} for {}/{}: {}",
                status,
                collection,
                id,
                body
            )));
        }

        tracing::debug!(collection = %collection, id = %id, "Firestore document written");
        Ok(())
    }

    async fn access_token(&self) -> Result<String, AppError> {
        let (key, signing_key, cache) = match self.auth.as_ref() {
            Auth::Emulator => return Ok(EMULATOR_TOKEN.to_string()),
            Auth::ServiceAccount {
                key,
                signing_key,
                cache,
            } => (key, signing_key, cache),
        };

        if let Some(token) = cache.read().await.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let mut cache = cache.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(token) = cache.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch_token(key, signing_key).await?;
        let value = token.value.clone();
        *cache = Some(token);
        Ok(value)
    }

    async fn fetch_token(
        &self,
        key: &ServiceAccountKey,
        signing_key: &EncodingKey,
    ) -> Result<CachedToken, AppError> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &key.client_email,
            sub: &key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();

        let assertion = encode(&header, &claims, signing_key).map_err(|e| {
            AppError::InternalError(anyhow!("Failed to sign token assertion: {}", e))
        })?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow!("Failed to reach token endpoint: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::DatabaseError(anyhow!(
                "Token endpoint returned error status {}: {}",
                status,
                body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::DatabaseError(anyhow!("Failed to parse token response: {}", e))
        })?;

        tracing::debug!(expires_in = token.expires_in, "Obtained Firestore access token");

        Ok(CachedToken {
            expires_at: token_expiry(now, token.expires_in)?,
            value: token.access_token,
        })
    }
}

/// `expires_in` comes from the token endpoint; out-of-range values are an
/// error rather than an overflow.
fn token_expiry(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>, AppError> {
    Duration::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            AppError::DatabaseError(anyhow!(
                "Token endpoint returned an out-of-range expires_in: {}",
                expires_in
            ))
        })
}
