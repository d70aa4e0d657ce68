//! Service-account key loading.
//!
//! The key file is the JSON document Google Cloud issues for a service
//! account. Only the fields needed to mint access tokens are read.

use jsonwebtoken::EncodingKey;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::io;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential file {0} not found")]
    NotFound(String),

    #[error("credential file {path} could not be read: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("credential file {path} is corrupt or invalid: {reason}")]
    Invalid { path: String, reason: String },
}

impl CredentialError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CredentialError::NotFound(_))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: Secret<String>,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let raw = std::fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CredentialError::NotFound(display.clone()),
            _ => CredentialError::Unreadable {
                path: display.clone(),
                source: e,
            },
        })?;

        Self::from_slice(&raw).map_err(|reason| CredentialError::Invalid {
            path: display,
            reason,
        })
    }

    fn from_slice(raw: &[u8]) -> Result<Self, String> {
        let key: Self = serde_json::from_slice(raw).map_err(|e| e.to_string())?;

        if let Some(key_type) = &key.key_type {
            if key_type != "service_account" {
                return Err(format!("unsupported credential type `{}`", key_type));
            }
        }
        if key.project_id.trim().is_empty() {
            return Err("project_id is empty".to_string());
        }
        if key.client_email.trim().is_empty() {
            return Err("client_email is empty".to_string());
        }

        Ok(key)
    }

    /// Parses the PEM private key into an RS256 signing key.
    pub fn encoding_key(&self) -> Result<EncodingKey, jsonwebtoken::errors::Error> {
        EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())
    }
}
