use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Loads `.env`, an optional `configuration` file and `APP__*` variables.
    /// A plain `PORT` variable takes precedence over all of them.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::with_port(std::env::var("PORT").ok())
    }

    /// Builds the config with `port` as the highest-precedence source.
    /// Empty or whitespace-only values count as unset.
    fn with_port(port: Option<String>) -> Result<Self, AppError> {
        let port = port.filter(|p| !p.trim().is_empty());

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .set_override_option("port", port)?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
