use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub storage_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    pub listen: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub postgres: Postgres,
    pub identity: Identity,
    pub chat: Chat,
    pub http: Http,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config.toml"))
            .build()?;

        config.try_deserialize()
    }
}
