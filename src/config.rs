use std::path::PathBuf;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub app_name: String,
    pub database_url: String,
    pub share_root: PathBuf,
    pub rest_port: u16,
    pub jwt_secret: String,
    /// Validity window for generated share links, in days.
    pub link_validity_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| "HomeHub".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://homehub.db".to_string()),
            share_root: std::env::var("SHARE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_share_root()),
            rest_port: std::env::var("REST_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            jwt_secret: std::env::var("JWT_SECRET")
                .expect("JWT_SECRET environment variable must be set. Generate with: openssl rand -hex 32"),
            link_validity_days: std::env::var("LINK_VALIDITY_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()?,
        })
    }
}

fn default_share_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("HomeHubShared")
}
