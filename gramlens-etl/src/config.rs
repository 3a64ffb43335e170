use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::EtlError;

#[derive(Debug, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub access_token: Option<String>,
    pub business_id: Option<String>,
    pub media_limit: u32,
    pub comment_page_size: u32,
    /// Cooldown between comment pages, to respect upstream rate limits.
    pub page_cooldown_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Stage {
    pub raw_dir: String,
    pub processed_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub stage: Stage,
    pub database: Database,
}

/// Bearer token plus business-account id, validated before any request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
    pub business_id: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Try to load from settings.toml (optional for deployment)
        let config_file_name = "settings.toml";

        // Check in current directory
        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Check in gramlens-etl directory (for development)
        let dev_path = PathBuf::from("gramlens-etl").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        builder = builder
            .set_default("api.base_url", "https://graph.facebook.com/v19.0")?
            .set_default("api.media_limit", 20)?
            .set_default("api.comment_page_size", 50)?
            .set_default("api.page_cooldown_ms", 200)?
            .set_default("stage.raw_dir", "data/raw")?
            .set_default("stage.processed_dir", "data/processed")?
            .set_default("database.path", "gramlens.db")?;

        // 2. Override with environment variables (highest priority)
        if let Ok(token) = std::env::var("IG_ACCESS_TOKEN") {
            builder = builder.set_override("api.access_token", token)?;
        }
        if let Ok(id) = std::env::var("IG_BUSINESS_ID") {
            builder = builder.set_override("api.business_id", id)?;
        }
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(raw_dir) = std::env::var("GRAMLENS_RAW_DIR") {
            builder = builder.set_override("stage.raw_dir", raw_dir)?;
        }
        if let Ok(processed_dir) = std::env::var("GRAMLENS_PROCESSED_DIR") {
            builder = builder.set_override("stage.processed_dir", processed_dir)?;
        }

        let s = builder.build()?;
        s.try_deserialize()
    }

    /// Pre-flight credential check. Names every missing variable so one
    /// run surfaces the full fix.
    pub fn credentials(&self) -> Result<Credentials, EtlError> {
        let mut missing = Vec::new();
        if self.api.access_token.as_deref().map_or(true, str::is_empty) {
            missing.push("IG_ACCESS_TOKEN");
        }
        if self.api.business_id.as_deref().map_or(true, str::is_empty) {
            missing.push("IG_BUSINESS_ID");
        }
        if !missing.is_empty() {
            return Err(EtlError::Configuration(format!(
                "missing {}",
                missing.join(" and ")
            )));
        }
        Ok(Credentials {
            access_token: self.api.access_token.clone().unwrap(),
            business_id: self.api.business_id.clone().unwrap(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(token: Option<&str>, id: Option<&str>) -> Settings {
        Settings {
            api: Api {
                base_url: "https://graph.example.com/v19.0".into(),
                access_token: token.map(String::from),
                business_id: id.map(String::from),
                media_limit: 20,
                comment_page_size: 50,
                page_cooldown_ms: 0,
            },
            stage: Stage {
                raw_dir: "data/raw".into(),
                processed_dir: "data/processed".into(),
            },
            database: Database {
                path: ":memory:".into(),
            },
        }
    }

    #[test]
    fn credentials_present() {
        let s = settings_with(Some("tok"), Some("12345"));
        let creds = s.credentials().expect("credentials should validate");
        assert_eq!(creds.access_token, "tok");
        assert_eq!(creds.business_id, "12345");
    }

    #[test]
    fn credentials_missing_both_named() {
        let s = settings_with(None, None);
        let err = s.credentials().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("IG_ACCESS_TOKEN"));
        assert!(msg.contains("IG_BUSINESS_ID"));
    }

    // The only test that touches process environment; the rest construct
    // Settings directly, so no cross-test serialization is needed.
    #[test]
    fn env_overrides_take_precedence_over_defaults() {
        std::env::set_var("IG_ACCESS_TOKEN", "env-token");
        std::env::set_var("DATABASE_PATH", "env-gramlens.db");
        std::env::set_var("GRAMLENS_RAW_DIR", "env/raw");

        let s = Settings::new().expect("settings should build from env");

        assert_eq!(s.api.access_token.as_deref(), Some("env-token"));
        assert_eq!(s.database.path, "env-gramlens.db");
        assert_eq!(s.stage.raw_dir, "env/raw");
        // Keys without an override keep their defaults.
        assert_eq!(s.api.base_url, "https://graph.facebook.com/v19.0");
        assert_eq!(s.api.media_limit, 20);
        assert_eq!(s.stage.processed_dir, "data/processed");

        std::env::remove_var("IG_ACCESS_TOKEN");
        std::env::remove_var("DATABASE_PATH");
        std::env::remove_var("GRAMLENS_RAW_DIR");
    }

    #[test]
    fn empty_token_counts_as_missing() {
        let s = settings_with(Some(""), Some("12345"));
        let err = s.credentials().unwrap_err();
        assert!(matches!(err, EtlError::Configuration(_)));
        assert!(err.to_string().contains("IG_ACCESS_TOKEN"));
    }
}
