use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the Spy Cat Agency service
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpyCatConfig {
    /// HTTP listener
    pub server: ServerConfig,
    /// Relational store
    pub database: DatabaseConfig,
    /// External breed catalog
    pub breeds: BreedsConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite URL or file path
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Run pending migrations on startup
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BreedsConfig {
    /// Endpoint returning a JSON array of `{ "name": ... }` records
    pub api_url: String,
    pub timeout_seconds: u64,
    /// How long a fetched breed list stays valid
    pub cache_ttl_hours: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Default filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of human readable output
    pub json_logs: bool,
}

impl Default for SpyCatConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 6000,
            },
            database: DatabaseConfig {
                url: "sqlite://spy-cat.db".to_string(),
                max_connections: 5,
                auto_migrate: true,
            },
            breeds: BreedsConfig {
                api_url: "https://api.thecatapi.com/v1/breeds".to_string(),
                timeout_seconds: 10,
                cache_ttl_hours: 24,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: true,
            },
        }
    }
}

impl SpyCatConfig {
    /// Load configuration from the working directory. Precedence, lowest first:
    /// 1. Default values
    /// 2. Configuration files (spy-cat.toml, .spy-cat-rc)
    /// 3. Environment variables (prefixed with SPY_CAT_, nested with `__`)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let toml_file = dir.join("spy-cat.toml");
        if toml_file.exists() {
            builder = builder.add_source(File::from(toml_file));
        }

        let rc_file = dir.join(".spy-cat-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("SPY_CAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
