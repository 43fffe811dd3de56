//! Application configuration, loaded from `~/.config/thai-tokenizer-sidecar/config.toml`
//! with `THAI_TOKENIZER_*` environment variable overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub tokenizer: TokenizerConfig,
    pub batch: BatchSettingsConfig,
    pub search_engine: SearchEngineConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            tokenizer: TokenizerConfig::default(),
            batch: BatchSettingsConfig::default(),
            search_engine: SearchEngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub default_engine: String,
    pub use_compounds: bool,
    pub compound_dictionary_path: Option<PathBuf>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            default_engine: "newmm".to_string(),
            use_compounds: true,
            compound_dictionary_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettingsConfig {
    pub max_concurrent: usize,
    pub batch_size: usize,
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_multiplier: f64,
}

impl Default for BatchSettingsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            batch_size: 50,
            retry_max_attempts: 3,
            retry_initial_delay_ms: 1000,
            retry_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchEngineConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SearchEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7700".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl AppConfig {
    /// Loads configuration from `~/.config/thai-tokenizer-sidecar/config.toml`,
    /// falling back to defaults if the file is missing or unparseable, then
    /// applies any `THAI_TOKENIZER_*` environment overrides on top.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %config_path.display(), "loaded config file");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %config_path.display(), error = %e, "failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::debug!(path = %config_path.display(), "no config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("THAI_TOKENIZER_BIND_ADDRESS") {
            self.http.bind_address = v;
        }
        if let Ok(v) = std::env::var("THAI_TOKENIZER_PORT") {
            if let Ok(port) = v.parse() {
                self.http.port = port;
            }
        }
        if let Ok(v) = std::env::var("THAI_TOKENIZER_DEFAULT_ENGINE") {
            self.tokenizer.default_engine = v;
        }
        if let Ok(v) = std::env::var("THAI_TOKENIZER_COMPOUND_DICTIONARY_PATH") {
            self.tokenizer.compound_dictionary_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("THAI_TOKENIZER_MAX_CONCURRENT") {
            if let Ok(n) = v.parse() {
                self.batch.max_concurrent = n;
            }
        }
        if let Ok(v) = std::env::var("THAI_TOKENIZER_BATCH_SIZE") {
            if let Ok(n) = v.parse() {
                self.batch.batch_size = n;
            }
        }
        if let Ok(v) = std::env::var("THAI_TOKENIZER_SEARCH_ENGINE_URL") {
            self.search_engine.base_url = v;
        }
        if let Ok(v) = std::env::var("THAI_TOKENIZER_SEARCH_ENGINE_API_KEY") {
            self.search_engine.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("THAI_TOKENIZER_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Saves configuration to `~/.config/thai-tokenizer-sidecar/config.toml`.
    pub fn save(&self) -> Result<(), String> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("failed to create config dir: {e}"))?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| format!("failed to serialize config: {e}"))?;
        std::fs::write(&config_path, contents).map_err(|e| format!("failed to write config: {e}"))?;
        tracing::info!(path = %config_path.display(), "saved config file");
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("thai-tokenizer-sidecar").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
