//! # Trendlio Configuration Module
//!
//! This module provides configuration management for the Trendlio client, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Deployment environment selection (development / staging / production)
//! - Type-safe getters and setters for configuration values
//!
//! ## Usage
//!
//! ```no_run
//! use trendconfig::get_config;
//!
//! let config = get_config();
//!
//! let endpoints = config.get_endpoints();
//! println!("API root: {}", endpoints.api_url);
//!
//! config.set_login_max_attempts(5)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tracing::{info, warn};

pub mod encryption;
pub mod environment;

pub use environment::{Endpoints, Environment, ENV_DEPLOYMENT};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("trendlio.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load Trendlio configuration"));
}

const ENV_CONFIG_DIR: &str = "TRENDLIO_CONFIG";
const ENV_PREFIX: &str = "TRENDLIO_CONFIG__";
const CONFIG_DIR_NAME: &str = ".trendlio";

// Default values for configuration
const DEFAULT_API_TIMEOUT_MS: usize = 10_000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_LOGIN_MAX_ATTEMPTS: usize = 3;
const DEFAULT_LOGIN_RETRY_DELAY_MS: usize = 1000;
const DEFAULT_MIN_VISIBLE_PERCENT: usize = 50;
const DEFAULT_MIN_VIEW_TIME_MS: usize = 300;
const DEFAULT_VIEWPORT_WIDTH: usize = 390;
const DEFAULT_VIEWPORT_HEIGHT: usize = 844;
const DEFAULT_ENCRYPT_TOKENS: bool = true;

/// Macro to generate getter/setter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> usize {
            match self.get_value($path) {
                Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap_or_default() as usize,
                Ok(Value::String(s)) => s.trim().parse().unwrap_or($default),
                _ => $default,
            }
        }

        pub fn $setter(&self, value: usize) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value)))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for the Trendlio client
///
/// Values live in a YAML tree guarded by a mutex. Every setter writes the
/// whole tree back to `config.yaml`.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        CONFIG_DIR_NAME.to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `TRENDLIO_CONFIG` environment variable
    /// 3. `.trendlio` in the current directory
    /// 4. `.trendlio` in the user's home directory
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// The embedded defaults are merged with `config.yaml` when present, then
    /// `TRENDLIO_CONFIG__*` environment overrides are applied and the merged
    /// tree is saved back.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file = %path, "Loaded config file");
            data
        } else {
            info!(config_file = %path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        // Un fichier vide se parse en Null : on garde alors les défauts
        let external_value: Value = serde_yaml::from_slice(&yaml_data)?;
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = Self::lower_keys_value(default_value);

        Self::apply_env_overrides(&mut config_value, env::vars());

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    fn lock_data(&self) -> Result<MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))
    }

    /// Directory holding `config.yaml`
    pub fn directory(&self) -> &str {
        &self.config_dir
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let data = self.lock_data()?;
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["session", "token"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.lock_data()?;
            Self::set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if data.is_null() {
            *data = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock_data()?;
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                match map.get(&Value::String(key.to_lowercase())) {
                    Some(next) => current = next,
                    None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    /// Reads a non-empty string at `path`
    pub fn get_string(&self, path: &[&str]) -> Option<String> {
        match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    fn apply_env_overrides<I>(config: &mut Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                if let Err(err) = Self::set_value_internal(config, &key_path, yaml_value) {
                    warn!(variable = %key, "Ignoring configuration override: {}", err);
                }
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    let new_key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    new_map.insert(new_key, Self::lower_keys_value(v));
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    // ============ Environnement de déploiement ============

    /// Returns the deployment environment
    ///
    /// `TRENDLIO_ENV` wins over `host.environment`. Unknown names resolve to
    /// development.
    pub fn get_environment(&self) -> Environment {
        if let Ok(name) = env::var(ENV_DEPLOYMENT) {
            return Environment::parse(&name);
        }
        self.get_string(&["host", "environment"])
            .map(|name| Environment::parse(&name))
            .unwrap_or_default()
    }

    /// Sets the deployment environment in configuration
    pub fn set_environment(&self, environment: Environment) -> Result<()> {
        self.set_value(
            &["host", "environment"],
            Value::String(environment.config_key().to_string()),
        )
    }

    /// Returns the endpoints of the current deployment environment
    pub fn get_endpoints(&self) -> Endpoints {
        self.get_endpoints_for(self.get_environment())
    }

    /// Returns the endpoints of a given environment, applying configured overrides
    pub fn get_endpoints_for(&self, environment: Environment) -> Endpoints {
        let defaults = environment.default_endpoints();
        let key = environment.config_key();

        let api_url = self
            .get_string(&["environments", key, "api_url"])
            .unwrap_or(defaults.api_url);
        let socket_url = self
            .get_string(&["environments", key, "socket_url"])
            .unwrap_or(defaults.socket_url);

        Endpoints {
            api_url: api_url.trim_end_matches('/').to_string(),
            socket_url,
        }
    }

    /// Overrides the API root of an environment
    pub fn set_api_url(&self, environment: Environment, url: &str) -> Result<()> {
        self.set_value(
            &["environments", environment.config_key(), "api_url"],
            Value::String(url.to_string()),
        )
    }

    // ============ HTTP ============

    impl_usize_config!(
        get_api_timeout_ms,
        set_api_timeout_ms,
        &["host", "http", "timeout_ms"],
        DEFAULT_API_TIMEOUT_MS
    );

    /// Request timeout applied by the session client
    pub fn get_api_timeout(&self) -> Duration {
        Duration::from_millis(self.get_api_timeout_ms() as u64)
    }

    // ============ Session ============

    impl_usize_config!(
        get_login_max_attempts,
        set_login_max_attempts,
        &["session", "login", "max_attempts"],
        DEFAULT_LOGIN_MAX_ATTEMPTS
    );

    impl_usize_config!(
        get_login_retry_delay_ms,
        set_login_retry_delay_ms,
        &["session", "login", "retry_delay_ms"],
        DEFAULT_LOGIN_RETRY_DELAY_MS
    );

    impl_bool_config!(
        get_encrypt_tokens,
        set_encrypt_tokens,
        &["session", "encrypt_tokens"],
        DEFAULT_ENCRYPT_TOKENS
    );

    // ============ Playback ============

    impl_usize_config!(
        get_min_visible_percent,
        set_min_visible_percent,
        &["playback", "viewability", "min_visible_percent"],
        DEFAULT_MIN_VISIBLE_PERCENT
    );

    impl_usize_config!(
        get_min_view_time_ms,
        set_min_view_time_ms,
        &["playback", "viewability", "min_view_time_ms"],
        DEFAULT_MIN_VIEW_TIME_MS
    );

    impl_usize_config!(
        get_viewport_width,
        set_viewport_width,
        &["playback", "viewport", "width"],
        DEFAULT_VIEWPORT_WIDTH
    );

    impl_usize_config!(
        get_viewport_height,
        set_viewport_height,
        &["playback", "viewport", "height"],
        DEFAULT_VIEWPORT_HEIGHT
    );

    // ============ Logger ============

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> String {
        self.get_string(&["host", "logger", "min_level"])
            .unwrap_or_else(|| DEFAULT_LOG_MIN_LEVEL.to_string())
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: &str) -> Result<()> {
        self.set_value(
            &["host", "logger", "min_level"],
            Value::String(level.to_string()),
        )
    }
}

/// Returns the global configuration instance
///
/// The configuration is the only process-wide singleton of the client; it is
/// lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key. Scalars and sequences from `external`
/// replace the default. A null external document leaves the defaults as is.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (_, Value::Null) => {}
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
