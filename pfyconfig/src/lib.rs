//! # Pottify Configuration Module
//!
//! This module provides configuration management for the Pottify backend,
//! including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Type-safe getters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use pfyconfig::get_config;
//!
//! // Get the global configuration
//! let config = get_config();
//!
//! // Access configuration values
//! let port = config.get_http_port();
//! let bucket = config.get_bucket_name();
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::Value;
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pottify.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load Pottify configuration"));
}

const ENV_CONFIG_DIR: &str = "POTTIFY_CONFIG";

// Default values for configuration
const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_BUCKET_NAME: &str = "music-files";

/// Returns the global configuration singleton
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Configuration manager for the Pottify backend
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with the default embedded configuration
/// - Providing typed getters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(".pottify").exists() {
            return ".pottify".to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(".pottify");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        ".pottify".to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        // Create if doesn't exist
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        // Verify it's a directory
        if !path.is_dir() {
            return Err(anyhow!("Le chemin spécifié n'est pas un répertoire"));
        }

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `POTTIFY_CONFIG` environment variable
    /// 3. `.pottify` in the current directory
    /// 4. `.pottify` in the user's home directory
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or empty to use defaults
    pub fn load_config(directory: &str) -> Result<Self> {
        // Obtenir le répertoire de configuration
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        // Construire le chemin du fichier config.yaml
        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        // Charger la configuration par défaut
        let mut config_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        // Merger avec le fichier de configuration s'il existe
        if let Ok(data) = fs::read(&path) {
            info!(config_file = %path, "Loaded config file");
            let external_value: Value = serde_yaml::from_slice(&data)?;
            merge_yaml(&mut config_value, &external_value);
        } else {
            info!(config_file = %path, "Config file not found, using default embedded config");
        }

        Ok(Self {
            config_dir,
            data: Mutex::new(config_value),
        })
    }

    /// Retrieves a value by its dotted path (ex: `"server.port"`)
    pub fn get_value(&self, path: &str) -> Result<Value> {
        let data = self.data.lock().unwrap();
        let mut current = &*data;

        for key in path.split('.') {
            current = current
                .get(key)
                .ok_or_else(|| anyhow!("Configuration key not found: {}", path))?;
        }

        Ok(current.clone())
    }

    fn get_string(&self, path: &str) -> Result<String> {
        match self.get_value(path)? {
            Value::String(s) => Ok(s),
            other => Err(anyhow!(
                "Configuration key '{}' is not a string (found {:?})",
                path,
                other
            )),
        }
    }

    /// Returns the configuration directory in use
    pub fn get_config_dir(&self) -> &str {
        &self.config_dir
    }

    /// HTTP port of the backend server
    pub fn get_http_port(&self) -> u16 {
        match self.get_value("server.port") {
            Ok(Value::Number(n)) => n.as_u64().map(|p| p as u16).unwrap_or(DEFAULT_HTTP_PORT),
            _ => DEFAULT_HTTP_PORT,
        }
    }

    /// Public base URL of the backend server
    pub fn get_base_url(&self) -> String {
        self.get_string("server.base_url")
            .unwrap_or_else(|_| format!("http://localhost:{}", self.get_http_port()))
    }

    /// Base URL of the track catalog API (metadata + audio streams)
    pub fn get_source_api_url(&self) -> Result<String> {
        self.get_string("source.api_url")
    }

    /// Base URL of the object storage backend
    pub fn get_storage_url(&self) -> Result<String> {
        self.get_string("storage.url")
    }

    /// Service key used to authenticate uploads to the storage backend
    pub fn get_storage_key(&self) -> Result<String> {
        self.get_string("storage.service_key")
    }

    /// Name of the storage bucket holding resolved audio files
    pub fn get_bucket_name(&self) -> String {
        self.get_string("storage.bucket")
            .unwrap_or_else(|_| DEFAULT_BUCKET_NAME.to_string())
    }

    /// Directory holding in-flight staged files
    ///
    /// Empty in the configuration means `{config_dir}/staging`.
    pub fn get_staging_dir(&self) -> PathBuf {
        match self.get_string("cache.staging_dir") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => Path::new(&self.config_dir).join("staging"),
        }
    }

    /// Path of the SQLite database holding resolved track records
    ///
    /// Empty in the configuration means `{config_dir}/pottify.db`.
    pub fn get_database_path(&self) -> PathBuf {
        match self.get_string("cache.database") {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => Path::new(&self.config_dir).join("pottify.db"),
        }
    }
}

/// Merges two YAML values recursively
///
/// Les mappings sont fusionnés clé par clé, toute autre valeur du fichier
/// externe remplace la valeur par défaut.
fn merge_yaml(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => merge_yaml(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}
