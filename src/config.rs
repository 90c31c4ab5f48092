use crate::error::{Error, Result};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names tried in order inside the project root.
pub const CONFIG_FILE_NAMES: [&str; 2] = [".openapi-from-go.yaml", "openapi-from-go.yaml"];

/// Directory conventions and document defaults for the generator.
///
/// Every key is optional in the file; missing keys keep the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory holding one subdirectory per microservice
    pub microservice_dir: String,
    /// Name prefix identifying microservice directories
    pub microservice_prefix: String,
    /// Root of the domain packages that contain business layers
    pub domain_dir: String,
    /// Name suffix identifying business-layer directories
    pub business_layer_suffix: String,
    /// Root of the model packages used for schema resolution
    pub models_dir: String,
    pub openapi_title: String,
    pub openapi_servers: Vec<String>,
    pub oauth_authorize: String,
    pub oauth_token: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            microservice_dir: "internal/ms".to_string(),
            microservice_prefix: "ms_".to_string(),
            domain_dir: "internal/domain".to_string(),
            business_layer_suffix: "_business_layer".to_string(),
            models_dir: "pkg/models".to_string(),
            openapi_title: "API".to_string(),
            openapi_servers: Vec::new(),
            oauth_authorize: String::new(),
            oauth_token: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    generate: Option<GeneratorConfig>,
}

impl GeneratorConfig {
    /// Loads the configuration for the project at `root`.
    ///
    /// The first existing file among [`CONFIG_FILE_NAMES`] is read and its `generate:` section
    /// deserialized. Without a config file the defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or is not valid YAML.
    pub fn load(root: &Path) -> Result<Self> {
        for name in CONFIG_FILE_NAMES {
            let path = root.join(name);
            if path.is_file() {
                return Self::load_file(&path);
            }
        }
        debug!("No config file in {}, using defaults", root.display());
        Ok(Self::default())
    }

    /// Loads the `generate:` section of one config file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file: Option<ConfigFile> =
            serde_yaml::from_str(&content).map_err(|e| Error::ConfigError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!("Loaded config from {}", path.display());
        Ok(file.and_then(|f| f.generate).unwrap_or_default())
    }

    pub fn microservice_root(&self, root: &Path) -> PathBuf {
        root.join(&self.microservice_dir)
    }

    pub fn domain_root(&self, root: &Path) -> PathBuf {
        root.join(&self.domain_dir)
    }

    pub fn models_root(&self, root: &Path) -> PathBuf {
        root.join(&self.models_dir)
    }
}
