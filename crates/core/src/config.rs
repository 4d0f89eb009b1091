use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::{parse_columns, SizeUnit, DEFAULT_COLUMNS};

/// Registry host whose manifests are scanned under `<models-root>/manifests/`.
pub const REGISTRY_HOST: &str = "registry.ollama.ai";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model cache settings
    #[serde(default)]
    pub models: ModelsConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Ollama models directory (default: ~/.ollama/models)
    #[serde(default = "default_models_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Unit used for the human-readable size column
    #[serde(default)]
    pub size_unit: SizeUnit,

    /// Highlight orphans when writing to a terminal
    #[serde(default = "default_color")]
    pub color: bool,

    /// Comma-separated column list
    #[serde(default = "default_columns")]
    pub columns: String,
}

fn default_models_root() -> PathBuf {
    PathBuf::from("~/.ollama/models")
}

fn default_color() -> bool {
    true
}

fn default_columns() -> String {
    DEFAULT_COLUMNS.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            root: default_models_root(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            size_unit: SizeUnit::default(),
            color: default_color(),
            columns: default_columns(),
        }
    }
}

impl Config {
    /// Get the base directory: ~/.config/ollama-inspect/
    pub fn base_dir() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".config").join("ollama-inspect"))
    }

    /// Get the config file path: ~/.config/ollama-inspect/config.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Read a dotted key such as `output.size_unit`.
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "models.root" => Ok(self.models.root.display().to_string()),
            "output.size_unit" => Ok(self.output.size_unit.as_str().to_string()),
            "output.color" => Ok(self.output.color.to_string()),
            "output.columns" => Ok(self.output.columns.clone()),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
    }

    /// Set a dotted key, validating the value before it is stored.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "models.root" => {
                self.models.root = if value.is_empty() {
                    default_models_root()
                } else {
                    value.into()
                }
            }
            "output.size_unit" => self.output.size_unit = value.parse()?,
            "output.color" => self.output.color = value.parse()?,
            "output.columns" => {
                parse_columns(value)?;
                self.output.columns = value.to_string();
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }
}

/// Filesystem locations derived from a models root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub root: PathBuf,
    pub manifests: PathBuf,
    pub blobs: PathBuf,
}

impl ModelPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = expand_home(root.as_ref());
        Self {
            manifests: root.join("manifests").join(REGISTRY_HOST),
            blobs: root.join("blobs"),
            root,
        }
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.models.root, PathBuf::from("~/.ollama/models"));
        assert_eq!(config.output.size_unit, SizeUnit::Mb);
        assert!(config.output.color);
        assert_eq!(config.output.columns, "blob,models,size,is_orphan");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[output]\nsize_unit = \"gb\"\n").unwrap();
        assert_eq!(config.output.size_unit, SizeUnit::Gb);
        assert!(config.output.color);
        assert_eq!(config.models.root, PathBuf::from("~/.ollama/models"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("models.root", "/srv/ollama").unwrap();
        config.set("output.color", "false").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.models.root, PathBuf::from("/srv/ollama"));
        assert!(!loaded.output.color);
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config.output.columns, DEFAULT_COLUMNS);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("output.size_unit", "tb").is_err());
        assert!(config.set("output.columns", "blob,bogus").is_err());
        assert!(config.set("output.color", "maybe").is_err());
        assert!(config.set("daemon.port", "1").is_err());
        assert_eq!(config.output.columns, DEFAULT_COLUMNS);
    }

    #[test]
    fn test_get_round_trips_set() {
        let mut config = Config::default();
        config.set("output.size_unit", "GB").unwrap();
        assert_eq!(config.get("output.size_unit").unwrap(), "gb");
        config.set("output.columns", "blob,size_bytes").unwrap();
        assert_eq!(config.get("output.columns").unwrap(), "blob,size_bytes");
    }

    #[test]
    fn test_model_paths_layout() {
        let paths = ModelPaths::new("/data/models");
        assert_eq!(
            paths.manifests,
            PathBuf::from("/data/models/manifests/registry.ollama.ai")
        );
        assert_eq!(paths.blobs, PathBuf::from("/data/models/blobs"));
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home(Path::new("~/.ollama/models")),
                home.join(".ollama/models")
            );
        }
    }
}
