use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Contact-list endpoint used when the config file does not override it.
pub const DEFAULT_API_BASE_URL: &str = "https://api.textwo.app/api/users";

/// Presence/messaging WebSocket origin used when the config file does not
/// override it.
pub const DEFAULT_PRESENCE_URL: &str = "wss://api.textwo.app";

/// Terminal width (in columns) at which the shell switches to the wide
/// layout, unless overridden in the config file.
pub const DEFAULT_WIDE_MIN_WIDTH: u16 = 100;

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        /// Path to the configuration file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        /// Path to the configuration file with invalid TOML.
        path: PathBuf,
        /// The TOML deserialization error.
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Base URL of the contact-list provider. The current user's id is
    /// appended as the final path segment.
    pub api_base_url: Option<String>,
    /// Origin of the presence/messaging WebSocket endpoint.
    pub presence_url: Option<String>,
    /// Minimum terminal width (columns) for the wide layout.
    pub wide_min_width: Option<u16>,
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        Self::load_from_path(&Self::config_path())
    }

    pub fn load_from_path(config_path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                path: config_path.clone(),
                source,
            })?;
            let config: Config =
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: config_path.clone(),
                    source,
                })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to_path(&Self::config_path())
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(config_path)
            .map_err(|err| -> Box<dyn std::error::Error> { Box::new(err) })?;
        Ok(())
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn presence_url(&self) -> &str {
        self.presence_url.as_deref().unwrap_or(DEFAULT_PRESENCE_URL)
    }

    pub fn wide_min_width(&self) -> u16 {
        self.wide_min_width.unwrap_or(DEFAULT_WIDE_MIN_WIDTH)
    }

    pub(crate) fn config_path() -> PathBuf {
        let proj_dirs =
            ProjectDirs::from("app", "textwo", "textwo").expect("Failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.presence_url(), DEFAULT_PRESENCE_URL);
        assert_eq!(config.wide_min_width(), DEFAULT_WIDE_MIN_WIDTH);
    }

    #[test]
    fn round_trips_overrides_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            api_base_url: Some("https://chat.example.com/users".to_string()),
            presence_url: Some("wss://chat.example.com".to_string()),
            wide_min_width: Some(120),
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.api_base_url(), "https://chat.example.com/users");
        assert_eq!(loaded.presence_url(), "wss://chat.example.com");
        assert_eq!(loaded.wide_min_width(), 120);
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_base_url = [not toml").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().expect("ConfigError");
        assert!(matches!(config_err, ConfigError::Parse { .. }));
    }
}
