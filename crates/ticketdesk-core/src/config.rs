use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ErrorCode;
use crate::store::Latency;

pub const CONFIG_FILE: &str = "config.toml";
pub const HOME_ENV: &str = "TICKETDESK_HOME";
pub const LATENCY_ENV: &str = "TICKETDESK_LATENCY_MS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{LATENCY_ENV} must be a whole number of milliseconds, got {0:?}")]
    InvalidLatency(String),

    #[error("no data directory: pass --data-dir or set {HOME_ENV}")]
    NoDataDir,
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ConfigParseError
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub latency: LatencyConfig,
    #[serde(default)]
    pub tickets: TicketsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyConfig {
    #[serde(default = "default_list_ms")]
    pub list_ms: u64,
    #[serde(default = "default_write_ms")]
    pub create_ms: u64,
    #[serde(default = "default_write_ms")]
    pub update_ms: u64,
    #[serde(default = "default_delete_ms")]
    pub delete_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            list_ms: default_list_ms(),
            create_ms: default_write_ms(),
            update_ms: default_write_ms(),
            delete_ms: default_delete_ms(),
        }
    }
}

impl LatencyConfig {
    #[must_use]
    pub const fn to_latency(&self) -> Latency {
        Latency {
            list: Duration::from_millis(self.list_ms),
            create: Duration::from_millis(self.create_ms),
            update: Duration::from_millis(self.update_ms),
            delete: Duration::from_millis(self.delete_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketsConfig {
    #[serde(default = "default_true")]
    pub seed_demo: bool,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            seed_demo: default_true(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub data_dir: PathBuf,
    pub app: AppConfig,
    pub latency: Latency,
}

/// Load `<data_dir>/config.toml`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_config(data_dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    toml::from_str::<AppConfig>(&content).map_err(|source| ConfigError::Parse { path, source })
}

/// Resolve the data directory, load its config, and apply env overrides.
///
/// # Errors
///
/// Returns [`ConfigError`] for an unreadable config, a malformed latency
/// override, or when no data directory can be determined.
pub fn resolve_config(data_dir_flag: Option<&Path>) -> Result<EffectiveConfig, ConfigError> {
    let data_dir = resolve_data_dir(
        data_dir_flag,
        env::var(HOME_ENV).ok(),
        dirs::data_dir(),
    )?;
    let app = load_config(&data_dir)?;
    let latency = match latency_override(env::var(LATENCY_ENV).ok().as_deref())? {
        Some(delay) => Latency::uniform(delay),
        None => app.latency.to_latency(),
    };

    Ok(EffectiveConfig {
        data_dir,
        app,
        latency,
    })
}

fn resolve_data_dir(
    flag: Option<&Path>,
    env_home: Option<String>,
    platform_data_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }

    if let Some(home) = env_home.filter(|h| !h.trim().is_empty()) {
        return Ok(PathBuf::from(home));
    }

    platform_data_dir
        .map(|dir| dir.join("ticketdesk"))
        .ok_or(ConfigError::NoDataDir)
}

fn latency_override(raw: Option<&str>) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|_| ConfigError::InvalidLatency(raw.to_string()))
}

const fn default_true() -> bool {
    true
}

const fn default_list_ms() -> u64 {
    500
}

const fn default_write_ms() -> u64 {
    400
}

const fn default_delete_ms() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config(dir.path()).expect("load should succeed");
        assert!(cfg.output.is_none());
        assert!(cfg.tickets.seed_demo);
        assert_eq!(cfg.latency.to_latency(), Latency::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "output = \"json\"\n\n[latency]\nlist_ms = 0\n",
        )
        .unwrap();

        let cfg = load_config(dir.path()).expect("load should succeed");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.latency.list_ms, 0);
        assert_eq!(cfg.latency.create_ms, 400);
        assert_eq!(cfg.latency.delete_ms, 300);
        assert!(cfg.tickets.seed_demo);
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[latency\nlist_ms = ").unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.code(), ErrorCode::ConfigParseError);
    }

    #[test]
    fn data_dir_flag_wins_over_env_and_platform() {
        let dir = resolve_data_dir(
            Some(Path::new("/flag")),
            Some("/env".to_string()),
            Some(PathBuf::from("/platform")),
        )
        .unwrap();
        assert_eq!(dir, PathBuf::from("/flag"));
    }

    #[test]
    fn env_home_wins_over_platform() {
        let dir = resolve_data_dir(None, Some("/env".to_string()), Some(PathBuf::from("/p")))
            .unwrap();
        assert_eq!(dir, PathBuf::from("/env"));
    }

    #[test]
    fn platform_dir_gets_app_subdirectory() {
        let dir = resolve_data_dir(None, Some("  ".to_string()), Some(PathBuf::from("/p")))
            .unwrap();
        assert_eq!(dir, PathBuf::from("/p/ticketdesk"));
    }

    #[test]
    fn no_candidates_is_an_error() {
        assert!(matches!(
            resolve_data_dir(None, None, None),
            Err(ConfigError::NoDataDir)
        ));
    }

    #[test]
    fn latency_override_parses_millis() {
        assert_eq!(latency_override(None).unwrap(), None);
        assert_eq!(latency_override(Some("")).unwrap(), None);
        assert_eq!(
            latency_override(Some(" 0 ")).unwrap(),
            Some(Duration::ZERO)
        );
        assert!(matches!(
            latency_override(Some("fast")),
            Err(ConfigError::InvalidLatency(_))
        ));
    }
}
