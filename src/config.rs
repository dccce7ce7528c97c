use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration for the rskeb mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Mirror repository id (`namespace/name` on the Hub)
    pub repository: String,
    /// Hub endpoint base URL
    pub endpoint: String,
    /// Hub access token; anonymous reads work without one
    pub token: Option<String>,
    /// Base URL of the site being mirrored
    pub site_url: String,
    /// Minimum seconds between processed posts
    pub timespan_secs: f64,
    /// Per-run cap on newly processed posts
    pub max_items: usize,
    /// Wall-clock budget per run in minutes
    pub max_runtime_minutes: u64,
    /// Directory for daily-rotated log files, when set
    pub log_dir: Option<PathBuf>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub timespan_secs: Option<f64>,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub max_runtime_minutes: Option<u64>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Command line / environment overrides for the configuration
#[derive(Args, Debug, Default)]
pub struct CliArgs {
    /// Mirror repository id
    #[clap(long, env = "RSKEB_REPOSITORY", global = true)]
    pub repository: Option<String>,

    /// Hub endpoint base URL
    #[clap(long, env = "RSKEB_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Hub access token
    #[clap(long, env = "HF_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Site base URL
    #[clap(long, env = "RSKEB_SITE_URL", global = true)]
    pub site_url: Option<String>,

    /// Minimum seconds between processed posts
    #[clap(long, env = "RSKEB_TIMESPAN_SECS", global = true)]
    pub timespan_secs: Option<f64>,

    /// Per-run cap on newly processed posts
    #[clap(long, env = "RSKEB_MAX_ITEMS", global = true)]
    pub max_items: Option<usize>,

    /// Wall-clock budget per run in minutes
    #[clap(long, env = "RSKEB_MAX_RUNTIME_MINUTES", global = true)]
    pub max_runtime_minutes: Option<u64>,

    /// Directory for daily-rotated log files
    #[clap(long, env = "RSKEB_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            repository: update.repository.unwrap_or(self.repository),
            endpoint: update.endpoint.unwrap_or(self.endpoint),
            token: update.token.or(self.token),
            site_url: update.site_url.unwrap_or(self.site_url),
            timespan_secs: update.timespan_secs.unwrap_or(self.timespan_secs),
            max_items: update.max_items.unwrap_or(self.max_items),
            max_runtime_minutes: update.max_runtime_minutes.unwrap_or(self.max_runtime_minutes),
            log_dir: update.log_dir.or(self.log_dir),
        }
    }

    /// Returns the post pacing interval as a Duration
    pub fn timespan(&self) -> Duration {
        Duration::from_secs_f64(self.timespan_secs)
    }

    /// Returns the run budget as a Duration
    pub fn max_runtime(&self) -> Duration {
        Duration::from_secs(self.max_runtime_minutes * 60)
    }
}

/// Returns the base (default) configuration
pub fn base_config() -> Config {
    Config {
        repository: String::new(),
        endpoint: "https://huggingface.co".to_string(),
        token: None,
        site_url: "https://skeb.jp".to_string(),
        timespan_secs: 2.5,
        max_items: 500,
        max_runtime_minutes: 50,
        log_dir: None,
    }
}

/// Returns the XDG config directory for rskeb, if it exists
pub fn get_config_dir_path() -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "rskeb", "rskeb")?;
    let path = proj_dirs.config_dir().to_path_buf();
    if path.exists() { Some(path) } else { None }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        repository: args.repository,
        endpoint: args.endpoint,
        token: args.token,
        site_url: args.site_url,
        timespan_secs: args.timespan_secs,
        max_items: args.max_items,
        max_runtime_minutes: args.max_runtime_minutes,
        log_dir: args.log_dir,
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: CliArgs) -> Config {
    let config_path = get_config_dir_path().map(|dir| dir.join("config.toml"));

    let config = base_config()
        .apply_update(config_from_file(config_path).unwrap_or_default())
        .apply_update(config_from_args(args));

    info!(
        "Final configuration: repository={:?}, endpoint={}, site_url={}, timespan={}s, max_items={}",
        config.repository, config.endpoint, config.site_url, config.timespan_secs, config.max_items
    );

    config
}
