use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::FIGMA_API_BASE_URL;
use crate::internal::models::ReferenceSource;
use crate::internal::overlay::OverlayMode;
use crate::internal::ui::keybindings::Command;

pub const CONFIG_FILE_NAME: &str = "config.ron";
pub const APP_DIR_NAME: &str = "tui-figma-overlay";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub network: NetworkConfig,
    pub overlay: OverlayConfig,
    /// Per-context key overrides merged over the defaults.
    pub keybindings: Option<KeyBindingConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base filter level ("error", "warn", "info", "debug", "trace").
    pub level: String,
    /// Extra `module=level` directives appended to the base level.
    pub module_levels: HashMap<String, String>,
    /// Directory for the rolling log file. Defaults to "logs".
    pub log_directory: Option<String>,
    /// Emit debug-level timings for requests and frame composition.
    pub enable_performance_metrics: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            module_levels: HashMap::new(),
            log_directory: None,
            enable_performance_metrics: false,
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive string built from `level` and `module_levels`.
    pub fn filter_directives(&self) -> String {
        let mut modules: Vec<_> = self.module_levels.iter().collect();
        modules.sort();
        let mut filter_str = self.level.clone();
        for (module, level) in modules {
            filter_str.push_str(&format!(",{}={}", module, level));
        }
        filter_str
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub api_base_url: String,
    /// Header carrying the access token on design-service requests.
    pub token_header: String,
    /// Environment variable holding the access token.
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_base_url: FIGMA_API_BASE_URL.to_string(),
            token_header: "X-ACCESS-TOKEN".to_string(),
            token_env: "FIGMA_ACCESS_TOKEN".to_string(),
            timeout_secs: 30,
        }
    }
}

impl NetworkConfig {
    /// Read the access token from the configured environment variable.
    ///
    /// A missing token is not fatal: inline references never need one, and the
    /// service reports the failure for the others.
    pub fn access_token(&self) -> String {
        match std::env::var(&self.token_env) {
            Ok(token) => token,
            Err(_) => {
                tracing::warn!("{} is not set; design service requests are unauthenticated", self.token_env);
                String::new()
            }
        }
    }
}

/// Reference image as written in the config file or on the command line.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub enum ReferenceConfig {
    /// Design share link
    Url(String),
    /// Local image file
    File(String),
    /// File id and node id
    Node(String, String),
}

impl ReferenceConfig {
    /// Interpret a command-line argument: http(s) links, `node:<file>/<node>` pairs,
    /// anything else is a local file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            return Self::Url(arg.to_string());
        }
        if let Some(pair) = arg.strip_prefix("node:")
            && let Some((file_id, node_id)) = pair.split_once('/')
        {
            return Self::Node(file_id.to_string(), node_id.to_string());
        }
        Self::File(arg.to_string())
    }

    /// Build the overlay source. Local files are decoded here so the overlay sees an
    /// inline image.
    pub fn to_source(&self) -> Result<ReferenceSource> {
        match self {
            Self::Url(url) => Ok(ReferenceSource::RemoteUrl(url.clone())),
            Self::Node(file_id, node_id) => Ok(ReferenceSource::node(file_id, node_id)),
            Self::File(path) => {
                let img = image::open(path)
                    .with_context(|| format!("failed to open reference image {}", path))?;
                Ok(ReferenceSource::inline(img.to_rgba8()))
            }
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct OverlayConfig {
    pub initial_mode: OverlayMode,
    pub reference: Option<ReferenceConfig>,
    /// Screenshot of the view under test. A generated gradient is used when unset.
    pub live_image: Option<String>,
    /// Opacity change per slider key press.
    pub opacity_step: f32,
    /// Split movement per keyboard nudge, in frame pixels.
    pub nudge_step: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            initial_mode: OverlayMode::Hidden,
            reference: None,
            live_image: None,
            opacity_step: 0.05,
            nudge_step: 8.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct KeyBindingConfig {
    pub global: HashMap<String, Command>,
    pub layered: HashMap<String, Command>,
    pub compare: HashMap<String, Command>,
}

impl AppConfig {
    pub fn load() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::error!("{:#}", e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        ron::from_str::<AppConfig>(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Current directory, next to the executable, then the user config directory.
    fn candidate_paths() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join(CONFIG_FILE_NAME));
        }

        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
        }

        candidates
    }
}
