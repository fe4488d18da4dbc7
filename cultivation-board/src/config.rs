//! Layered configuration using figment.
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. Global file `~/.config/cultivation-board/config.{toml,yaml,yml,json}`
//! 3. Project file `./.cultivation-board.{toml,yaml,yml,json}`
//! 4. Environment variables prefixed `CULTIVATION_BOARD_`

use crate::api::{DEFAULT_API_BASE_URL, DEFAULT_TENANT_HEADER};
use crate::drag::DEFAULT_ACTIVATION_DISTANCE;
use crate::error::Result;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CULTIVATION_BOARD_";

/// Base name of the project-level config file
pub const PROJECT_FILE_STEM: &str = ".cultivation-board";

/// Connection and interaction settings for the board engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Root of the REST API, without a trailing slash
    pub api_base_url: String,
    /// Bearer token obtained by the enclosing application's login flow
    pub auth_token: Option<String>,
    /// Name of the tenant scope header
    pub tenant_header: String,
    /// Transport-level timeout; `None` leaves it to the HTTP client
    pub request_timeout_secs: Option<u64>,
    /// Pointer travel in px before a press becomes a drag
    pub drag_activation_distance: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
            tenant_header: DEFAULT_TENANT_HEADER.to_string(),
            request_timeout_secs: None,
            drag_activation_distance: DEFAULT_ACTIVATION_DISTANCE,
        }
    }
}

impl BoardConfig {
    /// Load from all standard sources relative to the current directory
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from(&cwd)
    }

    /// Load using `project_dir` for the project-level file
    pub fn load_from(project_dir: &Path) -> Result<Self> {
        let config: Self = Self::figment(project_dir).extract()?;
        tracing::debug!(api = %config.api_base_url, "loaded board configuration");
        Ok(config)
    }

    /// The merged figment, exposed so callers can layer CLI overrides on top
    pub fn figment(project_dir: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(dir) = dirs::config_dir() {
            figment = merge_files(figment, &dir.join("cultivation-board"), "config");
        }
        figment = merge_files(figment, project_dir, PROJECT_FILE_STEM);

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

fn merge_files(mut figment: Figment, dir: &Path, stem: &str) -> Figment {
    for ext in ["toml", "yaml", "yml", "json"] {
        let path = dir.join(format!("{stem}.{ext}"));
        if !path.is_file() {
            continue;
        }
        tracing::trace!(path = %path.display(), "merging config file");
        figment = match ext {
            "toml" => figment.merge(Toml::file(&path)),
            "json" => figment.merge(Json::file(&path)),
            _ => figment.merge(Yaml::file(&path)),
        };
    }
    figment
}
