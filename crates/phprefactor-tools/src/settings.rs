//! Settings snapshot consumed by the tool manager.
//!
//! Loads settings from:
//! 1. Global: ~/.config/phprefactor/config.toml
//! 2. Per-project: .phprefactor/config.toml (overrides global)
//!
//! Example config.toml:
//! ```toml
//! paths = ["__DIR__"]
//! skip = ["vendor"]
//! phpVersion = "8.2"
//! autoloadFile = "vendor/autoload.php"
//! notifyOnResult = true
//! openDiffAfterRun = false
//! runOnSave = false
//!
//! [rector]
//! executablePath = "vendor/bin/rector"
//! priority = 30
//!
//! [phpcsfixer]
//! configPath = "tools/php-cs-fixer.php"
//!
//! [phpstan]
//! enabled = false
//! laravel = true
//! ```

use crate::ToolError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// PHP language level used when generating Rector's config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PhpVersion {
    #[serde(rename = "7.2")]
    Php72,
    #[serde(rename = "7.3")]
    Php73,
    #[serde(rename = "7.4")]
    Php74,
    #[serde(rename = "8.0")]
    Php80,
    #[serde(rename = "8.1")]
    Php81,
    #[serde(rename = "8.2")]
    Php82,
    #[serde(rename = "8.3")]
    Php83,
}

impl PhpVersion {
    /// Version without the dot, as used in Rector set names ("8.2" -> 82).
    pub fn compact(&self) -> u32 {
        match self {
            Self::Php72 => 72,
            Self::Php73 => 73,
            Self::Php74 => 74,
            Self::Php80 => 80,
            Self::Php81 => 81,
            Self::Php82 => 82,
            Self::Php83 => 83,
        }
    }
}

/// Per-tool settings, keyed by tool key in [`Settings::tools`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolSettings {
    /// Whether the tool takes part in "run all". Default: true
    pub enabled: Option<bool>,
    /// Executable path, relative to the project root or absolute.
    /// Empty or equal to the tool's default means "use the default".
    pub executable_path: String,
    /// Config file path, relative to the project root or absolute.
    pub config_path: String,
    /// Overrides the tool's default priority.
    pub priority: Option<i32>,
    /// Use the Larastan flavour of PHPStan. Only read by PHPStan.
    pub laravel: bool,
}

impl ToolSettings {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// Root settings structure. Replaced as a whole on refresh, never mutated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub paths: Vec<String>,
    pub skip: Vec<String>,
    pub php_version: Option<PhpVersion>,
    pub autoload_file: String,
    pub notify_on_result: bool,
    pub show_progress_notification: bool,
    pub open_diff_after_run: bool,
    pub run_on_save: bool,
    /// Tool tables (`[rector]`, `[phpcsfixer]`, ...).
    #[serde(flatten)]
    pub tools: BTreeMap<String, ToolSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: vec!["__DIR__".to_string()],
            skip: vec!["vendor".to_string()],
            php_version: None,
            autoload_file: "vendor/autoload.php".to_string(),
            notify_on_result: true,
            show_progress_notification: false,
            open_diff_after_run: false,
            run_on_save: false,
            tools: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Settings for one tool, or defaults when the tool has no table.
    pub fn tool(&self, key: &str) -> ToolSettings {
        self.tools.get(key).cloned().unwrap_or_default()
    }

    /// Load settings for a project.
    ///
    /// Loads the global file, then deep-merges the per-project file on top.
    /// Missing files are skipped; unreadable or malformed ones are errors.
    pub fn load(root: &Path) -> Result<Self, ToolError> {
        let mut merged = toml::Table::new();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::load_table(&global_path)? {
                merge_tables(&mut merged, global);
            }
        }

        if let Some(project) = Self::load_table(&Self::project_config_path(root))? {
            merge_tables(&mut merged, project);
        }

        Self::from_table(merged, &Self::project_config_path(root))
    }

    /// Parse settings from TOML text. `origin` is only used in errors.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ToolError> {
        let table: toml::Table = toml::from_str(content).map_err(|e| ToolError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_table(table, origin)
    }

    /// Get the per-project settings path.
    pub fn project_config_path(root: &Path) -> PathBuf {
        root.join(".phprefactor").join("config.toml")
    }

    /// Get the global settings path.
    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("phprefactor").join("config.toml"))
    }

    fn load_table(path: &Path) -> Result<Option<toml::Table>, ToolError> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| ToolError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn from_table(table: toml::Table, origin: &Path) -> Result<Self, ToolError> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ToolError::Config {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })
    }
}

/// Merge `overlay` into `base`. Nested tables merge key by key, everything
/// else (including arrays) is replaced.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
