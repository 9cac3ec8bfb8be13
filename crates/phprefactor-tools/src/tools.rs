//! Tool trait and common types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Static information about a tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Display name (e.g., "Rector", "PHPCSFixer").
    pub name: &'static str,
    /// Stable identifier, also the settings table name (e.g., "rector").
    pub key: &'static str,
    /// File name of the generated config inside the project root.
    pub config_file_name: &'static str,
    /// Default executable location, relative to the project root.
    pub executable: &'static str,
    /// Shell command that installs the tool globally.
    pub install_command: &'static str,
    /// Run order when settings don't override it. Higher runs first.
    pub default_priority: i32,
    /// URL to tool website.
    pub website: &'static str,
}

impl ToolInfo {
    /// Name of the binary looked up on the search path when the default
    /// executable is missing (`vendor/bin/php-cs-fixer` -> `php-cs-fixer`).
    pub fn binary_name(&self) -> &'static str {
        self.executable
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.executable)
    }
}

/// How a tool process ended, as seen by [`Tool::map_result`].
#[derive(Debug)]
pub enum ProcessExit {
    /// The process ran and exited. `None` when it was killed by a signal.
    Exited(Option<i32>),
    /// The process could not be started.
    SpawnFailed(std::io::Error),
}

/// Error type for tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("no project root found at {0}")]
    NoProjectRoot(PathBuf),
    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },
    #[error("unsupported refactor tool: {0}")]
    UnknownTool(String),
    #[error("tool key registered twice: {0}")]
    DuplicateTool(String),
    #[error("{tool} executable not found at: {path}")]
    ExecutableNotFound { tool: String, path: PathBuf },
    #[error("{tool} not found. Please install it globally or specify the path in settings.")]
    NotInstalled { tool: String },
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} failed with exit code: {code}")]
    Failed { tool: String, code: i32 },
    #[error("{tool} was terminated by a signal")]
    Terminated { tool: String },
    #[error("{tool} installation failed with exit code: {code}")]
    InstallFailed { tool: String, code: i32 },
    #[error("{tool} execution was cancelled")]
    Cancelled { tool: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Trait for tool adapters.
///
/// Each tool (Rector, PHP-CS-Fixer, PHPStan) implements this trait. Adapters
/// only describe the tool; resolving paths and spawning processes is left to
/// [`crate::ToolManager`].
pub trait Tool: Send + Sync {
    /// Get tool information.
    fn info(&self) -> &ToolInfo;

    /// Shell command used by `install`.
    fn install_command(&self) -> &str {
        self.info().install_command
    }

    /// Whether the tool has a preview mode that doesn't write files.
    fn supports_dry_run(&self) -> bool {
        false
    }

    /// Full text of the tool's config file, built from the settings the
    /// adapter was created with.
    fn generate_config(&self) -> String;

    /// Arguments passed to the executable.
    ///
    /// # Arguments
    /// * `target` - File or directory to process.
    /// * `config` - Resolved config file.
    /// * `dry_run` - Ignored by tools without a preview mode.
    fn command_args(&self, target: &Path, config: &Path, dry_run: bool) -> Vec<String>;

    /// Decide whether a finished process counts as success.
    ///
    /// Tools disagree on exit codes, so the adapter has the final word. The
    /// default treats only exit code 0 as success.
    fn map_result(&self, exit: ProcessExit) -> Result<(), ToolError> {
        default_map_result(self.info().name, exit)
    }
}

/// Exit code 0 is success; anything else, including a signal or a spawn
/// error, is a failure.
pub fn default_map_result(tool: &str, exit: ProcessExit) -> Result<(), ToolError> {
    match exit {
        ProcessExit::Exited(Some(0)) => Ok(()),
        ProcessExit::Exited(Some(code)) => Err(ToolError::Failed {
            tool: tool.to_string(),
            code,
        }),
        ProcessExit::Exited(None) => Err(ToolError::Terminated {
            tool: tool.to_string(),
        }),
        ProcessExit::SpawnFailed(source) => Err(ToolError::Spawn {
            tool: tool.to_string(),
            source,
        }),
    }
}

/// Render a path as a command-line argument.
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
