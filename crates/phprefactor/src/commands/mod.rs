//! Subcommand implementations. Each `cmd_*` returns the process exit code.

pub mod check;
pub mod list;
pub mod run;

use phprefactor_tools::paths::find_project_root;
use phprefactor_tools::{ConsoleSink, OutputSink, Settings, ToolError, ToolManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Find the project root, load its settings and build a manager that
/// writes tool output to stderr.
///
/// Stdout is left for results, so `--json` output stays machine-readable
/// while tool logs remain visible.
pub fn open_project(root: Option<&Path>) -> Result<Arc<ToolManager>, ToolError> {
    open_project_with(root, Arc::new(ConsoleSink))
}

/// [`open_project`] with a custom sink for tool output.
pub fn open_project_with(
    root: Option<&Path>,
    sink: Arc<dyn OutputSink>,
) -> Result<Arc<ToolManager>, ToolError> {
    let start = match root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let root = find_project_root(&start)?;
    let settings = Settings::load(&root)?;
    tracing::debug!(root = %root.display(), "loaded project settings");

    Ok(Arc::new(ToolManager::new(root, settings, sink)?))
}

/// Absolute form of a path given on the command line.
pub fn absolute_target(target: Option<PathBuf>, root: &Path) -> Result<PathBuf, ToolError> {
    match target {
        Some(target) => Ok(std::path::absolute(target)?),
        None => Ok(root.to_path_buf()),
    }
}

/// Token that fires on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            trigger.cancel();
        }
    });
    token
}

/// Print an error the same way in every command.
pub fn report_error(e: &ToolError) -> i32 {
    eprintln!("Error: {}", e);
    1
}
