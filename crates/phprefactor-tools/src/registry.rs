//! Tool manager: registry, path resolution and execution.

use crate::adapters::{ToolFactory, builtin_factories};
use crate::paths::resolve;
use crate::process::{Completion, run_captured, run_shell, run_streaming};
use crate::{OutputSink, Settings, Tool, ToolError, ToolInfo, ToolSettings};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A tool together with the settings it was registered with.
pub struct RegisteredTool {
    tool: Box<dyn Tool>,
    settings: ToolSettings,
    priority: i32,
    enabled: bool,
}

impl RegisteredTool {
    pub fn tool(&self) -> &dyn Tool {
        self.tool.as_ref()
    }

    pub fn info(&self) -> &ToolInfo {
        self.tool.info()
    }

    pub fn key(&self) -> &'static str {
        self.tool.info().key
    }

    pub fn name(&self) -> &'static str {
        self.tool.info().name
    }

    /// Effective priority: the `priority` setting, else the tool's default.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }
}

/// Owns the registered tools for one settings snapshot and is the only
/// place that spawns tool processes.
///
/// A manager is never reconfigured in place; see [`crate::ManagerHandle`]
/// for replacing it when settings change.
pub struct ToolManager {
    root: PathBuf,
    settings: Settings,
    factories: Vec<ToolFactory>,
    /// Sorted by descending priority, ties in registration order.
    tools: Vec<RegisteredTool>,
    search_path: Option<OsString>,
    sink: Arc<dyn OutputSink>,
    /// Config files generated by this manager, by tool key.
    generated: Mutex<HashMap<&'static str, PathBuf>>,
}

impl ToolManager {
    /// Create a manager with the built-in tools.
    pub fn new(
        root: impl Into<PathBuf>,
        settings: Settings,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self, ToolError> {
        Self::with_factories(root, settings, builtin_factories(), sink)
    }

    /// Create a manager with one tool per factory.
    pub fn with_factories(
        root: impl Into<PathBuf>,
        settings: Settings,
        factories: Vec<ToolFactory>,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self, ToolError> {
        let root = std::path::absolute(root.into())?;

        let mut tools: Vec<RegisteredTool> = Vec::with_capacity(factories.len());
        for factory in &factories {
            let tool = factory(&settings);
            let key = tool.info().key;
            if tools.iter().any(|t| t.key() == key) {
                return Err(ToolError::DuplicateTool(key.to_string()));
            }
            let tool_settings = settings.tool(key);
            tools.push(RegisteredTool {
                priority: tool_settings
                    .priority
                    .unwrap_or(tool.info().default_priority),
                enabled: tool_settings.enabled(),
                settings: tool_settings,
                tool,
            });
        }
        // sort_by_key is stable, so equal priorities keep registration order.
        tools.sort_by_key(|t| std::cmp::Reverse(t.priority));

        debug!(
            root = %root.display(),
            order = ?tools.iter().map(|t| t.key()).collect::<Vec<_>>(),
            "registered tools"
        );

        Ok(Self {
            root,
            settings,
            factories,
            tools,
            search_path: None,
            sink,
            generated: Mutex::new(HashMap::new()),
        })
    }

    /// Look tools up in `path` instead of the process `PATH`.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Build a fresh manager for `settings` with the same root, factories,
    /// sink and search path. Nothing resolved by `self` carries over.
    pub fn rebuild(&self, settings: Settings) -> Result<Self, ToolError> {
        let manager = Self::with_factories(
            self.root.clone(),
            settings,
            self.factories.clone(),
            Arc::clone(&self.sink),
        )?;
        Ok(Self {
            search_path: self.search_path.clone(),
            ..manager
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sink(&self) -> &Arc<dyn OutputSink> {
        &self.sink
    }

    /// All registered tools in run order.
    pub fn tools(&self) -> &[RegisteredTool] {
        &self.tools
    }

    /// Enabled tools in run order.
    pub fn ordered_tools(&self) -> Vec<&RegisteredTool> {
        self.tools.iter().filter(|t| t.enabled).collect()
    }

    /// Get a tool by key.
    pub fn get(&self, key: &str) -> Result<&RegisteredTool, ToolError> {
        self.tools
            .iter()
            .find(|t| t.key() == key)
            .ok_or_else(|| ToolError::UnknownTool(key.to_string()))
    }

    /// Resolve the executable for a tool.
    ///
    /// An explicitly configured path must exist. The default path
    /// (`vendor/bin/...`) is only a suggestion: when it's missing the tool's
    /// binary is looked up on the search path instead.
    pub fn resolve_executable(&self, key: &str) -> Result<PathBuf, ToolError> {
        let entry = self.get(key)?;
        let info = entry.info();

        let configured = entry.settings.executable_path.trim();
        let explicit = !configured.is_empty() && configured != info.executable;
        let path = if explicit {
            resolve(&self.root, configured)
        } else {
            resolve(&self.root, info.executable)
        };

        if path.exists() {
            return Ok(path);
        }
        if explicit {
            return Err(ToolError::ExecutableNotFound {
                tool: info.name.to_string(),
                path,
            });
        }

        debug!(tool = key, missing = %path.display(), "default executable missing, searching PATH");
        let search_path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"));
        which::which_in(info.binary_name(), search_path, &self.root).map_err(|_| {
            ToolError::NotInstalled {
                tool: info.name.to_string(),
            }
        })
    }

    /// Resolve the config file for a tool, generating it when none exists.
    pub fn resolve_config_path(&self, key: &str) -> Result<PathBuf, ToolError> {
        let entry = self.get(key)?;

        let configured = self.recorded_config(entry.key()).or_else(|| {
            let path = entry.settings.config_path.trim();
            (!path.is_empty()).then(|| resolve(&self.root, path))
        });
        if let Some(path) = configured {
            if path.is_file() {
                return Ok(path);
            }
            debug!(tool = key, path = %path.display(), "configured config file missing");
        }

        self.generate_config(key)
    }

    /// Write the tool's config to `<root>/<config file name>` unless a file
    /// is already there, and remember the path for this manager's lifetime.
    pub fn generate_config(&self, key: &str) -> Result<PathBuf, ToolError> {
        let entry = self.get(key)?;
        let path = self.root.join(entry.info().config_file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut file) => {
                file.write_all(entry.tool().generate_config().as_bytes())?;
                info!(tool = key, path = %path.display(), "generated config file");
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(tool = key, path = %path.display(), "config file exists, not overwriting");
            }
            Err(e) => return Err(e.into()),
        }

        self.generated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(entry.key(), path.clone());
        Ok(path)
    }

    fn recorded_config(&self, key: &str) -> Option<PathBuf> {
        self.generated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Run a tool against `target` and interpret its exit through the tool.
    ///
    /// Output is streamed to the sink. When `cancel` fires the process is
    /// killed and the call fails with [`ToolError::Cancelled`].
    pub async fn run_command(
        &self,
        key: &str,
        target: &Path,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ToolError> {
        let entry = self.get(key)?;
        let name = entry.name();

        let result = self.execute(entry, target, dry_run, cancel).await;
        match &result {
            Ok(()) => {
                info!(tool = key, "completed");
                self.sink
                    .append_line(&format!("✓ {} completed successfully!", name));
            }
            Err(e) if e.is_cancelled() => {
                warn!(tool = key, "cancelled");
                self.sink.append_line(&format!("✗ {}", e));
            }
            Err(e) => {
                warn!(tool = key, error = %e, "failed");
                self.sink.append_line(&format!("✗ {}", e));
            }
        }
        result
    }

    async fn execute(
        &self,
        entry: &RegisteredTool,
        target: &Path,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ToolError> {
        let tool = entry.tool();
        let name = entry.name();

        // Nothing is resolved or generated for a run that is already cancelled.
        if cancel.is_cancelled() {
            return Err(ToolError::Cancelled {
                tool: name.to_string(),
            });
        }

        let dry_run = dry_run && tool.supports_dry_run();
        let executable = self.resolve_executable(entry.key())?;
        let config = self.resolve_config_path(entry.key())?;
        let args = tool.command_args(target, &config, dry_run);

        self.sink.append_line(&format!(
            "Running {}{} on: {}",
            name,
            if dry_run { " (dry run)" } else { "" },
            target.display()
        ));
        self.sink
            .append_line(&format!("Config: {}", config.display()));
        self.sink.append_line(&format!(
            "Command: {} {}",
            executable.display(),
            args.join(" ")
        ));
        self.sink.append_line("");

        debug!(tool = entry.key(), executable = %executable.display(), ?args, "spawning");
        match run_streaming(&executable, &args, &self.root, &self.sink, cancel).await {
            Completion::Finished(exit) => {
                debug!(tool = entry.key(), ?exit, "process finished");
                tool.map_result(exit)
            }
            Completion::Cancelled => Err(ToolError::Cancelled {
                tool: name.to_string(),
            }),
        }
    }

    /// Install a tool globally by running its install command in a shell.
    pub async fn install(&self, key: &str) -> Result<(), ToolError> {
        let entry = self.get(key)?;
        let name = entry.name();
        let command = entry.tool().install_command();

        self.sink
            .append_line(&format!("Installing {} globally...", name));
        self.sink.append_line(&format!("$ {}", command));

        let output = run_shell(command, &self.root)
            .await
            .map_err(|source| ToolError::Spawn {
                tool: name.to_string(),
                source,
            })?;

        for line in output.stdout.lines() {
            self.sink.append_line(line);
        }
        if !output.stderr.trim().is_empty() {
            self.sink.append_line("STDERR:");
            for line in output.stderr.lines() {
                self.sink.append_line(line);
            }
        }

        match output.code {
            Some(0) => {
                info!(tool = key, "installed");
                self.sink
                    .append_line(&format!("✓ {} installed successfully!", name));
                Ok(())
            }
            code => {
                let err = ToolError::InstallFailed {
                    tool: name.to_string(),
                    code: code.unwrap_or(-1),
                };
                warn!(tool = key, error = %err, "installation failed");
                self.sink.append_line(&format!("✗ {}", err));
                Err(err)
            }
        }
    }

    /// Resolve the executable and run it with `--version`.
    ///
    /// Returns the first line of the version output. Failures are written to
    /// the sink as well as returned.
    pub async fn check_installation(&self, key: &str) -> Result<String, ToolError> {
        let entry = self.get(key)?;
        let name = entry.name();

        match self.query_version(key, name).await {
            Ok((executable, version)) => {
                self.sink
                    .append_line(&format!("{} Installation Check", name));
                self.sink.append_line("========================");
                self.sink
                    .append_line(&format!("Executable: {}", executable.display()));
                self.sink.append_line(&format!("Version: {}", version));
                Ok(version)
            }
            Err(e) => {
                warn!(tool = key, error = %e, "installation check failed");
                self.sink.append_line(&format!("✗ {}", e));
                Err(e)
            }
        }
    }

    async fn query_version(&self, key: &str, name: &str) -> Result<(PathBuf, String), ToolError> {
        let executable = self.resolve_executable(key)?;
        let output = run_captured(&executable, &["--version"], &self.root)
            .await
            .map_err(|source| ToolError::Spawn {
                tool: name.to_string(),
                source,
            })?;

        if output.code != Some(0) {
            return Err(ToolError::Failed {
                tool: name.to_string(),
                code: output.code.unwrap_or(-1),
            });
        }

        let text = if output.stdout.trim().is_empty() {
            &output.stderr
        } else {
            &output.stdout
        };
        let version = text.lines().next().unwrap_or("").trim().to_string();
        Ok((executable, version))
    }
}
