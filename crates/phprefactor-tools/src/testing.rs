//! Test helpers: shell-script tools that record their invocations.

use crate::tools::{ProcessExit, path_arg};
use crate::{Settings, Tool, ToolError, ToolFactory, ToolInfo, ToolSettings};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A tool whose "executable" is `/bin/sh` running `scripts/<key>.sh` from
/// the project root. Scripts append their key to `calls.log`.
#[derive(Clone)]
pub(crate) struct ScriptTool {
    info: ToolInfo,
    dry_run: bool,
    always_succeed: bool,
}

impl ScriptTool {
    pub fn new(key: &'static str, priority: i32) -> Self {
        Self {
            info: ToolInfo {
                name: key,
                key,
                config_file_name: Box::leak(format!("{}.conf", key).into_boxed_str()),
                executable: Box::leak(format!("vendor/bin/{}", key).into_boxed_str()),
                install_command: "echo installed; echo careful >&2",
                default_priority: priority,
                website: "",
            },
            dry_run: false,
            always_succeed: false,
        }
    }

    pub fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn always_succeed(mut self) -> Self {
        self.always_succeed = true;
        self
    }

    pub fn with_install_command(mut self, command: &'static str) -> Self {
        self.info.install_command = command;
        self
    }

    pub fn factory(self) -> ToolFactory {
        Arc::new(move |_: &Settings| -> Box<dyn Tool> { Box::new(self.clone()) })
    }
}

impl Tool for ScriptTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    fn supports_dry_run(&self) -> bool {
        self.dry_run
    }

    fn generate_config(&self) -> String {
        format!("# generated for {}\n", self.info.key)
    }

    fn command_args(&self, target: &Path, config: &Path, dry_run: bool) -> Vec<String> {
        let mut args = vec![
            format!("scripts/{}.sh", self.info.key),
            path_arg(target),
            path_arg(config),
        ];
        if dry_run {
            args.push("--dry-run".to_string());
        }
        args
    }

    fn map_result(&self, exit: ProcessExit) -> Result<(), ToolError> {
        if self.always_succeed {
            return Ok(());
        }
        crate::tools::default_map_result(self.info.name, exit)
    }
}

/// Write `scripts/<key>.sh`: log the invocation, then run `body`.
pub(crate) fn write_script(root: &Path, key: &str, body: &str) -> PathBuf {
    let dir = root.join("scripts");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.sh", key));
    std::fs::write(&path, format!("echo {} >> calls.log\n{}\n", key, body)).unwrap();
    path
}

/// Keys in the order their scripts ran.
pub(crate) fn calls(root: &Path) -> Vec<String> {
    std::fs::read_to_string(root.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Settings that point every listed tool at `/bin/sh`.
pub(crate) fn sh_settings(keys: &[&str]) -> Settings {
    let mut settings = Settings::default();
    for key in keys {
        settings.tools.insert(
            key.to_string(),
            ToolSettings {
                executable_path: "/bin/sh".to_string(),
                ..ToolSettings::default()
            },
        );
    }
    settings
}

/// Make `path` executable.
#[cfg(unix)]
pub(crate) fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}
