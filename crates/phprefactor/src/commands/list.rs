//! List command - registered tools in run order.

use super::{open_project, report_error};
use crate::output::{OutputFormat, OutputFormatter};
use nu_ansi_term::Color::{Green, Red};
use nu_ansi_term::Style;
use phprefactor_tools::ToolManager;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Tool info for list output.
#[derive(Debug, Serialize)]
pub struct ToolListItem {
    pub key: String,
    pub name: String,
    pub priority: i32,
    pub enabled: bool,
    pub dry_run: bool,
    pub executable: Option<String>,
    pub error: Option<String>,
    pub website: String,
}

/// Result of the list command.
#[derive(Debug, Serialize)]
pub struct ToolListResult {
    pub root: String,
    pub tools: Vec<ToolListItem>,
}

impl ToolListResult {
    pub fn from_manager(manager: &ToolManager) -> Self {
        let tools = manager
            .tools()
            .iter()
            .map(|t| {
                let (executable, error) = match manager.resolve_executable(t.key()) {
                    Ok(path) => (Some(path.display().to_string()), None),
                    Err(e) => (None, Some(e.to_string())),
                };
                ToolListItem {
                    key: t.key().to_string(),
                    name: t.name().to_string(),
                    priority: t.priority(),
                    enabled: t.enabled(),
                    dry_run: t.tool().supports_dry_run(),
                    executable,
                    error,
                    website: t.info().website.to_string(),
                }
            })
            .collect();
        Self {
            root: manager.root().display().to_string(),
            tools,
        }
    }

    fn flags(tool: &ToolListItem) -> String {
        let mut flags = vec![format!("priority {}", tool.priority)];
        if !tool.enabled {
            flags.push("disabled".to_string());
        }
        if tool.dry_run {
            flags.push("dry-run".to_string());
        }
        flags.join(", ")
    }
}

impl OutputFormatter for ToolListResult {
    fn format_text(&self) -> String {
        let mut out = format!("Tools for {} (in run order):\n\n", self.root);
        for tool in &self.tools {
            let status = if tool.executable.is_some() { "✓" } else { "✗" };
            let _ = writeln!(
                out,
                "  {} {} [{}] ({})",
                status,
                tool.name,
                tool.key,
                Self::flags(tool)
            );
            match (&tool.executable, &tool.error) {
                (Some(exe), _) => {
                    let _ = writeln!(out, "    Executable: {}", exe);
                }
                (None, Some(err)) => {
                    let _ = writeln!(out, "    {}", err);
                }
                (None, None) => {}
            }
            let _ = writeln!(out, "    Website: {}", tool.website);
        }
        out.trim_end().to_string()
    }

    fn format_pretty(&self) -> String {
        let mut out = format!(
            "{}\n\n",
            Style::new()
                .bold()
                .paint(format!("Tools for {} (in run order):", self.root))
        );
        for tool in &self.tools {
            let status = if tool.executable.is_some() {
                Green.paint("✓")
            } else {
                Red.paint("✗")
            };
            let name = if tool.enabled {
                Style::new().bold().paint(tool.name.as_str())
            } else {
                Style::new().dimmed().paint(tool.name.as_str())
            };
            let _ = writeln!(
                out,
                "  {} {} [{}] ({})",
                status,
                name,
                tool.key,
                Self::flags(tool)
            );
            match (&tool.executable, &tool.error) {
                (Some(exe), _) => {
                    let _ = writeln!(out, "    Executable: {}", exe);
                }
                (None, Some(err)) => {
                    let _ = writeln!(out, "    {}", Red.paint(err.as_str()));
                }
                (None, None) => {}
            }
            let _ = writeln!(out, "    Website: {}", tool.website);
        }
        out.trim_end().to_string()
    }
}

/// List registered tools with their resolved executables.
pub fn cmd_list(root: Option<&Path>, format: OutputFormat) -> i32 {
    match open_project(root) {
        Ok(manager) => {
            ToolListResult::from_manager(&manager).print(&format);
            0
        }
        Err(e) => report_error(&e),
    }
}
