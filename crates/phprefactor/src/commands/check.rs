//! Installation commands: check, install, generate-config.

use super::{open_project, report_error};
use crate::output::{OutputFormat, OutputFormatter};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Version check for one tool.
#[derive(Debug, Serialize)]
pub struct CheckItem {
    pub key: String,
    pub name: String,
    pub version: Option<String>,
    pub error: Option<String>,
}

/// Result of the check command.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub tools: Vec<CheckItem>,
}

impl CheckResult {
    fn all_installed(&self) -> bool {
        self.tools.iter().all(|t| t.error.is_none())
    }
}

impl OutputFormatter for CheckResult {
    fn format_text(&self) -> String {
        let mut out = String::new();
        for tool in &self.tools {
            match (&tool.version, &tool.error) {
                (Some(version), _) => {
                    let _ = writeln!(out, "✓ {}: {}", tool.name, version);
                }
                (None, Some(error)) => {
                    let _ = writeln!(out, "✗ {}: {}", tool.name, error);
                }
                (None, None) => {}
            }
        }
        out.trim_end().to_string()
    }
}

/// Check installation of the given tools, or of every registered tool.
pub async fn cmd_check(root: Option<&Path>, keys: &[String], format: OutputFormat) -> i32 {
    let manager = match open_project(root) {
        Ok(m) => m,
        Err(e) => return report_error(&e),
    };

    let keys: Vec<String> = if keys.is_empty() {
        manager.tools().iter().map(|t| t.key().to_string()).collect()
    } else {
        keys.to_vec()
    };

    let mut result = CheckResult { tools: Vec::new() };
    for key in &keys {
        let name = match manager.get(key) {
            Ok(t) => t.name().to_string(),
            Err(e) => return report_error(&e),
        };
        let (version, error) = match manager.check_installation(key).await {
            Ok(version) => (Some(version), None),
            Err(e) => (None, Some(e.to_string())),
        };
        if !format.is_json() {
            manager.sink().append_line("");
        }
        result.tools.push(CheckItem {
            key: key.clone(),
            name,
            version,
            error,
        });
    }

    result.print(&format);
    if result.all_installed() { 0 } else { 1 }
}

/// Install a tool globally.
pub async fn cmd_install(root: Option<&Path>, key: &str, format: OutputFormat) -> i32 {
    let manager = match open_project(root) {
        Ok(m) => m,
        Err(e) => return report_error(&e),
    };

    let result = manager.install(key).await;
    if format.is_json() {
        let value = serde_json::json!({
            "tool": key,
            "success": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", value);
    }
    match result {
        Ok(()) => 0,
        Err(e) if format.is_json() => {
            tracing::debug!(error = %e, "install failed");
            1
        }
        Err(e) => report_error(&e),
    }
}

/// Generate a tool's config file from settings and print its path.
pub fn cmd_generate_config(root: Option<&Path>, key: &str, format: OutputFormat) -> i32 {
    let manager = match open_project(root) {
        Ok(m) => m,
        Err(e) => return report_error(&e),
    };

    match manager.generate_config(key) {
        Ok(path) => {
            if format.is_json() {
                println!("{}", serde_json::json!({ "tool": key, "path": path }));
            } else {
                println!("{}", path.display());
            }
            0
        }
        Err(e) => report_error(&e),
    }
}
