//! Run command - apply the configured tools to a file or directory.

use super::{absolute_target, cancel_on_ctrl_c, open_project, report_error};
use crate::output::{OutputFormat, OutputFormatter};
use async_trait::async_trait;
use nu_ansi_term::Color::{Green, Red, Yellow};
use phprefactor_tools::{
    Outcome, PostRunAction, RunCoordinator, RunReport, ToolError, ToolManager,
};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Exit code for a run stopped by Ctrl-C.
const EXIT_CANCELLED: i32 = 130;

impl OutputFormatter for RunReport {
    fn format_text(&self) -> String {
        self.summary()
    }

    fn format_pretty(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let mark = match &entry.outcome {
                Outcome::Success => Green.paint("✓"),
                Outcome::Failure(_) => Red.paint("✗"),
                Outcome::Cancelled => Yellow.paint("-"),
            };
            out.push_str(&format!("{} {}\n", mark, entry.name));
        }
        let summary = self.summary();
        let summary = if self.success() {
            Green.bold().paint(summary)
        } else if self.failures().is_empty() {
            Yellow.bold().paint(summary)
        } else {
            Red.bold().paint(summary)
        };
        out.push_str(&summary.to_string());
        out
    }
}

/// Shows `git diff` for the target in the tool log after a successful run.
pub struct DiffAction;

#[async_trait]
impl PostRunAction for DiffAction {
    fn name(&self) -> &str {
        "git diff"
    }

    async fn run(&self, manager: &ToolManager, report: &RunReport) -> Result<(), ToolError> {
        let output = Command::new("git")
            .args(["--no-pager", "diff", "--"])
            .arg(&report.target)
            .current_dir(manager.root())
            .output()
            .await?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: "git diff".to_string(),
                code: output.status.code().unwrap_or(-1),
            });
        }

        let sink = manager.sink();
        sink.append_line("");
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            sink.append_line(line);
        }
        Ok(())
    }
}

/// Run tools against `target` (the project root by default).
pub async fn cmd_run(
    root: Option<&Path>,
    target: Option<PathBuf>,
    dry_run: bool,
    tools: &[String],
    format: OutputFormat,
) -> i32 {
    let manager = match open_project(root) {
        Ok(m) => m,
        Err(e) => return report_error(&e),
    };
    let target = match absolute_target(target, manager.root()) {
        Ok(t) => t,
        Err(e) => return report_error(&e),
    };

    let subset = (!tools.is_empty()).then_some(tools);
    run_report(manager, &target, dry_run, subset, format).await
}

/// Run enabled tools on a saved file when `runOnSave` is on.
pub async fn cmd_on_save(root: Option<&Path>, file: PathBuf, format: OutputFormat) -> i32 {
    let file = match std::path::absolute(&file) {
        Ok(f) => f,
        Err(e) => return report_error(&e.into()),
    };
    if !is_php_file(&file) {
        tracing::debug!(file = %file.display(), "not a PHP file, skipping");
        return 0;
    }

    let start = root.map(Path::to_path_buf).or_else(|| file.parent().map(Path::to_path_buf));
    let manager = match open_project(start.as_deref()) {
        Ok(m) => m,
        Err(e) => return report_error(&e),
    };
    if !manager.settings().run_on_save {
        tracing::debug!("runOnSave is off");
        return 0;
    }

    run_report(manager, &file, false, None, format).await
}

fn is_php_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
}

async fn run_report(
    manager: std::sync::Arc<ToolManager>,
    target: &Path,
    dry_run: bool,
    subset: Option<&[String]>,
    format: OutputFormat,
) -> i32 {
    let settings = manager.settings();
    let notify = settings.notify_on_result;
    let open_diff = settings.open_diff_after_run && !dry_run;

    let mut coordinator = RunCoordinator::new(manager);
    if open_diff {
        coordinator = coordinator.with_post_action(DiffAction);
    }

    let cancel = cancel_on_ctrl_c();
    let report = match coordinator
        .run_on_target(target, dry_run, subset, &cancel)
        .await
    {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };

    if format.is_json() || !report.success() || notify {
        report.print(&format);
    }

    if report.cancelled() {
        EXIT_CANCELLED
    } else if report.success() {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phprefactor_tools::ToolRun;

    #[test]
    fn test_is_php_file() {
        assert!(is_php_file(Path::new("src/User.php")));
        assert!(is_php_file(Path::new("LEGACY.PHP")));
        assert!(!is_php_file(Path::new("composer.json")));
        assert!(!is_php_file(Path::new("src")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_json_run_keeps_tool_output() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("composer.json"), "{}").unwrap();
        // Rector's first argument is `process`, so `/bin/sh` runs this file.
        std::fs::write(
            tmp.path().join("process"),
            "echo rector-diagnostic >&2\nexit 2\n",
        )
        .unwrap();
        let config_dir = tmp.path().join(".phprefactor");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            "[rector]\nexecutablePath = \"/bin/sh\"\n\
             [phpcsfixer]\nenabled = false\n\
             [phpstan]\nenabled = false\n",
        )
        .unwrap();

        let capture = std::sync::Arc::new(phprefactor_tools::CaptureSink::new());
        let manager = super::super::open_project_with(Some(tmp.path()), capture.clone()).unwrap();
        let root = manager.root().to_path_buf();

        let code = run_report(manager, &root, false, None, OutputFormat::Json).await;

        assert_eq!(code, 1);
        let log = capture.contents();
        assert!(log.contains("rector-diagnostic"));
        assert!(log.contains("Rector failed with exit code: 2"));
    }

    #[test]
    fn test_pretty_report_marks() {
        let report = RunReport {
            target: PathBuf::from("src"),
            dry_run: false,
            entries: vec![
                ToolRun {
                    key: "rector".into(),
                    name: "Rector".into(),
                    outcome: Outcome::Success,
                },
                ToolRun {
                    key: "phpstan".into(),
                    name: "PHPStan".into(),
                    outcome: Outcome::Failure("PHPStan failed with exit code: 2".into()),
                },
            ],
        };
        let text = report.format_text();
        assert_eq!(
            text,
            "PHPStan failed with errors:\nPHPStan failed with exit code: 2"
        );
        let pretty = report.format_pretty();
        assert!(pretty.contains("Rector"));
        assert!(pretty.contains("PHPStan failed with errors"));
    }
}
