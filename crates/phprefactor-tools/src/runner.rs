//! Multi-tool runs against a single target.

use crate::{ToolError, ToolManager};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How one tool's run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure(String),
    Cancelled,
}

/// One tool's entry in a [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct ToolRun {
    pub key: String,
    pub name: String,
    pub outcome: Outcome,
}

/// Per-tool outcomes of a run, in the order the tools were started.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub target: PathBuf,
    pub dry_run: bool,
    pub entries: Vec<ToolRun>,
}

impl RunReport {
    /// True when no tool failed and the run wasn't cancelled. An empty
    /// report is a success.
    pub fn success(&self) -> bool {
        self.entries.iter().all(|e| e.outcome == Outcome::Success)
    }

    pub fn cancelled(&self) -> bool {
        self.entries.iter().any(|e| e.outcome == Outcome::Cancelled)
    }

    /// `(name, message)` for every failed tool.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.outcome {
                Outcome::Failure(message) => Some((e.name.as_str(), message.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Human-readable result of the run.
    pub fn summary(&self) -> String {
        let failures = self.failures();
        let mut parts = Vec::new();

        if !failures.is_empty() {
            let names: Vec<&str> = failures.iter().map(|(name, _)| *name).collect();
            let messages: Vec<&str> = failures.iter().map(|(_, message)| *message).collect();
            parts.push(format!(
                "{} failed with errors:\n{}",
                join_names(&names),
                messages.join(",\n")
            ));
        }

        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.outcome == Outcome::Cancelled)
        {
            parts.push(format!("Run cancelled during {}.", entry.name));
        }

        if parts.is_empty() {
            if self.entries.is_empty() {
                return "No tools to run.".to_string();
            }
            let names: Vec<&str> = self.entries.iter().map(|e| e.name.as_str()).collect();
            return format!("{} completed successfully.", join_names(&names));
        }
        parts.join("\n")
    }
}

/// Join names as "A", "A and B", "A, B and C".
pub fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Runs after every tool in a run succeeded.
#[async_trait]
pub trait PostRunAction: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn run(&self, manager: &ToolManager, report: &RunReport) -> Result<(), ToolError>;
}

/// Runs tools one after another against a target and collects outcomes.
pub struct RunCoordinator {
    manager: Arc<ToolManager>,
    post_action: Option<Box<dyn PostRunAction>>,
}

impl RunCoordinator {
    pub fn new(manager: Arc<ToolManager>) -> Self {
        Self {
            manager,
            post_action: None,
        }
    }

    pub fn with_post_action(mut self, action: impl PostRunAction + 'static) -> Self {
        self.post_action = Some(Box::new(action));
        self
    }

    pub fn manager(&self) -> &ToolManager {
        &self.manager
    }

    /// Run tools against `target`.
    ///
    /// `subset` picks tools by key (enabled or not, still in run order);
    /// otherwise all enabled tools run. With `dry_run` only tools that can
    /// preview are used. A failing tool doesn't stop the ones after it;
    /// cancellation does.
    ///
    /// Errors are only returned for an unknown key in `subset`.
    pub async fn run_on_target(
        &self,
        target: &Path,
        dry_run: bool,
        subset: Option<&[String]>,
        cancel: &CancellationToken,
    ) -> Result<RunReport, ToolError> {
        let manager = self.manager.as_ref();

        let mut selected = match subset {
            Some(keys) => {
                for key in keys {
                    manager.get(key)?;
                }
                manager
                    .tools()
                    .iter()
                    .filter(|t| keys.iter().any(|k| k == t.key()))
                    .collect()
            }
            None => manager.ordered_tools(),
        };
        if dry_run {
            selected.retain(|t| t.tool().supports_dry_run());
        }

        let mut report = RunReport {
            target: target.to_path_buf(),
            dry_run,
            entries: Vec::with_capacity(selected.len()),
        };
        if selected.is_empty() {
            debug!(target = %target.display(), dry_run, "no tools selected");
            return Ok(report);
        }

        let total = selected.len();
        let show_progress = manager.settings().show_progress_notification;
        for (index, entry) in selected.into_iter().enumerate() {
            if show_progress {
                manager
                    .sink()
                    .append_line(&format!("[{}/{}] {}...", index + 1, total, entry.name()));
            }
            let outcome = if cancel.is_cancelled() {
                Outcome::Cancelled
            } else {
                match manager.run_command(entry.key(), target, dry_run, cancel).await {
                    Ok(()) => Outcome::Success,
                    Err(e) if e.is_cancelled() => Outcome::Cancelled,
                    Err(e) => Outcome::Failure(e.to_string()),
                }
            };

            let stop = outcome == Outcome::Cancelled;
            report.entries.push(ToolRun {
                key: entry.key().to_string(),
                name: entry.name().to_string(),
                outcome,
            });
            if stop {
                warn!(tool = entry.key(), "run cancelled, skipping remaining tools");
                break;
            }
        }

        if report.success() {
            info!(target = %target.display(), tools = report.entries.len(), "run succeeded");
            if let Some(action) = &self.post_action {
                if let Err(e) = action.run(manager, &report).await {
                    warn!(action = action.name(), error = %e, "post-run action failed");
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CaptureSink;
    use crate::testing::{ScriptTool, calls, sh_settings, write_script};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn coordinator(root: &Path, keys: &[&str], tools: Vec<ScriptTool>) -> RunCoordinator {
        let factories = tools.into_iter().map(ScriptTool::factory).collect();
        let manager = ToolManager::with_factories(
            root,
            sh_settings(keys),
            factories,
            Arc::new(CaptureSink::new()),
        )
        .unwrap();
        RunCoordinator::new(Arc::new(manager))
    }

    struct CountingAction(Arc<AtomicUsize>);

    #[async_trait]
    impl PostRunAction for CountingAction {
        fn name(&self) -> &str {
            "count"
        }

        async fn run(&self, _: &ToolManager, _: &RunReport) -> Result<(), ToolError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingAction;

    #[async_trait]
    impl PostRunAction for FailingAction {
        fn name(&self) -> &str {
            "fail"
        }

        async fn run(&self, _: &ToolManager, _: &RunReport) -> Result<(), ToolError> {
            Err(ToolError::UnknownTool("diff".into()))
        }
    }

    #[test]
    fn test_join_names() {
        assert_eq!(join_names(&[]), "");
        assert_eq!(join_names(&["Rector"]), "Rector");
        assert_eq!(join_names(&["Rector", "PHPStan"]), "Rector and PHPStan");
        assert_eq!(
            join_names(&["Rector", "PHPCSFixer", "PHPStan"]),
            "Rector, PHPCSFixer and PHPStan"
        );
    }

    fn run(key: &str, name: &str, outcome: Outcome) -> ToolRun {
        ToolRun {
            key: key.into(),
            name: name.into(),
            outcome,
        }
    }

    #[test]
    fn test_summary() {
        let mut report = RunReport {
            target: PathBuf::from("src"),
            dry_run: false,
            entries: vec![
                run("rector", "Rector", Outcome::Success),
                run("phpcsfixer", "PHPCSFixer", Outcome::Success),
            ],
        };
        assert_eq!(report.summary(), "Rector and PHPCSFixer completed successfully.");

        report.entries.push(run("phpstan", "PHPStan", Outcome::Failure("boom".into())));
        report.entries[0].outcome = Outcome::Failure("bad".into());
        assert!(!report.success());
        assert_eq!(
            report.summary(),
            "Rector and PHPStan failed with errors:\nbad,\nboom"
        );
    }

    #[test]
    fn test_report_json() {
        let report = RunReport {
            target: PathBuf::from("src"),
            dry_run: true,
            entries: vec![
                run("rector", "Rector", Outcome::Success),
                run("phpstan", "PHPStan", Outcome::Failure("boom".into())),
            ],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["entries"][0]["outcome"]["status"], "success");
        assert_eq!(json["entries"][1]["outcome"]["message"], "boom");
    }

    #[tokio::test]
    async fn test_unknown_subset_key() {
        let tmp = TempDir::new().unwrap();
        let c = coordinator(tmp.path(), &[], vec![ScriptTool::new("a", 1)]);
        let result = c
            .run_on_target(
                Path::new("."),
                false,
                Some(&["nope".to_string()]),
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(ToolError::UnknownTool(_))));
    }

    #[tokio::test]
    async fn test_empty_dry_run_set_is_noop() {
        let tmp = TempDir::new().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let c = coordinator(
            tmp.path(),
            &["a", "b"],
            vec![ScriptTool::new("a", 2), ScriptTool::new("b", 1)],
        )
        .with_post_action(CountingAction(count.clone()));

        let report = c
            .run_on_target(Path::new("."), true, None, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.success());
        assert!(report.entries.is_empty());
        assert!(calls(tmp.path()).is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_partial_failure_runs_every_tool() {
        let tmp = TempDir::new().unwrap();
        write_script(tmp.path(), "one", "exit 0");
        write_script(tmp.path(), "two", "echo nope >&2; exit 1");
        write_script(tmp.path(), "three", "exit 0");
        let count = Arc::new(AtomicUsize::new(0));
        let c = coordinator(
            tmp.path(),
            &["one", "two", "three"],
            vec![
                ScriptTool::new("three", 1),
                ScriptTool::new("one", 3),
                ScriptTool::new("two", 2),
            ],
        )
        .with_post_action(CountingAction(count.clone()));

        let report = c
            .run_on_target(Path::new("."), false, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(calls(tmp.path()), vec!["one", "two", "three"]);
        assert!(!report.success());
        assert!(!report.cancelled());
        assert_eq!(
            report.failures(),
            vec![("two", "two failed with exit code: 1")]
        );
        assert_eq!(
            report.summary(),
            "two failed with errors:\ntwo failed with exit code: 1"
        );
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_override_turns_failure_into_success() {
        let tmp = TempDir::new().unwrap();
        write_script(tmp.path(), "stan", "exit 3");
        let count = Arc::new(AtomicUsize::new(0));
        let c = coordinator(
            tmp.path(),
            &["stan"],
            vec![ScriptTool::new("stan", 1).always_succeed()],
        )
        .with_post_action(CountingAction(count.clone()));

        let report = c
            .run_on_target(Path::new("."), false, None, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.success());
        assert_eq!(report.summary(), "stan completed successfully.");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_stops_remaining_tools() {
        let tmp = TempDir::new().unwrap();
        write_script(tmp.path(), "first", "exec sleep 30");
        write_script(tmp.path(), "second", "exit 0");
        write_script(tmp.path(), "third", "exit 0");
        let count = Arc::new(AtomicUsize::new(0));
        let c = coordinator(
            tmp.path(),
            &["first", "second", "third"],
            vec![
                ScriptTool::new("first", 3),
                ScriptTool::new("second", 2),
                ScriptTool::new("third", 1),
            ],
        )
        .with_post_action(CountingAction(count.clone()));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let report = c
            .run_on_target(Path::new("."), false, None, &cancel)
            .await
            .unwrap();

        assert_eq!(calls(tmp.path()), vec!["first"]);
        assert!(report.cancelled());
        assert!(!report.success());
        assert!(report.failures().is_empty());
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.summary(), "Run cancelled during first.");
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_already_cancelled_launches_nothing() {
        let tmp = TempDir::new().unwrap();
        let c = coordinator(
            tmp.path(),
            &["a", "b"],
            vec![ScriptTool::new("a", 2), ScriptTool::new("b", 1)],
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = c
            .run_on_target(Path::new("."), false, None, &cancel)
            .await
            .unwrap();
        assert!(calls(tmp.path()).is_empty());
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].outcome, Outcome::Cancelled);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_subset_keeps_run_order_and_ignores_enabled() {
        let tmp = TempDir::new().unwrap();
        write_script(tmp.path(), "low", "exit 0");
        write_script(tmp.path(), "high", "exit 0");
        write_script(tmp.path(), "mid", "exit 0");
        let mut settings = sh_settings(&["low", "high", "mid"]);
        settings.tools.get_mut("low").unwrap().enabled = Some(false);
        let manager = ToolManager::with_factories(
            tmp.path(),
            settings,
            vec![
                ScriptTool::new("low", 1).factory(),
                ScriptTool::new("high", 9).factory(),
                ScriptTool::new("mid", 5).factory(),
            ],
            Arc::new(CaptureSink::new()),
        )
        .unwrap();
        let c = RunCoordinator::new(Arc::new(manager));

        let subset = vec!["low".to_string(), "high".to_string()];
        let report = c
            .run_on_target(Path::new("."), false, Some(&subset), &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.success());
        assert_eq!(calls(tmp.path()), vec!["high", "low"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dry_run_selects_capable_tools() {
        let tmp = TempDir::new().unwrap();
        write_script(tmp.path(), "fixer", "exit 0");
        write_script(tmp.path(), "stan", "exit 0");
        let c = coordinator(
            tmp.path(),
            &["fixer", "stan"],
            vec![
                ScriptTool::new("fixer", 2).with_dry_run(),
                ScriptTool::new("stan", 1),
            ],
        );

        let report = c
            .run_on_target(Path::new("."), true, None, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(calls(tmp.path()), vec!["fixer"]);
        assert!(report.dry_run);
        assert_eq!(report.entries.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_progress_lines_follow_setting() {
        let tmp = TempDir::new().unwrap();
        write_script(tmp.path(), "a", "exit 0");
        write_script(tmp.path(), "b", "exit 0");

        for show in [true, false] {
            let mut settings = sh_settings(&["a", "b"]);
            settings.show_progress_notification = show;
            let sink = Arc::new(CaptureSink::new());
            let manager = ToolManager::with_factories(
                tmp.path(),
                settings,
                vec![
                    ScriptTool::new("a", 2).factory(),
                    ScriptTool::new("b", 1).factory(),
                ],
                sink.clone(),
            )
            .unwrap();

            RunCoordinator::new(Arc::new(manager))
                .run_on_target(Path::new("."), false, None, &CancellationToken::new())
                .await
                .unwrap();

            let lines = sink.lines();
            assert_eq!(lines.contains(&"[1/2] a...".to_string()), show);
            assert_eq!(lines.contains(&"[2/2] b...".to_string()), show);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_post_action_failure_is_not_a_tool_failure() {
        let tmp = TempDir::new().unwrap();
        write_script(tmp.path(), "a", "exit 0");
        let c = coordinator(tmp.path(), &["a"], vec![ScriptTool::new("a", 1)])
            .with_post_action(FailingAction);

        let report = c
            .run_on_target(Path::new("."), false, None, &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.success());
    }
}
