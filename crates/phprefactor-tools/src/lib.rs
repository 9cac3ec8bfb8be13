//! Orchestration core for external PHP code-quality tools.
//!
//! Registers tool adapters, orders them by priority, resolves each tool's
//! executable and config file (generating the config when missing), runs
//! them as subprocesses and interprets their exit through the adapter.
//!
//! # Built-in Tools
//!
//! - **Rector**: automated refactoring (`vendor/bin/rector`, `rector.php`)
//! - **PHPCSFixer**: code style fixer (`vendor/bin/php-cs-fixer`, `phpcsfixer.php`)
//! - **PHPStan**: static analysis, run with `--fix` (`vendor/bin/phpstan`, `phpstan.neon`)
//!
//! # Configuration
//!
//! Settings are read from `~/.config/phprefactor/config.toml` and
//! `.phprefactor/config.toml` in the project:
//!
//! ```toml
//! phpVersion = "8.2"
//! skip = ["vendor", "storage"]
//!
//! [phpstan]
//! laravel = true
//! priority = 40
//! ```
//!
//! # Example
//!
//! ```ignore
//! use phprefactor_tools::{ConsoleSink, RunCoordinator, Settings, ToolManager};
//!
//! let settings = Settings::load(&root)?;
//! let manager = ToolManager::new(&root, settings, Arc::new(ConsoleSink))?;
//! let report = RunCoordinator::new(Arc::new(manager))
//!     .run_on_target(Path::new("src"), false, None, &CancellationToken::new())
//!     .await?;
//! println!("{}", report.summary());
//! ```

pub mod adapters;
mod handle;
mod output;
pub mod paths;
mod process;
mod registry;
mod runner;
mod settings;
#[cfg(test)]
mod testing;
mod tools;

pub use adapters::{PhpCsFixer, PhpStan, Rector, ToolFactory, builtin_factories, factory};
pub use handle::ManagerHandle;
pub use output::{CaptureSink, ConsoleSink, OutputSink};
pub use registry::{RegisteredTool, ToolManager};
pub use runner::{Outcome, PostRunAction, RunCoordinator, RunReport, ToolRun, join_names};
pub use settings::{PhpVersion, Settings, ToolSettings};
pub use tools::{ProcessExit, Tool, ToolError, ToolInfo, default_map_result};
