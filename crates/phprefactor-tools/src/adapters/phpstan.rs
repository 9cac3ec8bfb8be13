//! PHPStan adapter - static analysis, run with `--fix`.
//!
//! https://phpstan.org/

use crate::tools::{ProcessExit, default_map_result, path_arg};
use crate::{Settings, Tool, ToolError, ToolInfo};
use std::path::Path;

const LARASTAN_INSTALL: &str = "composer global require \"larastan/larastan:^3.0\"";

/// PHPStan adapter. Larastan flavour when the `laravel` setting is on.
pub struct PhpStan {
    info: ToolInfo,
    laravel: bool,
}

impl PhpStan {
    pub fn new(settings: &Settings) -> Self {
        Self {
            info: ToolInfo {
                name: "PHPStan",
                key: "phpstan",
                config_file_name: "phpstan.neon",
                executable: "vendor/bin/phpstan",
                install_command: "composer global require phpstan/phpstan",
                default_priority: 10,
                website: "https://phpstan.org/",
            },
            laravel: settings.tool("phpstan").laravel,
        }
    }
}

impl Tool for PhpStan {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    fn install_command(&self) -> &str {
        if self.laravel {
            LARASTAN_INSTALL
        } else {
            self.info.install_command
        }
    }

    fn generate_config(&self) -> String {
        let (includes, path, level) = if self.laravel {
            (
                "includes:\n    - vendor/larastan/larastan/extension.neon\n    \
                 - vendor/nesbot/carbon/extension.neon\n\n",
                "app/",
                8,
            )
        } else {
            ("", "src/", 6)
        };

        format!(
            "{includes}parameters:\n    paths:\n        - {path}\n\n    \
             # Level 10 is the highest level\n    level: {level}\n\n    \
             treatPhpDocTypesAsCertain: false\n"
        )
    }

    fn command_args(&self, target: &Path, config: &Path, _dry_run: bool) -> Vec<String> {
        vec![
            "analyse".to_string(),
            "--fix".to_string(),
            "--configuration".to_string(),
            path_arg(config),
            path_arg(target),
        ]
    }

    /// Exit code 1 means "analysis finished and reported errors", which is
    /// a normal outcome here; the report is already in the output log.
    fn map_result(&self, exit: ProcessExit) -> Result<(), ToolError> {
        match exit {
            ProcessExit::Exited(Some(1)) => Ok(()),
            other => default_map_result(self.info.name, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ToolSettings;

    fn laravel_settings() -> Settings {
        let mut settings = Settings::default();
        settings.tools.insert(
            "phpstan".to_string(),
            ToolSettings {
                laravel: true,
                ..ToolSettings::default()
            },
        );
        settings
    }

    #[test]
    fn test_command_args_ignore_dry_run() {
        let phpstan = PhpStan::new(&Settings::default());
        assert!(!phpstan.supports_dry_run());
        let args = phpstan.command_args(Path::new("src"), Path::new("phpstan.neon"), true);
        assert_eq!(
            args,
            vec!["analyse", "--fix", "--configuration", "phpstan.neon", "src"]
        );
    }

    #[test]
    fn test_install_command_flavour() {
        let plain = PhpStan::new(&Settings::default());
        assert_eq!(
            plain.install_command(),
            "composer global require phpstan/phpstan"
        );
        let laravel = PhpStan::new(&laravel_settings());
        assert!(laravel.install_command().contains("larastan"));
    }

    #[test]
    fn test_config_flavour() {
        let plain = PhpStan::new(&Settings::default()).generate_config();
        assert!(plain.starts_with("parameters:"));
        assert!(plain.contains("- src/"));
        assert!(plain.contains("level: 6"));

        let laravel = PhpStan::new(&laravel_settings()).generate_config();
        assert!(laravel.starts_with("includes:"));
        assert!(laravel.contains("- app/"));
        assert!(laravel.contains("level: 8"));
    }

    #[test]
    fn test_map_result() {
        let phpstan = PhpStan::new(&Settings::default());
        assert!(phpstan.map_result(ProcessExit::Exited(Some(0))).is_ok());
        assert!(phpstan.map_result(ProcessExit::Exited(Some(1))).is_ok());
        assert!(matches!(
            phpstan.map_result(ProcessExit::Exited(Some(255))),
            Err(ToolError::Failed { code: 255, .. })
        ));
        let spawn = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(phpstan.map_result(ProcessExit::SpawnFailed(spawn)).is_err());
    }
}
