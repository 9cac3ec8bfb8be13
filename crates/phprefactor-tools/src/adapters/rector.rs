//! Rector adapter - automated PHP refactoring.
//!
//! https://getrector.com/

use super::{php_list, php_path};
use crate::settings::PhpVersion;
use crate::tools::path_arg;
use crate::{Settings, Tool, ToolInfo};
use std::fmt::Write;
use std::path::Path;

/// Rector refactoring engine adapter.
pub struct Rector {
    info: ToolInfo,
    paths: Vec<String>,
    skip: Vec<String>,
    php_version: Option<PhpVersion>,
    autoload_file: String,
}

impl Rector {
    pub fn new(settings: &Settings) -> Self {
        Self {
            info: ToolInfo {
                name: "Rector",
                key: "rector",
                config_file_name: "rector.php",
                executable: "vendor/bin/rector",
                install_command: "composer global require rector/rector",
                default_priority: 30,
                website: "https://getrector.com/",
            },
            paths: settings.paths.clone(),
            skip: settings.skip.clone(),
            php_version: settings.php_version,
            autoload_file: settings.autoload_file.clone(),
        }
    }

    /// `->withPhpSets(...)` line for the configured PHP version, if any.
    fn php_set(&self) -> Option<String> {
        let version = self.php_version?.compact();
        Some(if version >= 80 {
            format!("->withPhpSets(php{}: true)", version)
        } else {
            format!("->withPhp{}Set()", version)
        })
    }
}

impl Tool for Rector {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    fn supports_dry_run(&self) -> bool {
        true
    }

    fn generate_config(&self) -> String {
        let mut out = String::from(
            "<?php\n\ndeclare(strict_types=1);\n\n\
             use Rector\\Config\\RectorConfig;\n\
             use Rector\\Set\\ValueObject\\SetList;\n\n\
             $config = RectorConfig::configure()\n",
        );

        out.push_str("    ->withPaths([\n");
        out.push_str(&php_list(self.paths.iter().map(|p| php_path(p))));
        out.push_str("    ])\n");

        out.push_str("    ->withSkip([\n");
        out.push_str(&php_list(self.skip.iter().map(|p| php_path(p))));
        out.push_str("    ])\n");

        out.push_str("    ->withSets([\n");
        out.push_str(&php_list(
            [
                "DEAD_CODE",
                "CODE_QUALITY",
                "TYPE_DECLARATION",
                "PRIVATIZATION",
                "EARLY_RETURN",
                "STRICT_BOOLEANS",
            ]
            .iter()
            .map(|set| format!("SetList::{}", set)),
        ));
        out.push_str("    ])\n");

        if let Some(php_set) = self.php_set() {
            let _ = writeln!(out, "    {}", php_set);
        }
        out.push_str(";\n\n");

        let autoload = php_path(&self.autoload_file);
        let _ = writeln!(
            out,
            "if (file_exists({0})) {{\n    $config->withAutoloadPaths([{0}]);\n}}\n\nreturn $config;",
            autoload
        );
        out
    }

    fn command_args(&self, target: &Path, config: &Path, dry_run: bool) -> Vec<String> {
        let mut args = vec![
            "process".to_string(),
            path_arg(target),
            "--config".to_string(),
            path_arg(config),
            "--no-progress-bar".to_string(),
        ];
        if dry_run {
            args.push("--dry-run".to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let rector = Rector::new(&Settings::default());
        let args = rector.command_args(Path::new("src"), Path::new("/p/rector.php"), false);
        assert_eq!(
            args,
            vec!["process", "src", "--config", "/p/rector.php", "--no-progress-bar"]
        );

        let args = rector.command_args(Path::new("src"), Path::new("/p/rector.php"), true);
        assert_eq!(args.last().map(String::as_str), Some("--dry-run"));
    }

    #[test]
    fn test_config_uses_settings() {
        let settings = Settings {
            paths: vec!["__DIR__".into(), "app".into()],
            skip: vec!["vendor".into(), "storage".into()],
            ..Settings::default()
        };
        let config = Rector::new(&settings).generate_config();

        assert!(config.starts_with("<?php"));
        assert!(config.contains("        __DIR__,\n        'app',\n"));
        assert!(config.contains("'storage'"));
        assert!(config.contains("SetList::DEAD_CODE"));
        assert!(config.contains("file_exists('vendor/autoload.php')"));
        assert!(!config.contains("withPhp"));
    }

    #[test]
    fn test_php_sets() {
        let mut settings = Settings {
            php_version: Some(PhpVersion::Php82),
            ..Settings::default()
        };
        let config = Rector::new(&settings).generate_config();
        assert!(config.contains("->withPhpSets(php82: true)"));

        settings.php_version = Some(PhpVersion::Php74);
        let config = Rector::new(&settings).generate_config();
        assert!(config.contains("->withPhp74Set()"));
    }
}
