//! PHP-CS-Fixer adapter - coding standards fixer.
//!
//! https://cs.symfony.com/

use super::{php_list, php_path};
use crate::tools::path_arg;
use crate::{Settings, Tool, ToolInfo};
use std::path::Path;

/// Rules written into a generated config.
const RULES: &[(&str, &str)] = &[
    ("@PSR12", "true"),
    ("@PhpCsFixer", "true"),
    ("@Symfony", "true"),
    ("array_syntax", "['syntax' => 'short']"),
    ("binary_operator_spaces", "['default' => 'single_space']"),
    ("no_unused_imports", "true"),
    ("single_quote", "true"),
    ("trailing_comma_in_multiline", "['elements' => ['arrays']]"),
    ("yoda_style", "false"),
    ("global_namespace_import", "['import_classes' => true]"),
];

/// PHP-CS-Fixer adapter.
pub struct PhpCsFixer {
    info: ToolInfo,
    paths: Vec<String>,
    skip: Vec<String>,
}

impl PhpCsFixer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            info: ToolInfo {
                name: "PHPCSFixer",
                key: "phpcsfixer",
                config_file_name: "phpcsfixer.php",
                executable: "vendor/bin/php-cs-fixer",
                install_command: "composer global require friendsofphp/php-cs-fixer",
                default_priority: 20,
                website: "https://cs.symfony.com/",
            },
            paths: settings.paths.clone(),
            skip: settings.skip.clone(),
        }
    }
}

impl Tool for PhpCsFixer {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    fn supports_dry_run(&self) -> bool {
        true
    }

    fn generate_config(&self) -> String {
        let mut out = String::from("<?php\n\n$finder = (new PhpCsFixer\\Finder())\n");
        out.push_str("    ->in([\n");
        out.push_str(&php_list(self.paths.iter().map(|p| php_path(p))));
        out.push_str("    ])\n    ->exclude([\n");
        out.push_str(&php_list(self.skip.iter().map(|p| php_path(p))));
        out.push_str("    ])\n;\n\n");

        out.push_str("return (new PhpCsFixer\\Config())\n    ->setRules([\n");
        out.push_str(&php_list(
            RULES
                .iter()
                .map(|(rule, value)| format!("'{}' => {}", rule, value)),
        ));
        out.push_str(
            "    ])\n    ->setIndent('    ')\n    ->setRiskyAllowed(true)\n    \
             ->setLineEnding(\"\\n\")\n    ->setFinder($finder)\n;\n",
        );
        out
    }

    fn command_args(&self, target: &Path, config: &Path, dry_run: bool) -> Vec<String> {
        let mut args = vec![
            "fix".to_string(),
            path_arg(target),
            "--config".to_string(),
            path_arg(config),
            "--show-progress=none".to_string(),
            "--allow-unsupported-php-version=yes".to_string(),
        ];
        if dry_run {
            args.push("--dry-run".to_string());
        }
        args
    }
}
