//! Tool adapters.
//!
//! Each adapter wraps an external tool and provides:
//! - Identity and install command
//! - Config file generation from settings
//! - Command-line arguments
//! - Exit-code interpretation

mod phpcsfixer;
mod phpstan;
mod rector;

pub use phpcsfixer::PhpCsFixer;
pub use phpstan::PhpStan;
pub use rector::Rector;

use crate::{Settings, Tool};
use std::sync::Arc;

/// Builds a tool from a settings snapshot.
pub type ToolFactory = Arc<dyn Fn(&Settings) -> Box<dyn Tool> + Send + Sync>;

/// Factories for all built-in adapters, in registration order.
pub fn builtin_factories() -> Vec<ToolFactory> {
    vec![
        factory(Rector::new),
        factory(PhpCsFixer::new),
        factory(PhpStan::new),
    ]
}

/// Wrap an adapter constructor as a [`ToolFactory`].
pub fn factory<T: Tool + 'static>(build: fn(&Settings) -> T) -> ToolFactory {
    Arc::new(move |settings: &Settings| -> Box<dyn Tool> { Box::new(build(settings)) })
}

/// `__DIR__` is a PHP constant and stays unquoted; everything else is a string literal.
fn php_path(path: &str) -> String {
    if path == "__DIR__" {
        path.to_string()
    } else {
        format!("'{}'", path.replace('\'', "\\'"))
    }
}

/// Render items one per line inside a PHP array literal.
fn php_list(items: impl IntoIterator<Item = String>) -> String {
    items
        .into_iter()
        .map(|item| format!("        {},\n", item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_php_path() {
        assert_eq!(php_path("__DIR__"), "__DIR__");
        assert_eq!(php_path("src"), "'src'");
        assert_eq!(php_path("it's"), "'it\\'s'");
    }

    #[test]
    fn test_builtin_keys_unique() {
        let settings = Settings::default();
        let mut keys: Vec<_> = builtin_factories()
            .iter()
            .map(|factory| factory(&settings).info().key)
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys, vec!["phpcsfixer", "phpstan", "rector"]);
    }
}
