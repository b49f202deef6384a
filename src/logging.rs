//! Logging for the provider process.
//!
//! Logs go to **stderr** through a `tracing` subscriber; stdout belongs to the
//! plugin host. The filter is chosen from the environment:
//!
//! 1. `RUST_LOG`, if set, is used verbatim (e.g. `azurerm=debug`);
//! 2. otherwise `TF_LOG_PROVIDER`, then `TF_LOG` (`TRACE`, `DEBUG`, `INFO`,
//!    `WARN`, `ERROR`, `JSON`, `OFF`) are mapped onto a level;
//! 3. otherwise `info`.
//!
//! ```bash
//! TF_LOG=DEBUG terraform plan
//! RUST_LOG=azurerm::client=trace terraform apply
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pick the filter directive from an environment lookup.
pub fn default_directive<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(directive) = lookup("RUST_LOG").filter(|v| !v.trim().is_empty()) {
        return directive;
    }

    let tf_level = lookup("TF_LOG_PROVIDER")
        .filter(|v| !v.trim().is_empty())
        .or_else(|| lookup("TF_LOG").filter(|v| !v.trim().is_empty()));

    match tf_level.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
        Some("TRACE") | Some("JSON") => "trace".to_string(),
        Some("DEBUG") => "debug".to_string(),
        Some("WARN") => "warn".to_string(),
        Some("ERROR") => "error".to_string(),
        Some("OFF") => "off".to_string(),
        _ => "info".to_string(),
    }
}

fn env_filter(default_level: Option<&str>) -> EnvFilter {
    let directive = match default_level {
        Some(level) => std::env::var("RUST_LOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| level.to_string()),
        None => default_directive(|key| std::env::var(key).ok()),
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn try_init_with(filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .is_ok()
}

/// Initialize the global subscriber from the environment.
///
/// Does nothing if a subscriber is already installed.
pub fn init_logging() {
    try_init_logging();
}

/// Like [`init_logging`], but falls back to `default_level` instead of the
/// Terraform variables when `RUST_LOG` is unset.
pub fn init_logging_with_default(default_level: &str) {
    try_init_with(env_filter(Some(default_level)));
}

/// Try to initialize logging, returning false if a subscriber was already set.
pub fn try_init_logging() -> bool {
    try_init_with(env_filter(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_is_info() {
        assert_eq!(default_directive(lookup_from(&[])), "info");
        assert_eq!(default_directive(lookup_from(&[("TF_LOG", "bogus")])), "info");
    }

    #[test]
    fn test_rust_log_wins() {
        let lookup = lookup_from(&[("RUST_LOG", "azurerm=trace"), ("TF_LOG", "ERROR")]);
        assert_eq!(default_directive(lookup), "azurerm=trace");
    }

    #[test]
    fn test_terraform_levels() {
        assert_eq!(default_directive(lookup_from(&[("TF_LOG", "DEBUG")])), "debug");
        assert_eq!(default_directive(lookup_from(&[("TF_LOG", "json")])), "trace");
        assert_eq!(default_directive(lookup_from(&[("TF_LOG", "OFF")])), "off");
        let lookup = lookup_from(&[("TF_LOG", "ERROR"), ("TF_LOG_PROVIDER", "warn")]);
        assert_eq!(default_directive(lookup), "warn");
    }

    #[test]
    fn test_directives_parse() {
        for directive in ["info", "off", "warn,azurerm::client=debug"] {
            assert!(EnvFilter::try_new(directive).is_ok());
        }
    }
}
