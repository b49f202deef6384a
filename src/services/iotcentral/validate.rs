use serde_json::Value;

use crate::schema::Diagnostic;

/// IoT Central application names and sub domains: 2 to 63 lowercase
/// letters, digits and dashes, not starting or ending with a dash.
pub fn application_name(value: &Value, path: &str) -> Vec<Diagnostic> {
    let Some(s) = value.as_str() else {
        return Vec::new();
    };

    let mut diagnostics = Vec::new();
    if !s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        diagnostics.push(
            Diagnostic::error(format!(
                "{} may only contain lowercase alphanumeric characters and dashes",
                path
            ))
            .with_attribute(path),
        );
    }
    if !(2..=63).contains(&s.len()) {
        diagnostics.push(
            Diagnostic::error(format!("{} must be between 2 and 63 characters long", path))
                .with_attribute(path),
        );
    }
    if s.starts_with('-') || s.ends_with('-') {
        diagnostics.push(
            Diagnostic::error(format!("{} must not start or end with a dash", path))
                .with_attribute(path),
        );
    }
    diagnostics
}

pub fn display_name(value: &Value, path: &str) -> Vec<Diagnostic> {
    match value.as_str() {
        Some(s) if s.is_empty() || s.chars().count() > 200 => vec![Diagnostic::error(format!(
            "{} must be between 1 and 200 characters long",
            path
        ))
        .with_attribute(path)],
        _ => Vec::new(),
    }
}
