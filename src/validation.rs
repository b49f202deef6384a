//! Configuration validation.
//!
//! [`validate`] checks a `serde_json::Value` against a [`Schema`]: presence of
//! required attributes, attribute types, nested block cardinality, and finally
//! each attribute's own validate function. The functions at the bottom of this
//! module are validate functions shared by Azure resources.
//!
//! # Example
//!
//! ```
//! use azurerm::schema::{Schema, Attribute};
//! use azurerm::validation::{self, validate};
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "resource_group_name",
//!         Attribute::required_string().with_validate(validation::resource_group_name),
//!     );
//!
//! let input = json!({"name": "app1", "resource_group_name": "rg-1"});
//! assert!(validate(&schema, &input).is_empty());
//!
//! let input = json!({"name": "app1", "resource_group_name": "bad/name"});
//! let diagnostics = validate(&schema, &input);
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("resource_group_name".to_string()));
//! ```

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, DiagnosticSeverity, NestedBlock,
    Schema,
};
use crate::enums::StringEnum;
use crate::resourceids::ResourceId;
use serde_json::Value;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed attributes are skipped (provider sets these)
/// - Attribute types must match the schema
/// - Nested blocks are validated recursively with min/max item constraints
/// - Attribute validate functions run only on values of the right type
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => {
            // Null is valid for optional blocks, but we can't validate further
            return;
        },
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value)))
                    .with_attribute_if_not_empty(path),
            );
            return;
        },
    };

    // Validate attributes
    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        let attr_value = obj.get(name);
        validate_attribute(attr, attr_value, &attr_path, diagnostics);
    }

    // Validate nested blocks
    for (name, nested_block) in &block.blocks {
        let block_path = join_path(path, name);
        let block_value = obj.get(name);
        validate_nested_block(nested_block, block_value, &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Skip computed-only attributes (provider sets these)
    if attr.flags.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            // Check if required
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
            // Optional attributes can be missing/null
        },
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            if diagnostics.len() == before {
                if let Some(validate) = attr.validate {
                    diagnostics.extend(validate.call(v, path));
                }
            }
        },
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match nested.nesting_mode {
        BlockNestingMode::Single => {
            validate_single_block(nested, value, path, diagnostics);
        },
        BlockNestingMode::List => {
            validate_list_block(nested, value, path, diagnostics);
        },
    }
}

fn validate_single_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required block '{}'", path))
                        .with_detail("At least one block is required")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            validate_block(&nested.block, v, path, diagnostics);
        },
    }
}

fn validate_list_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        Some(Value::Array(arr)) => {
            let len = arr.len() as u32;

            // Check min_items
            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // Check max_items (0 means unlimited)
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // Validate each block
            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

// Helper functions

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            // Check if it's an integer (no fractional part)
            if n.is_i64() {
                true
            } else if let Some(f) = n.as_f64() {
                // Check if the float is actually an integer
                f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
            } else {
                false
            }
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        )),
        attribute: Some(path.to_string()),
    }
}


// Validate functions shared by Azure resources

/// A resource group name: 1-90 characters of letters, digits, `_`, `-`, `.`,
/// `(` and `)`, not ending in a period.
pub fn resource_group_name(value: &Value, path: &str) -> Vec<Diagnostic> {
    let Some(name) = value.as_str() else {
        return vec![type_error(path, "string", value)];
    };

    let mut diagnostics = Vec::new();
    if name.is_empty() || name.chars().count() > 90 {
        diagnostics.push(
            Diagnostic::error(format!("{} must be between 1 and 90 characters", path))
                .with_attribute(path),
        );
    }
    if name.ends_with('.') {
        diagnostics.push(
            Diagnostic::error(format!("{} cannot end with a period", path)).with_attribute(path),
        );
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')'))
    {
        diagnostics.push(
            Diagnostic::error(format!(
                "{} may only contain alphanumeric characters, dash, underscores, parentheses and periods",
                path
            ))
            .with_attribute(path),
        );
    }
    diagnostics
}

/// An Azure region, e.g. `West Europe` or `westeurope`.
pub fn location(value: &Value, path: &str) -> Vec<Diagnostic> {
    match value.as_str() {
        Some(location) if !location.trim().is_empty() => vec![],
        Some(_) => {
            vec![Diagnostic::error(format!("{} must not be empty", path)).with_attribute(path)]
        },
        None => vec![type_error(path, "string", value)],
    }
}

/// Resource tags: at most 50, keys up to 512 characters, values up to 256.
pub fn tags(value: &Value, path: &str) -> Vec<Diagnostic> {
    let Some(tags) = value.as_object() else {
        return vec![type_error(path, "map", value)];
    };

    let mut diagnostics = Vec::new();
    if tags.len() > 50 {
        diagnostics.push(
            Diagnostic::error(format!("{} can contain at most 50 tags", path)).with_attribute(path),
        );
    }
    for (key, tag_value) in tags {
        let tag_path = join_path(path, key);
        if key.chars().count() > 512 {
            diagnostics.push(
                Diagnostic::error(format!(
                    "the maximum length for a tag key is 512 characters: {:?}",
                    key
                ))
                .with_attribute(tag_path.clone()),
            );
        }
        if tag_value.as_str().is_some_and(|v| v.chars().count() > 256) {
            diagnostics.push(
                Diagnostic::error(format!(
                    "the maximum length for a tag value is 256 characters: the value for {:?} is too long",
                    key
                ))
                .with_attribute(tag_path),
            );
        }
    }
    diagnostics
}

/// A string that is not empty and not only whitespace.
pub fn non_empty_string(value: &Value, path: &str) -> Vec<Diagnostic> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => vec![],
        Some(_) => vec![
            Diagnostic::error(format!("{} must not be empty or consist only of whitespace", path))
                .with_attribute(path),
        ],
        None => vec![type_error(path, "string", value)],
    }
}

/// One of the known values of a string enum, matched case-sensitively.
///
/// Use as `Attribute::with_validate(validation::string_in::<AppSku>)`.
pub fn string_in<E: StringEnum>(value: &Value, path: &str) -> Vec<Diagnostic> {
    let Some(s) = value.as_str() else {
        return vec![type_error(path, "string", value)];
    };
    let possible = E::possible_values();
    if possible.contains(&s) {
        return vec![];
    }
    vec![Diagnostic::error(format!(
        "expected {} to be one of {:?}, got {}",
        path, possible, s
    ))
    .with_attribute(path)]
}

/// A resource ID of type `T`, parsed case-sensitively.
///
/// Use as `Attribute::with_validate(validation::resource_id::<AppServicePlanId>)`.
pub fn resource_id<T: ResourceId>(value: &Value, path: &str) -> Vec<Diagnostic> {
    let Some(s) = value.as_str() else {
        return vec![type_error(path, "string", value)];
    };
    match T::parse(s) {
        Ok(_) => vec![],
        Err(err) => vec![Diagnostic::error(err.to_string())
            .with_detail(err.expected_format())
            .with_attribute(path)],
    }
}

trait DiagnosticExt {
    fn with_attribute_if_not_empty(self, path: &str) -> Self;
}

impl DiagnosticExt for Diagnostic {
    fn with_attribute_if_not_empty(self, path: &str) -> Self {
        if path.is_empty() {
            self
        } else {
            self.with_attribute(path)
        }
    }
}
