//! Schema types for describing provider, resource and data source attributes.
//!
//! Schemas describe the shape of the provider block, each resource, and each data
//! source. Attributes carry Required/Optional/Computed flags plus ForceNew,
//! Default, Sensitive and an optional validate function, mirroring what Terraform
//! core expects from a provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::validation;

/// The type of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// A string value.
    String,
    /// A 64-bit integer.
    Int64,
    /// A boolean value.
    Bool,
    /// A list of values of a single type.
    List(Box<AttributeType>),
    /// A map from string keys to values of a single type.
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// Create a list type.
    pub fn list(element_type: AttributeType) -> Self {
        Self::List(Box::new(element_type))
    }

    /// Create a map type.
    pub fn map(element_type: AttributeType) -> Self {
        Self::Map(Box::new(element_type))
    }
}

/// Describes how an attribute can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeFlags {
    /// The attribute is required in configuration.
    pub required: bool,
    /// The attribute is optional in configuration.
    pub optional: bool,
    /// The attribute is computed by the provider.
    pub computed: bool,
    /// The attribute is sensitive and hidden in plan output.
    pub sensitive: bool,
}

impl AttributeFlags {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Default::default()
        }
    }

    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Default::default()
        }
    }

    /// Can be set in configuration; otherwise the API value is kept.
    pub fn optional_computed() -> Self {
        Self {
            optional: true,
            computed: true,
            ..Default::default()
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Computed and never set from configuration.
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

/// A function validating a single configured value.
///
/// It receives the value and its attribute path and returns error diagnostics;
/// an empty list means the value is valid. Null values are never passed in.
#[derive(Clone, Copy)]
pub struct ValidateFunc(pub fn(&Value, &str) -> Vec<Diagnostic>);

impl ValidateFunc {
    pub fn call(&self, value: &Value, path: &str) -> Vec<Diagnostic> {
        (self.0)(value, path)
    }
}

impl fmt::Debug for ValidateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidateFunc")
    }
}

impl PartialEq for ValidateFunc {
    fn eq(&self, other: &Self) -> bool {
        self.0 as usize == other.0 as usize
    }
}

/// Decides whether a change between two values of an attribute is only
/// cosmetic, e.g. `West Europe` and `westeurope`. Called as `(old, new)`.
#[derive(Clone, Copy)]
pub struct DiffSuppressFunc(pub fn(&Value, &Value) -> bool);

impl DiffSuppressFunc {
    pub fn call(&self, old: &Value, new: &Value) -> bool {
        (self.0)(old, new)
    }
}

impl fmt::Debug for DiffSuppressFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DiffSuppressFunc")
    }
}

impl PartialEq for DiffSuppressFunc {
    fn eq(&self, other: &Self) -> bool {
        self.0 as usize == other.0 as usize
    }
}

/// Describes a single attribute in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// The type of the attribute.
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Flags describing how the attribute can be used.
    #[serde(flatten)]
    pub flags: AttributeFlags,
    /// Human-readable description of the attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Changing this attribute forces the resource to be replaced.
    #[serde(default)]
    pub force_new: bool,
    /// Default value used when configuration omits the attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Extra validation run on configured values.
    #[serde(skip)]
    pub validate: Option<ValidateFunc>,
    /// Treats some changes as no change when planning.
    #[serde(skip)]
    pub diff_suppress: Option<DiffSuppressFunc>,
}

impl Attribute {
    pub fn new(attr_type: AttributeType, flags: AttributeFlags) -> Self {
        Self {
            attr_type,
            flags,
            description: None,
            force_new: false,
            default: None,
            validate: None,
            diff_suppress: None,
        }
    }

    pub fn required_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::required())
    }

    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::optional())
    }

    pub fn computed_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::computed())
    }

    pub fn optional_computed_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::optional_computed())
    }

    pub fn required_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::required())
    }

    pub fn optional_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::optional())
    }

    pub fn required_bool() -> Self {
        Self::new(AttributeType::Bool, AttributeFlags::required())
    }

    pub fn optional_bool() -> Self {
        Self::new(AttributeType::Bool, AttributeFlags::optional())
    }

    /// An optional map of strings.
    pub fn optional_string_map() -> Self {
        Self::new(
            AttributeType::map(AttributeType::String),
            AttributeFlags::optional(),
        )
    }

    /// A computed map of strings.
    pub fn computed_string_map() -> Self {
        Self::new(
            AttributeType::map(AttributeType::String),
            AttributeFlags::computed(),
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_validate(mut self, validate: fn(&Value, &str) -> Vec<Diagnostic>) -> Self {
        self.validate = Some(ValidateFunc(validate));
        self
    }

    pub fn with_diff_suppress(mut self, suppress: fn(&Value, &Value) -> bool) -> Self {
        self.diff_suppress = Some(DiffSuppressFunc(suppress));
        self
    }

    /// Whether `old` and `new` differ only in a way this attribute ignores.
    pub fn suppresses_diff(&self, old: &Value, new: &Value) -> bool {
        self.diff_suppress.is_some_and(|f| f.call(old, new))
    }

    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }
}

/// Attribute definitions shared by most Azure resources.
pub mod common {
    use super::Attribute;
    use crate::resource;
    use crate::validation;

    /// `name` of a resource group: required, forces replacement.
    pub fn resource_group_name() -> Attribute {
        Attribute::required_string()
            .with_force_new()
            .with_validate(validation::resource_group_name)
            .with_description("The name of the Resource Group where the resource should exist.")
    }

    /// `location`: required, forces replacement.
    pub fn location() -> Attribute {
        Attribute::required_string()
            .with_force_new()
            .with_validate(validation::location)
            .with_diff_suppress(resource::locations_equal)
            .with_description("The Azure Region where the resource should exist.")
    }

    /// `location` as read back from a data source.
    pub fn location_computed() -> Attribute {
        Attribute::computed_string()
    }

    /// `tags`: an optional map of strings.
    pub fn tags() -> Attribute {
        Attribute::optional_string_map()
            .with_validate(validation::tags)
            .with_description("A mapping of tags which should be assigned to the resource.")
    }

    /// `tags` as read back from a data source.
    pub fn tags_computed() -> Attribute {
        Attribute::computed_string_map()
    }
}

/// The nesting mode for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlockNestingMode {
    /// A single nested block (at most one).
    #[default]
    Single,
    /// A list of nested blocks (zero or more, ordered).
    List,
}

/// A nested block within a schema, e.g. `features` on the provider block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Block {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Attribute>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub blocks: HashMap<String, NestedBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A nested block with its nesting mode and constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedBlock {
    #[serde(flatten)]
    pub block: Block,
    #[serde(default)]
    pub nesting_mode: BlockNestingMode,
    /// Minimum number of blocks required.
    #[serde(default)]
    pub min_items: u32,
    /// Maximum number of blocks allowed (0 = unlimited).
    #[serde(default)]
    pub max_items: u32,
}

impl NestedBlock {
    /// A single nested block (0 or 1 allowed).
    pub fn single(block: Block) -> Self {
        Self {
            block,
            nesting_mode: BlockNestingMode::Single,
            min_items: 0,
            max_items: 1,
        }
    }

    /// A list of nested blocks.
    pub fn list(block: Block) -> Self {
        Self {
            block,
            nesting_mode: BlockNestingMode::List,
            min_items: 0,
            max_items: 0,
        }
    }

    pub fn with_min_items(mut self, min: u32) -> Self {
        self.min_items = min;
        self
    }

    pub fn with_max_items(mut self, max: u32) -> Self {
        self.max_items = max;
        self
    }
}

/// Schema for a resource, data source, or the provider block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    /// The version of this schema. Persisted state written under an older
    /// version is passed through the resource's state upgraders.
    #[serde(default)]
    pub version: u64,
    #[serde(flatten)]
    pub block: Block,
}

impl Schema {
    pub fn new(version: u64) -> Self {
        Self {
            version,
            block: Block::new(),
        }
    }

    pub fn v0() -> Self {
        Self::new(0)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.block.attributes.insert(name.into(), attr);
        self
    }

    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.block.blocks.insert(name.into(), block);
        self
    }

    /// Look up a top-level attribute.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.get(name)
    }

    /// Names of top-level attributes whose change forces replacement, sorted.
    pub fn force_new_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .block
            .attributes
            .iter()
            .filter(|(_, attr)| attr.force_new)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Validate a configuration value against this schema.
    pub fn validate(&self, value: &Value) -> Vec<Diagnostic> {
        validation::validate(self, value)
    }
}

/// Schema for the provider configuration, its resources and data sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderSchema {
    #[serde(default)]
    pub provider: Schema,
    #[serde(default)]
    pub resources: HashMap<String, Schema>,
    #[serde(default)]
    pub data_sources: HashMap<String, Schema>,
}

impl ProviderSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider_config(mut self, schema: Schema) -> Self {
        self.provider = schema;
        self
    }

    pub fn with_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    pub fn with_data_source(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.data_sources.insert(name.into(), schema);
        self
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// An error that prevents the operation from completing.
    Error,
    /// A warning that doesn't prevent the operation but should be addressed.
    Warning,
}

/// A diagnostic message surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    /// A short summary of the issue.
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The attribute path where the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_flags() {
        let required = AttributeFlags::required();
        assert!(required.required);
        assert!(!required.optional);
        assert!(!required.is_computed_only());

        let computed = AttributeFlags::computed();
        assert!(computed.is_computed_only());

        let optional_computed = AttributeFlags::optional_computed();
        assert!(optional_computed.optional);
        assert!(optional_computed.computed);
        assert!(!optional_computed.is_computed_only());

        assert!(AttributeFlags::required().sensitive().sensitive);
    }

    #[test]
    fn test_attribute_builders() {
        let attr = Attribute::required_string()
            .with_description("The name of the application")
            .with_force_new()
            .with_default(json!("x"));

        assert_eq!(attr.attr_type, AttributeType::String);
        assert!(attr.flags.required);
        assert!(attr.force_new);
        assert_eq!(attr.default, Some(json!("x")));
        assert!(attr.validate.is_none());
    }

    #[test]
    fn test_common_attributes() {
        let location = common::location();
        assert!(location.force_new);
        assert!(location.validate.is_some());

        let tags = common::tags();
        assert_eq!(tags.attr_type, AttributeType::map(AttributeType::String));
        assert!(tags.flags.optional);
    }

    #[test]
    fn test_validate_func_equality() {
        fn never(_: &Value, _: &str) -> Vec<Diagnostic> {
            vec![]
        }
        let a = ValidateFunc(never);
        assert_eq!(a, ValidateFunc(never));
        assert!(a.call(&json!("x"), "name").is_empty());
    }

    #[test]
    fn test_schema_builder_and_lookup() {
        let schema = Schema::new(1)
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("location", common::location())
            .with_attribute("id", Attribute::computed_string())
            .with_block(
                "features",
                NestedBlock::single(
                    Block::new().with_attribute("enabled", Attribute::optional_bool()),
                ),
            );

        assert_eq!(schema.version, 1);
        assert!(schema.attribute("name").is_some());
        assert!(schema.attribute("missing").is_none());
        assert!(schema.block.blocks.contains_key("features"));
        assert_eq!(schema.force_new_attributes(), vec!["location", "name"]);
    }

    #[test]
    fn test_schema_serializes_without_validate_func() {
        let schema = Schema::v0().with_attribute("location", common::location());
        let encoded = serde_json::to_value(&schema).unwrap();
        assert_eq!(encoded["attributes"]["location"]["type"], "string");
        assert_eq!(encoded["attributes"]["location"]["force_new"], true);
        assert!(encoded["attributes"]["location"].get("validate").is_none());
    }

    #[test]
    fn test_provider_schema() {
        let provider_schema = ProviderSchema::new()
            .with_provider_config(
                Schema::v0()
                    .with_attribute("client_secret", Attribute::optional_string().sensitive()),
            )
            .with_resource("azurerm_resource_group", Schema::v0())
            .with_data_source("azurerm_resource_group", Schema::v0());

        assert!(provider_schema.provider.block.attributes["client_secret"].flags.sensitive);
        assert!(provider_schema.resources.contains_key("azurerm_resource_group"));
        assert!(provider_schema.data_sources.contains_key("azurerm_resource_group"));
    }

    #[test]
    fn test_diagnostic() {
        let err = Diagnostic::error("Invalid configuration")
            .with_detail("The value must be one of ST0, ST1, ST2")
            .with_attribute("sku");

        assert!(err.is_error());
        assert_eq!(err.summary, "Invalid configuration");
        assert_eq!(err.attribute, Some("sku".to_string()));
        assert!(!Diagnostic::warning("deprecated").is_error());
    }

    #[test]
    fn test_nested_block_modes() {
        let single = NestedBlock::single(Block::new());
        assert_eq!(single.nesting_mode, BlockNestingMode::Single);
        assert_eq!(single.max_items, 1);

        let list = NestedBlock::list(Block::new()).with_min_items(1).with_max_items(5);
        assert_eq!(list.nesting_mode, BlockNestingMode::List);
        assert_eq!(list.min_items, 1);
        assert_eq!(list.max_items, 5);
    }
}
