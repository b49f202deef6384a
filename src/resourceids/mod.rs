//! Azure Resource ID parsing and formatting.
//!
//! An Azure Resource ID is a slash-delimited path such as
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{Namespace}/{type}/{name}`.
//! Each resource type describes its path as an ordered list of [`Segment`]s; the
//! shared [`Parser`] maps an input string onto those segments and each ID type
//! builds itself from the resulting [`ParseResult`].
//!
//! Two parse modes exist:
//!
//! - **case-sensitive** ([`ResourceId::parse`]): for user-supplied configuration,
//!   where a mis-cased static segment is a configuration error;
//! - **case-insensitive** ([`ResourceId::parse_insensitively`]): for values returned
//!   by the Azure API, which is not consistent about casing.
//!
//! # Example
//!
//! ```
//! use azurerm::resourceids::ResourceId;
//! use azurerm::services::iotcentral::IoTAppId;
//!
//! let id = IoTAppId::new("12345678-1234-9876-4563-123456789012", "resGroup1", "App1");
//! let parsed = IoTAppId::parse(&id.id()).unwrap();
//! assert_eq!(parsed, id);
//! ```

pub mod commonids;

pub use commonids::{AppServicePlanId, ResourceGroupId, SubscriptionId};

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// The role a segment plays in a resource ID path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// A literal token such as `resourceGroups` or `providers`.
    Static,
    /// A resource provider namespace such as `Microsoft.IoTCentral`.
    ResourceProvider,
    /// The subscription GUID.
    SubscriptionId,
    /// The resource group name.
    ResourceGroup,
    /// A value supplied by the user, typically a resource name.
    UserSpecified,
}

/// One component of a resource ID path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Name of the segment, used in error messages and as the parse result key.
    pub name: &'static str,
    /// What the segment holds.
    pub kind: SegmentKind,
    /// The literal value for static and resource provider segments.
    pub fixed_value: Option<&'static str>,
}

impl Segment {
    /// A literal token.
    pub fn static_segment(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            kind: SegmentKind::Static,
            fixed_value: Some(value),
        }
    }

    /// A resource provider namespace.
    pub fn resource_provider(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            kind: SegmentKind::ResourceProvider,
            fixed_value: Some(value),
        }
    }

    /// The subscription GUID.
    pub fn subscription_id(name: &'static str) -> Self {
        Self {
            name,
            kind: SegmentKind::SubscriptionId,
            fixed_value: None,
        }
    }

    /// The resource group name.
    pub fn resource_group(name: &'static str) -> Self {
        Self {
            name,
            kind: SegmentKind::ResourceGroup,
            fixed_value: None,
        }
    }

    /// A user-specified value.
    pub fn user_specified(name: &'static str) -> Self {
        Self {
            name,
            kind: SegmentKind::UserSpecified,
            fixed_value: None,
        }
    }

    /// An illustrative value for this segment, used to render the expected format.
    pub fn example_value(&self) -> String {
        match (self.kind, self.fixed_value) {
            (_, Some(value)) => value.to_string(),
            (SegmentKind::SubscriptionId, None) => {
                "12345678-1234-9876-4563-123456789012".to_string()
            },
            (SegmentKind::ResourceGroup, None) => "example-resource-group".to_string(),
            (_, None) => format!("{}Value", self.name),
        }
    }
}

/// Errors raised when a string is not a valid resource ID of the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input was empty.
    #[error("parsing {resource_name} ID: cannot parse an empty string")]
    Empty {
        /// Human-readable resource type name.
        resource_name: String,
        /// A well-formed example ID.
        example: String,
    },

    /// A segment was missing, empty, or did not match its literal value.
    #[error("parsing {resource_name} ID {input:?}: segment {segment:?} was not found")]
    SegmentNotFound {
        /// Human-readable resource type name.
        resource_name: String,
        /// Name of the offending segment.
        segment: String,
        /// The value that was parsed.
        input: String,
        /// A well-formed example ID.
        example: String,
    },

    /// The input had more path components than the ID defines.
    #[error(
        "parsing {resource_name} ID {input:?}: expected {expected} segments but got {actual}"
    )]
    WrongSegmentCount {
        /// Human-readable resource type name.
        resource_name: String,
        /// Number of segments the ID defines.
        expected: usize,
        /// Number of path components found.
        actual: usize,
        /// The value that was parsed.
        input: String,
        /// A well-formed example ID.
        example: String,
    },
}

impl ParseError {
    /// A hint describing what a valid ID of the requested type looks like.
    pub fn expected_format(&self) -> String {
        let (resource_name, example) = match self {
            Self::Empty {
                resource_name,
                example,
            }
            | Self::SegmentNotFound {
                resource_name,
                example,
                ..
            }
            | Self::WrongSegmentCount {
                resource_name,
                example,
                ..
            } => (resource_name, example),
        };
        format!("Expected a {} ID that matched:\n\n> {}", resource_name, example)
    }

    /// The name of the segment that failed to parse, if the error concerns one.
    pub fn segment(&self) -> Option<&str> {
        match self {
            Self::SegmentNotFound { segment, .. } => Some(segment),
            _ => None,
        }
    }
}

/// The segment values extracted from an input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    resource_name: String,
    input: String,
    example: String,
    parsed: HashMap<&'static str, String>,
}

impl ParseResult {
    /// The raw input that was parsed.
    pub fn raw_input(&self) -> &str {
        &self.input
    }

    /// The value for the named segment.
    ///
    /// Static segments always yield their canonical literal, whatever casing the
    /// input used.
    pub fn get(&self, name: &str) -> Result<&str, ParseError> {
        self.parsed
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ParseError::SegmentNotFound {
                resource_name: self.resource_name.clone(),
                segment: name.to_string(),
                input: self.input.clone(),
                example: self.example.clone(),
            })
    }

    /// Like [`ParseResult::get`] but returns an owned value.
    pub fn get_owned(&self, name: &str) -> Result<String, ParseError> {
        self.get(name).map(str::to_string)
    }
}

/// Maps input strings onto an ordered list of segments.
#[derive(Debug, Clone)]
pub struct Parser {
    resource_name: &'static str,
    segments: Vec<Segment>,
}

impl Parser {
    /// Create a parser for the given resource name and segment layout.
    pub fn new(resource_name: &'static str, segments: Vec<Segment>) -> Self {
        Self {
            resource_name,
            segments,
        }
    }

    /// A well-formed example ID for this layout.
    pub fn example(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("/{}", s.example_value()))
            .collect()
    }

    /// Parse `input`, matching literal segments exactly or, when `insensitively`
    /// is set, ignoring ASCII case.
    pub fn parse(&self, input: &str, insensitively: bool) -> Result<ParseResult, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty {
                resource_name: self.resource_name.to_string(),
                example: self.example(),
            });
        }

        let trimmed = input.strip_prefix('/').unwrap_or(input);
        let components: Vec<&str> = trimmed.split('/').collect();

        let mut parsed = HashMap::with_capacity(self.segments.len());
        for (position, segment) in self.segments.iter().enumerate() {
            let raw = match components.get(position) {
                Some(raw) => *raw,
                None => return Err(self.segment_not_found(segment, input)),
            };

            match segment.fixed_value {
                Some(fixed) => {
                    let matches = if insensitively {
                        raw.eq_ignore_ascii_case(fixed)
                    } else {
                        raw == fixed
                    };
                    if !matches {
                        return Err(self.segment_not_found(segment, input));
                    }
                    parsed.insert(segment.name, fixed.to_string());
                },
                None => {
                    if raw.is_empty() {
                        return Err(self.segment_not_found(segment, input));
                    }
                    parsed.insert(segment.name, raw.to_string());
                },
            }
        }

        if components.len() > self.segments.len() {
            return Err(ParseError::WrongSegmentCount {
                resource_name: self.resource_name.to_string(),
                expected: self.segments.len(),
                actual: components.len(),
                input: input.to_string(),
                example: self.example(),
            });
        }

        Ok(ParseResult {
            resource_name: self.resource_name.to_string(),
            input: input.to_string(),
            example: self.example(),
            parsed,
        })
    }

    fn segment_not_found(&self, segment: &Segment, input: &str) -> ParseError {
        ParseError::SegmentNotFound {
            resource_name: self.resource_name.to_string(),
            segment: segment.name.to_string(),
            input: input.to_string(),
            example: self.example(),
        }
    }
}

/// A typed resource ID.
///
/// Implementors describe their path layout in [`ResourceId::segments`], build
/// themselves from a [`ParseResult`], and render the canonical path in
/// [`ResourceId::id`]. For every valid set of component values,
/// `Self::parse(&x.id()) == Ok(x)`.
pub trait ResourceId: Sized + fmt::Display {
    /// Human-readable name of the resource type, e.g. `"IoT App"`.
    const RESOURCE_NAME: &'static str;

    /// The ordered path segments of this ID.
    fn segments() -> Vec<Segment>;

    /// Build the ID from parsed segment values.
    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError>;

    /// The canonical path for this ID.
    fn id(&self) -> String;

    /// Parse a user-supplied ID, matching literal segments case-sensitively.
    fn parse(input: &str) -> Result<Self, ParseError> {
        let result = Self::parser().parse(input, false)?;
        Self::from_parse_result(&result)
    }

    /// Parse an API-returned ID, ignoring the casing of literal segments.
    ///
    /// Use this only for values returned by Azure, never for configuration.
    fn parse_insensitively(input: &str) -> Result<Self, ParseError> {
        let result = Self::parser().parse(input, true)?;
        Self::from_parse_result(&result)
    }

    /// A parser for this ID's layout.
    fn parser() -> Parser {
        Parser::new(Self::RESOURCE_NAME, Self::segments())
    }

    /// A well-formed example of this ID.
    fn example() -> String {
        Self::parser().example()
    }
}

/// Implements `Display` (canonical path) and `FromStr` (case-sensitive parse)
/// for a [`ResourceId`].
macro_rules! impl_resource_id_traits {
    ($id:ty) => {
        impl ::std::fmt::Display for $id {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&$crate::resourceids::ResourceId::id(self))
            }
        }

        impl ::std::str::FromStr for $id {
            type Err = $crate::resourceids::ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$id as $crate::resourceids::ResourceId>::parse(s)
            }
        }
    };
}

pub(crate) use impl_resource_id_traits;

#[cfg(test)]
mod tests {
    use super::*;

    fn partner_parser() -> Parser {
        Parser::new(
            "Partner",
            vec![
                Segment::static_segment("staticProviders", "providers"),
                Segment::resource_provider(
                    "staticMicrosoftManagementPartner",
                    "Microsoft.ManagementPartner",
                ),
                Segment::static_segment("staticPartners", "partners"),
                Segment::user_specified("partnerId"),
            ],
        )
    }

    #[test]
    fn test_example_rendering() {
        assert_eq!(
            partner_parser().example(),
            "/providers/Microsoft.ManagementPartner/partners/partnerIdValue"
        );

        let parser = Parser::new(
            "Resource Group",
            vec![
                Segment::static_segment("staticSubscriptions", "subscriptions"),
                Segment::subscription_id("subscriptionId"),
                Segment::static_segment("staticResourceGroups", "resourceGroups"),
                Segment::resource_group("resourceGroupName"),
            ],
        );
        assert_eq!(
            parser.example(),
            "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/example-resource-group"
        );
    }

    #[test]
    fn test_parse_extracts_values() {
        let result = partner_parser()
            .parse("/providers/Microsoft.ManagementPartner/partners/5127255", false)
            .unwrap();
        assert_eq!(result.get("partnerId").unwrap(), "5127255");
        assert_eq!(result.get("staticPartners").unwrap(), "partners");
        assert_eq!(
            result.raw_input(),
            "/providers/Microsoft.ManagementPartner/partners/5127255"
        );
    }

    #[test]
    fn test_parse_without_leading_slash() {
        let result = partner_parser()
            .parse("providers/Microsoft.ManagementPartner/partners/5127255", false)
            .unwrap();
        assert_eq!(result.get("partnerId").unwrap(), "5127255");
    }

    #[test]
    fn test_parse_empty_input() {
        let err = partner_parser().parse("", false).unwrap_err();
        assert!(matches!(err, ParseError::Empty { .. }));
    }

    #[test]
    fn test_parse_empty_user_segment() {
        let err = partner_parser()
            .parse("/providers/Microsoft.ManagementPartner/partners/", false)
            .unwrap_err();
        assert_eq!(err.segment(), Some("partnerId"));
    }

    #[test]
    fn test_parse_truncated_input_names_first_missing_segment() {
        let err = partner_parser()
            .parse("/providers/Microsoft.ManagementPartner", false)
            .unwrap_err();
        assert_eq!(err.segment(), Some("staticPartners"));
    }

    #[test]
    fn test_parse_extra_segments() {
        let err = partner_parser()
            .parse(
                "/providers/Microsoft.ManagementPartner/partners/5127255/extra",
                false,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::WrongSegmentCount {
                expected: 4,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_casing() {
        let input = "/PROVIDERS/microsoft.managementpartner/Partners/5127255";
        let err = partner_parser().parse(input, false).unwrap_err();
        assert_eq!(err.segment(), Some("staticProviders"));

        let result = partner_parser().parse(input, true).unwrap();
        // Static segments are normalised, user values are kept verbatim.
        assert_eq!(
            result.get("staticMicrosoftManagementPartner").unwrap(),
            "Microsoft.ManagementPartner"
        );
        assert_eq!(result.get("partnerId").unwrap(), "5127255");
    }

    #[test]
    fn test_get_unknown_segment() {
        let result = partner_parser()
            .parse("/providers/Microsoft.ManagementPartner/partners/1", false)
            .unwrap();
        let err = result.get("nope").unwrap_err();
        assert_eq!(err.segment(), Some("nope"));
    }

    #[test]
    fn test_expected_format() {
        let err = partner_parser().parse("/nope", false).unwrap_err();
        assert_eq!(
            err.expected_format(),
            "Expected a Partner ID that matched:\n\n> /providers/Microsoft.ManagementPartner/partners/partnerIdValue"
        );
        assert!(err.to_string().contains("\"staticProviders\""));
    }
}
