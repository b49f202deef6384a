//! String-backed enums for Azure API values.
//!
//! Azure returns enum values with inconsistent casing and adds new values over
//! time. Enums declared with [`string_enum!`] therefore:
//!
//! - parse case-insensitively (`"STANDARD"` and `"standard"` are the same value);
//! - keep unrecognised values verbatim in an `Other` variant instead of failing;
//! - serialize to their canonical spelling.

/// Implemented by every enum declared with [`string_enum!`].
pub trait StringEnum: Sized {
    /// The canonical spelling of every known value.
    fn possible_values() -> &'static [&'static str];
}

/// Declare a string-backed enum.
///
/// ```ignore
/// string_enum! {
///     /// The SKU of an IoT Central application.
///     pub enum AppSku {
///         St0 => "ST0",
///         St1 => "ST1",
///     }
/// }
/// ```
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $value:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )+
            /// A value this provider does not know about, kept as returned.
            Other(String),
        }

        impl $name {
            /// The canonical spelling of every known value.
            pub fn possible_values() -> &'static [&'static str] {
                &[$($value),+]
            }

            /// Parse a value, ignoring case. Unknown values are kept verbatim.
            pub fn parse(input: &str) -> Self {
                $(
                    if input.eq_ignore_ascii_case($value) {
                        return Self::$variant;
                    }
                )+
                Self::Other(input.to_string())
            }

            /// The canonical string for this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $value,)+
                    Self::Other(value) => value.as_str(),
                }
            }

            /// Whether this is one of the known values.
            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Other(_))
            }
        }

        impl $crate::enums::StringEnum for $name {
            fn possible_values() -> &'static [&'static str] {
                <$name>::possible_values()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::parse(s))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::parse(value)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Self, D::Error> {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Ok(Self::parse(&raw))
            }
        }
    };
}

pub(crate) use string_enum;

#[cfg(test)]
mod tests {
    string_enum! {
        enum SkuTier {
            Basic => "Basic",
            Standard => "Standard",
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(SkuTier::parse("STANDARD"), SkuTier::Standard);
        assert_eq!(SkuTier::parse("standard"), SkuTier::Standard);
        assert_eq!("basic".parse::<SkuTier>().unwrap(), SkuTier::Basic);
    }

    #[test]
    fn test_unknown_value_is_kept() {
        let tier = SkuTier::parse("Premium");
        assert_eq!(tier, SkuTier::Other("Premium".to_string()));
        assert_eq!(tier.as_str(), "Premium");
        assert!(!tier.is_known());
    }

    #[test]
    fn test_possible_values() {
        assert_eq!(SkuTier::possible_values(), &["Basic", "Standard"]);
    }

    #[test]
    fn test_serde() {
        let tier: SkuTier = serde_json::from_str("\"sTaNdArD\"").unwrap();
        assert_eq!(tier, SkuTier::Standard);
        assert_eq!(serde_json::to_string(&tier).unwrap(), "\"Standard\"");

        let other: SkuTier = serde_json::from_str("\"Free\"").unwrap();
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"Free\"");
    }
}
