//! Core type definitions with validation.

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A timestamp could not be parsed.
    #[error("invalid timestamp: {value} (expected ISO 8601, e.g. 2024-01-15T09:30:00)")]
    InvalidTimestamp { value: String },

    /// A label did not match any known variant.
    #[error("unknown {kind}: {value}")]
    UnknownLabel { kind: &'static str, value: String },
}

/// Formats accepted for timestamps without an offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Format used when writing timestamps back out.
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses an ISO 8601 timestamp into a wall-clock instant.
///
/// Timestamps carrying an offset (RFC 3339) keep their wall-clock reading;
/// the offset is discarded rather than converted.
pub fn parse_instant(value: &str) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ValidationError::InvalidTimestamp {
            value: value.to_string(),
        })
}

/// Formats an instant as `YYYY-MM-DDTHH:MM:SS`.
pub fn format_instant(instant: NaiveDateTime) -> String {
    instant.format(INSTANT_FORMAT).to_string()
}

/// Serde adapter for instants, routed through [`parse_instant`].
pub mod instant {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(instant: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_instant(*instant))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_instant(&s).map_err(serde::de::Error::custom)
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated schedule item identifier.
    ///
    /// Item IDs must be non-blank. Tasks and calendar events share one ID space.
    ItemId, "item ID"
);

impl ItemId {
    /// Derives a related ID by appending `-{suffix}`.
    #[must_use]
    pub fn derived(&self, suffix: &str) -> Self {
        Self(format!("{}-{suffix}", self.0))
    }
}

/// Generates a label enum with string conversions.
///
/// Parsing is case-insensitive so upper-case API values (`WORK`) and the
/// lower-case form used in files and on the command line both resolve.
/// Mark the default variant with `#[default]`.
macro_rules! define_label_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// String representation for storage and display.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.trim().to_ascii_lowercase();
                match lowered.as_str() {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(ValidationError::UnknownLabel {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_label_enum!(
    /// What area of life a task belongs to.
    TaskType, "task type" {
        Work => "work",
        Personal => "personal",
        Health => "health",
        Learning => "learning",
        Household => "household",
        #[default]
        Other => "other",
    }
);

define_label_enum!(
    /// Category of a calendar event.
    EventCategory, "event category" {
        Work => "work",
        #[default]
        Personal => "personal",
        Health => "health",
        Social => "social",
        Other => "other",
    }
);

define_label_enum!(
    /// Urgency of a task or event.
    Priority, "priority" {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
);
