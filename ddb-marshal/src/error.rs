/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Error types for converting records to and from attribute values.

use std::error::Error as StdError;
use std::fmt;

/// A boxed [std::error::Error] trait object that's [Send] and [Sync]
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Error that occurs while marshaling a record, unmarshaling an item, or deriving a table schema.
#[derive(Debug)]
pub struct ConversionError {
    kind: ConversionErrorKind,
    field: Option<String>,
    source: Option<BoxError>,
}

/// The kind of conversion error that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConversionErrorKind {
    /// The record handed to the engine does not match its own field descriptors.
    InvalidInput {
        /// Description of the mismatch.
        message: String,
    },
    /// A field's type has no registered codec.
    UnsupportedType {
        /// Rust type name of the field.
        type_name: &'static str,
    },
    /// A field annotation is contradictory.
    InvalidTag {
        /// Description of why the tag was rejected.
        message: String,
    },
    /// A key field has a type that cannot be used as a table key.
    InvalidKeyType {
        /// Rust type name of the field.
        type_name: &'static str,
    },
    /// The stored attribute carries a type tag from a different wire family.
    TypeMismatch {
        /// The tag the field's codec expects.
        expected: &'static str,
        /// The tag actually stored.
        actual: &'static str,
    },
    /// Numeric or boolean text could not be parsed.
    ScalarParse {
        /// Description of the parse failure.
        message: String,
    },
    /// A custom textual codec reported a failure.
    CustomCodec {
        /// Description of the codec failure.
        message: String,
    },
}

impl ConversionError {
    fn new(kind: ConversionErrorKind) -> Self {
        Self {
            kind,
            field: None,
            source: None,
        }
    }

    /// Creates an error for a record that disagrees with its descriptors.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ConversionErrorKind::InvalidInput {
            message: message.into(),
        })
    }

    /// Creates an error for a type without a codec.
    pub fn unsupported_type(type_name: &'static str) -> Self {
        Self::new(ConversionErrorKind::UnsupportedType { type_name })
    }

    /// Creates an error for a contradictory field annotation.
    pub fn invalid_tag(message: impl Into<String>) -> Self {
        Self::new(ConversionErrorKind::InvalidTag {
            message: message.into(),
        })
    }

    /// Creates an error for a key field whose type cannot be a table key.
    pub fn invalid_key_type(type_name: &'static str) -> Self {
        Self::new(ConversionErrorKind::InvalidKeyType { type_name })
    }

    /// Creates a type error without a field name (for standalone conversions).
    pub fn type_mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self::new(ConversionErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an error for scalar text that failed to parse.
    pub fn scalar_parse(message: impl Into<String>) -> Self {
        Self::new(ConversionErrorKind::ScalarParse {
            message: message.into(),
        })
    }

    /// Creates an error for a failing custom textual codec.
    pub fn custom_codec(message: impl Into<String>) -> Self {
        Self::new(ConversionErrorKind::CustomCodec {
            message: message.into(),
        })
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches the field the error relates to, unless one is already set.
    ///
    /// Codecs fail without knowing which field they serve; the engines add the
    /// field name on the way out.
    pub fn for_field(mut self, field: impl Into<String>) -> Self {
        if self.field.is_none() {
            self.field = Some(field.into());
        }
        self
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ConversionErrorKind {
        &self.kind
    }

    /// Returns the field name if available.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for ConversionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionErrorKind::InvalidInput { message } => {
                write!(f, "invalid input: {}", message)
            }
            ConversionErrorKind::UnsupportedType { type_name } => {
                write!(f, "{} type is not supported", type_name)
            }
            ConversionErrorKind::InvalidTag { message } => write!(f, "invalid tag: {}", message),
            ConversionErrorKind::InvalidKeyType { type_name } => {
                write!(f, "{} type is not a valid key type", type_name)
            }
            ConversionErrorKind::TypeMismatch { expected, actual } => {
                write!(f, "invalid type: expected {}, got {}", expected, actual)
            }
            ConversionErrorKind::ScalarParse { message } => write!(f, "{}", message),
            ConversionErrorKind::CustomCodec { message } => {
                write!(f, "custom codec failed: {}", message)
            }
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "field '{}': {}", field, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for ConversionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|err| err.as_ref() as _)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_field() {
        let err = ConversionError::type_mismatch("N", "S").for_field("year");
        assert_eq!(err.to_string(), "field 'year': invalid type: expected N, got S");
    }

    #[test]
    fn first_field_wins() {
        let err = ConversionError::scalar_parse("bad")
            .for_field("inner")
            .for_field("outer");
        assert_eq!(err.field(), Some("inner"));
    }

    #[test]
    fn source_is_exposed() {
        let cause = "x".parse::<i64>().unwrap_err();
        let err = ConversionError::scalar_parse("cannot parse 'x'").with_source(cause);
        assert!(err.source().is_some());
        assert!(matches!(err.kind(), ConversionErrorKind::ScalarParse { .. }));
    }
}
