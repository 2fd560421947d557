/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Wire-level attribute values.
//!
//! Every value travels as a single-entry map from a type tag to its encoded
//! form, e.g. `{"N": "2007"}` or `{"SS": ["a", "b"]}`. An [`Item`] maps
//! attribute names to such values.

use aws_smithy_types::Blob;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::ConversionError;

/// An item as exchanged with the store: attribute name to tagged value.
pub type Item = HashMap<String, AttributeValue>;

/// A single tagged attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String.
    #[serde(rename = "S")]
    S(String),
    /// Number, stored as decimal text.
    #[serde(rename = "N")]
    N(String),
    /// Binary, carried as the text of its raw bytes.
    #[serde(rename = "B")]
    B(#[serde(with = "blob_text")] Blob),
    /// String set.
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    /// Number set.
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    /// Binary set.
    #[serde(rename = "BS")]
    Bs(#[serde(with = "blob_set_text")] Vec<Blob>),
}

impl AttributeValue {
    /// Returns the type tag of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            AttributeValue::S(_) => TypeTag::S,
            AttributeValue::N(_) => TypeTag::N,
            AttributeValue::B(_) => TypeTag::B,
            AttributeValue::Ss(_) => TypeTag::Ss,
            AttributeValue::Ns(_) => TypeTag::Ns,
            AttributeValue::Bs(_) => TypeTag::Bs,
        }
    }

    /// Collects scalar values sharing `element` into the matching set value.
    ///
    /// Fails if any value is not a scalar of type `element`.
    pub fn set_of(
        element: ScalarType,
        values: Vec<AttributeValue>,
    ) -> Result<AttributeValue, ConversionError> {
        let mismatch = |value: &AttributeValue| {
            ConversionError::type_mismatch(element.as_str(), value.type_tag().as_str())
        };
        match element {
            ScalarType::S => values
                .into_iter()
                .map(|value| match value {
                    AttributeValue::S(s) => Ok(s),
                    other => Err(mismatch(&other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(AttributeValue::Ss),
            ScalarType::N => values
                .into_iter()
                .map(|value| match value {
                    AttributeValue::N(n) => Ok(n),
                    other => Err(mismatch(&other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(AttributeValue::Ns),
            ScalarType::B => values
                .into_iter()
                .map(|value| match value {
                    AttributeValue::B(b) => Ok(b),
                    other => Err(mismatch(&other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(AttributeValue::Bs),
        }
    }

    /// Splits a set value into its elements, each in scalar form.
    ///
    /// Returns `None` for scalar values.
    pub fn into_elements(self) -> Option<Vec<AttributeValue>> {
        match self {
            AttributeValue::Ss(values) => Some(values.into_iter().map(AttributeValue::S).collect()),
            AttributeValue::Ns(values) => Some(values.into_iter().map(AttributeValue::N).collect()),
            AttributeValue::Bs(values) => Some(values.into_iter().map(AttributeValue::B).collect()),
            _ => None,
        }
    }
}

/// The wire type tag of an attribute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `S`
    S,
    /// `N`
    N,
    /// `B`
    B,
    /// `SS`
    Ss,
    /// `NS`
    Ns,
    /// `BS`
    Bs,
}

impl TypeTag {
    /// Returns the tag as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::S => "S",
            TypeTag::N => "N",
            TypeTag::B => "B",
            TypeTag::Ss => "SS",
            TypeTag::Ns => "NS",
            TypeTag::Bs => "BS",
        }
    }

    /// Returns true for the set tags.
    pub fn is_set(&self) -> bool {
        matches!(self, TypeTag::Ss | TypeTag::Ns | TypeTag::Bs)
    }

    /// Returns the scalar type of this tag, or of the elements of a set tag.
    pub fn element(&self) -> ScalarType {
        match self {
            TypeTag::S | TypeTag::Ss => ScalarType::S,
            TypeTag::N | TypeTag::Ns => ScalarType::N,
            TypeTag::B | TypeTag::Bs => ScalarType::B,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The scalar wire types; also the attribute types accepted for table keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// String.
    S,
    /// Number.
    N,
    /// Binary.
    B,
}

impl ScalarType {
    /// Returns the type as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        self.tag().as_str()
    }

    /// Returns the scalar tag.
    pub fn tag(&self) -> TypeTag {
        match self {
            ScalarType::S => TypeTag::S,
            ScalarType::N => TypeTag::N,
            ScalarType::B => TypeTag::B,
        }
    }

    /// Returns the set tag built from this type, i.e. the scalar tag with `S` appended.
    pub fn set_tag(&self) -> TypeTag {
        match self {
            ScalarType::S => TypeTag::Ss,
            ScalarType::N => TypeTag::Ns,
            ScalarType::B => TypeTag::Bs,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Binary payloads are written as the text of their bytes, never base64.
mod blob_text {
    use aws_smithy_types::Blob;
    use serde::de::Deserializer;
    use serde::ser::{Error, Serializer};
    use serde::Deserialize;

    pub(super) fn serialize<S: Serializer>(blob: &Blob, serializer: S) -> Result<S::Ok, S::Error> {
        let text = std::str::from_utf8(blob.as_ref()).map_err(S::Error::custom)?;
        serializer.serialize_str(text)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Blob, D::Error> {
        String::deserialize(deserializer).map(|text| Blob::new(text.into_bytes()))
    }
}

mod blob_set_text {
    use aws_smithy_types::Blob;
    use serde::de::Deserializer;
    use serde::ser::{Error, Serializer};
    use serde::Deserialize;

    pub(super) fn serialize<S: Serializer>(
        blobs: &[Blob],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let texts = blobs
            .iter()
            .map(|blob| std::str::from_utf8(blob.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(S::Error::custom)?;
        serializer.collect_seq(texts)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Blob>, D::Error> {
        Vec::<String>::deserialize(deserializer)
            .map(|texts| texts.into_iter().map(|t| Blob::new(t.into_bytes())).collect())
    }
}
