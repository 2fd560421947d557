/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Table-creation metadata derived from field annotations.
//!
//! Only key fields contribute, and only their codecs are resolved: a record
//! whose other fields have no codec still has a key schema. Values are never
//! read; the attribute type of a key comes from the codec for the field's type.

use serde::{Deserialize, Serialize};
use std::any::type_name;
use std::fmt;

use crate::error::ConversionError;
use crate::record::{key_fields, KeyField, Record};
use crate::registry::Codecs;
use crate::value::ScalarType;

/// The role of a key attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    /// Partition key.
    Hash,
    /// Sort key.
    Range,
}

impl KeyType {
    /// Returns the key type as the service spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Hash => "HASH",
            KeyType::Range => "RANGE",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and attribute type of one key attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    /// Attribute name.
    pub attribute_name: String,
    /// Scalar type of the attribute.
    pub attribute_type: ScalarType,
}

/// Name and role of one key attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    /// Attribute name.
    pub attribute_name: String,
    /// Whether the attribute is the partition or the sort key.
    pub key_type: KeyType,
}

/// Read and write capacity requested for a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    /// Read capacity units.
    pub read_capacity_units: u64,
    /// Write capacity units.
    pub write_capacity_units: u64,
}

impl ProvisionedThroughput {
    /// Creates a throughput setting.
    pub fn new(read_capacity_units: u64, write_capacity_units: u64) -> Self {
        Self {
            read_capacity_units,
            write_capacity_units,
        }
    }
}

/// Everything a table-creation request needs from a record type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableSchema {
    /// Key attribute definitions, in field declaration order.
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// Key schema, in field declaration order.
    pub key_schema: Vec<KeySchemaElement>,
    /// Requested capacity.
    pub provisioned_throughput: ProvisionedThroughput,
}

impl Codecs {
    fn key_scalar_type(&self, field: &KeyField) -> Result<ScalarType, ConversionError> {
        let codec = self
            .resolve_field(&field.descriptor)
            .map_err(|err| err.for_field(&field.attribute))?;
        codec.key_type().ok_or_else(|| {
            ConversionError::invalid_key_type(field.descriptor.type_name()).for_field(&field.attribute)
        })
    }

    fn definitions(&self, keys: &[KeyField]) -> Result<Vec<AttributeDefinition>, ConversionError> {
        keys.iter()
            .map(|field| {
                self.key_scalar_type(field).map(|attribute_type| AttributeDefinition {
                    attribute_name: field.attribute.clone(),
                    attribute_type,
                })
            })
            .collect()
    }

    /// Lists the name and attribute type of every key field of `R`.
    pub fn attribute_definitions<R: Record>(
        &self,
    ) -> Result<Vec<AttributeDefinition>, ConversionError> {
        let definitions = self.definitions(&key_fields::<R>()?)?;
        tracing::trace!(record = type_name::<R>(), ?definitions, "derived attribute definitions");
        Ok(definitions)
    }

    /// Lists the name and key role of every key field of `R`.
    ///
    /// Reads only the field annotations; no codec is looked up.
    pub fn key_schema<R: Record>(&self) -> Result<Vec<KeySchemaElement>, ConversionError> {
        Ok(key_elements(&key_fields::<R>()?))
    }

    /// Derives the full table-creation schema of `R`.
    pub fn table_schema<R: Record>(
        &self,
        provisioned_throughput: ProvisionedThroughput,
    ) -> Result<TableSchema, ConversionError> {
        let keys = key_fields::<R>()?;
        Ok(TableSchema {
            attribute_definitions: self.definitions(&keys)?,
            key_schema: key_elements(&keys),
            provisioned_throughput,
        })
    }
}

fn key_elements(keys: &[KeyField]) -> Vec<KeySchemaElement> {
    keys.iter()
        .map(|field| KeySchemaElement {
            attribute_name: field.attribute.clone(),
            key_type: field.key_type,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionErrorKind;
    use crate::Record;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Record, Default)]
    struct Keyed {
        #[dynamo = "h,hash"]
        hash: String,
        #[dynamo = "r,range"]
        range: i32,
        #[dynamo = "body"]
        body: String,
    }

    #[derive(Record, Default)]
    struct SetKey {
        #[dynamo = "tags,hash"]
        tags: Vec<String>,
    }

    #[derive(Record, Default)]
    struct OptionalKey {
        #[dynamo = "id,hash"]
        id: Option<u64>,
        #[dynamo = "raw,range"]
        raw: Vec<u8>,
    }

    #[derive(Record, Default)]
    struct WithAttributes {
        #[dynamo = "id,hash"]
        id: String,
        #[dynamo = "attributes"]
        attributes: HashMap<String, String>,
    }

    #[derive(Record, Default)]
    struct MapKey {
        #[dynamo = "lookup,hash"]
        lookup: HashMap<String, String>,
    }

    #[test]
    fn derives_key_metadata_in_declaration_order() {
        let codecs = Codecs::new();
        assert_eq!(
            codecs.attribute_definitions::<Keyed>().unwrap(),
            vec![
                AttributeDefinition {
                    attribute_name: "h".into(),
                    attribute_type: ScalarType::S
                },
                AttributeDefinition {
                    attribute_name: "r".into(),
                    attribute_type: ScalarType::N
                },
            ]
        );
        assert_eq!(
            codecs.key_schema::<Keyed>().unwrap(),
            vec![
                KeySchemaElement {
                    attribute_name: "h".into(),
                    key_type: KeyType::Hash
                },
                KeySchemaElement {
                    attribute_name: "r".into(),
                    key_type: KeyType::Range
                },
            ]
        );
    }

    #[test]
    fn option_and_byte_keys_use_their_scalar_type() {
        let definitions = Codecs::new().attribute_definitions::<OptionalKey>().unwrap();
        assert_eq!(definitions[0].attribute_type, ScalarType::N);
        assert_eq!(definitions[1].attribute_type, ScalarType::B);
    }

    #[test]
    fn set_keys_are_rejected() {
        let err = Codecs::new().attribute_definitions::<SetKey>().unwrap_err();
        assert!(matches!(err.kind(), ConversionErrorKind::InvalidKeyType { .. }));
        assert_eq!(err.field(), Some("tags"));
        // Key roles come from the tag, so the key schema still lists the field.
        assert_eq!(Codecs::new().key_schema::<SetKey>().unwrap().len(), 1);
    }

    #[test]
    fn unsupported_non_key_fields_do_not_block_key_metadata() {
        let codecs = Codecs::new();
        assert_eq!(
            codecs.key_schema::<WithAttributes>().unwrap(),
            vec![KeySchemaElement {
                attribute_name: "id".into(),
                key_type: KeyType::Hash
            }]
        );
        assert_eq!(
            codecs.attribute_definitions::<WithAttributes>().unwrap(),
            vec![AttributeDefinition {
                attribute_name: "id".into(),
                attribute_type: ScalarType::S
            }]
        );
        // Converting values still needs every codec.
        let err = codecs.marshal(&WithAttributes::default(), false).unwrap_err();
        assert!(matches!(err.kind(), ConversionErrorKind::UnsupportedType { .. }));
    }

    #[test]
    fn unsupported_key_fields_are_reported() {
        let err = Codecs::new().attribute_definitions::<MapKey>().unwrap_err();
        assert!(matches!(err.kind(), ConversionErrorKind::UnsupportedType { .. }));
        assert_eq!(err.field(), Some("lookup"));
        assert_eq!(Codecs::new().key_schema::<MapKey>().unwrap().len(), 1);
    }

    #[test]
    fn serializes_in_service_shape() {
        let schema = Codecs::new()
            .table_schema::<Keyed>(ProvisionedThroughput::new(5, 10))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "AttributeDefinitions": [
                    {"AttributeName": "h", "AttributeType": "S"},
                    {"AttributeName": "r", "AttributeType": "N"},
                ],
                "KeySchema": [
                    {"AttributeName": "h", "KeyType": "HASH"},
                    {"AttributeName": "r", "KeyType": "RANGE"},
                ],
                "ProvisionedThroughput": {"ReadCapacityUnits": 5, "WriteCapacityUnits": 10},
            })
        );
    }
}
