/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_cfg))]
/* End of automatically managed default lints */

//! Tag-driven conversion between Rust records and DynamoDB attribute values.
//!
//! A [`Record`] is a struct whose fields carry optional `#[dynamo = "..."]`
//! annotations of the form `name,opt1,opt2`:
//!
//! - `-` excludes the field from every conversion.
//! - A non-empty `name` overrides the attribute name; otherwise the field name is used.
//! - `hash` and `range` mark the partition and sort key.
//!
//! ```
//! use ddb_marshal::{AttributeValue, Record};
//!
//! #[derive(Record, Default)]
//! struct Paper {
//!     #[dynamo = "title,hash"]
//!     title: String,
//!     #[dynamo = "year,range"]
//!     year: i64,
//!     #[dynamo = "score"]
//!     score: f64,
//!     #[dynamo = "authors"]
//!     authors: Vec<String>,
//! }
//!
//! let paper = Paper {
//!     title: "X".into(),
//!     year: 2007,
//!     score: 1.5,
//!     authors: vec!["A".into(), "B".into()],
//! };
//! let item = ddb_marshal::marshal(&paper, false)?;
//! assert_eq!(item["year"], AttributeValue::N("2007".into()));
//! assert_eq!(item["authors"], AttributeValue::Ss(vec!["A".into(), "B".into()]));
//!
//! let keys = ddb_marshal::marshal_keys(&paper)?;
//! assert_eq!(keys.len(), 2);
//!
//! let mut decoded = Paper::default();
//! ddb_marshal::unmarshal(&item, &mut decoded)?;
//! assert_eq!(decoded.authors, paper.authors);
//! # Ok::<(), ddb_marshal::ConversionError>(())
//! ```
//!
//! Fields holding their type's zero value (`0`, `false`, `""`, an empty `Vec`,
//! `None`, the Unix epoch) are left out of marshaled items. `Vec<T>` (other
//! than the binary `Vec<u8>`) and `[T; N]` fields of scalar `T` are stored as
//! sets; only a zero-length array counts as empty. Field types without
//! a built-in codec can be supported through [`Codecs::builder`].

#![warn(missing_docs, rustdoc::missing_crate_level_docs, rust_2018_idioms)]

// Lets the derive's `::ddb_marshal` paths resolve in this crate's unit tests.
#[cfg(test)]
extern crate self as ddb_marshal;

pub mod codec;
pub mod error;
mod marshal;
mod record;
mod registry;
pub mod schema;
pub mod tag;
mod unmarshal;
pub mod value;

pub use codec::ScalarCodec;
pub use error::{ConversionError, ConversionErrorKind};
pub use record::{FieldDescriptor, Record};
pub use registry::{Codecs, CodecsBuilder};
pub use schema::{
    AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput, TableSchema,
};
pub use value::{AttributeValue, Item, ScalarType, TypeTag};

#[cfg(feature = "derive")]
#[cfg_attr(docsrs, doc(cfg(feature = "derive")))]
pub use ddb_marshal_macros::Record;

/// Converts `record` into an item using the built-in codecs.
///
/// See [`Codecs::marshal`].
pub fn marshal<R: Record>(record: &R, keys_only: bool) -> Result<Item, ConversionError> {
    Codecs::shared().marshal(record, keys_only)
}

/// Converts the key fields of `record` into an item using the built-in codecs.
pub fn marshal_keys<R: Record>(record: &R) -> Result<Item, ConversionError> {
    Codecs::shared().marshal_keys(record)
}

/// Decodes `item` into `record` using the built-in codecs.
///
/// See [`Codecs::unmarshal`].
pub fn unmarshal<R: Record>(item: &Item, record: &mut R) -> Result<(), ConversionError> {
    Codecs::shared().unmarshal(item, record)
}

/// Decodes each item into a fresh record using the built-in codecs.
pub fn unmarshal_items<R: Record + Default>(items: &[Item]) -> Result<Vec<R>, ConversionError> {
    Codecs::shared().unmarshal_items(items)
}

/// Lists the key attribute definitions of `R`.
pub fn attribute_definitions<R: Record>() -> Result<Vec<AttributeDefinition>, ConversionError> {
    Codecs::shared().attribute_definitions::<R>()
}

/// Lists the key schema of `R`.
pub fn key_schema<R: Record>() -> Result<Vec<KeySchemaElement>, ConversionError> {
    Codecs::shared().key_schema::<R>()
}

/// Derives the table-creation schema of `R`.
pub fn table_schema<R: Record>(
    provisioned_throughput: ProvisionedThroughput,
) -> Result<TableSchema, ConversionError> {
    Codecs::shared().table_schema::<R>(provisioned_throughput)
}
