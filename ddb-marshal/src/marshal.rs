/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Record to [`Item`] conversion.

use crate::error::ConversionError;
use crate::record::{Record, RecordSchema};
use crate::registry::Codecs;
use crate::value::Item;

fn marshal_with<R: Record>(
    schema: &RecordSchema,
    record: &R,
    keys_only: bool,
) -> Result<Item, ConversionError> {
    let mut item = Item::new();
    for field in schema.fields() {
        if keys_only && !field.options.is_key() {
            continue;
        }
        let value = field.read(record)?;
        if field
            .codec
            .is_empty(value)
            .map_err(|err| err.for_field(&field.attribute))?
        {
            tracing::trace!(attribute = %field.attribute, "omitting empty field");
            continue;
        }
        let encoded = field
            .codec
            .encode(value)
            .map_err(|err| err.for_field(&field.attribute))?;
        item.insert(field.attribute.clone(), encoded);
    }
    Ok(item)
}

impl Codecs {
    /// Converts `record` into an item.
    ///
    /// Fields holding their type's zero value are omitted. With `keys_only`,
    /// only fields annotated `hash` or `range` are included.
    pub fn marshal<R: Record>(&self, record: &R, keys_only: bool) -> Result<Item, ConversionError> {
        let schema = self.schema::<R>()?;
        let item = marshal_with(&schema, record, keys_only)?;
        tracing::trace!(
            record = schema.record_name(),
            keys_only,
            attributes = item.len(),
            "marshaled record"
        );
        Ok(item)
    }

    /// Converts the key fields of `record` into an item, e.g. for a get or delete request.
    pub fn marshal_keys<R: Record>(&self, record: &R) -> Result<Item, ConversionError> {
        self.marshal(record, true)
    }

    /// Converts every record, in order, e.g. for a batch put (`keys_only = false`)
    /// or batch delete (`keys_only = true`).
    ///
    /// Stops at the first record that fails.
    pub fn marshal_all<R: Record>(
        &self,
        records: &[R],
        keys_only: bool,
    ) -> Result<Vec<Item>, ConversionError> {
        let schema = self.schema::<R>()?;
        records
            .iter()
            .map(|record| marshal_with(&schema, record, keys_only))
            .collect()
    }
}
