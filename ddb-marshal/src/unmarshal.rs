/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! [`Item`] to record conversion.

use crate::error::ConversionError;
use crate::record::{Record, RecordSchema, ResolvedField};
use crate::registry::{Codecs, Decoded};
use crate::value::Item;

fn unmarshal_with<R: Record>(
    schema: &RecordSchema,
    item: &Item,
    record: &mut R,
) -> Result<(), ConversionError> {
    // Nothing is assigned until every present attribute has decoded and every
    // target slot has been checked.
    let mut decoded: Vec<(&ResolvedField, Decoded)> = Vec::new();
    for field in schema.fields() {
        let Some(value) = item.get(&field.attribute) else {
            continue;
        };
        let value = field
            .codec
            .decode(value.clone())
            .map_err(|err| err.for_field(&field.attribute))?;
        decoded.push((field, value));
    }
    for (field, value) in &decoded {
        field.slot(record)?;
        if value.value_type_id() != field.descriptor.type_id() {
            return Err(ConversionError::invalid_input(format!(
                "decoded a {} for a field of type {}",
                value.value_type_name(),
                field.descriptor.type_name()
            ))
            .for_field(&field.attribute));
        }
    }
    for (field, value) in decoded {
        let slot = field.slot(record)?;
        field
            .codec
            .assign(slot, value)
            .map_err(|err| err.for_field(&field.attribute))?;
    }
    Ok(())
}

impl Codecs {
    /// Decodes `item` into `record`.
    ///
    /// Fields whose attribute is absent from `item` keep their current value.
    /// If any present attribute fails to decode, `record` is left unchanged.
    pub fn unmarshal<R: Record>(&self, item: &Item, record: &mut R) -> Result<(), ConversionError> {
        let schema = self.schema::<R>()?;
        unmarshal_with(&schema, item, record)?;
        tracing::trace!(
            record = schema.record_name(),
            attributes = item.len(),
            "unmarshaled record"
        );
        Ok(())
    }

    /// Decodes each item into a fresh `R::default()`, e.g. for the items of a scan.
    pub fn unmarshal_items<R: Record + Default>(
        &self,
        items: &[Item],
    ) -> Result<Vec<R>, ConversionError> {
        let schema = self.schema::<R>()?;
        items
            .iter()
            .map(|item| {
                let mut record = R::default();
                unmarshal_with(&schema, item, &mut record)?;
                Ok(record)
            })
            .collect()
    }
}
