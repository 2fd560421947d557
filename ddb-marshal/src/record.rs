/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Records and their field descriptors.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::ConversionError;
use crate::registry::{ArrayShape, AttributeCodec, Codecs};
use crate::schema::KeyType;
use crate::tag::FieldOptions;

/// A struct whose fields can be converted to and from an [`Item`](crate::Item).
///
/// Usually derived:
///
/// ```
/// use ddb_marshal::Record;
///
/// #[derive(Record, Default)]
/// struct Paper {
///     #[dynamo = "title,hash"]
///     title: String,
///     #[dynamo = "year,range"]
///     year: i64,
///     #[dynamo = "score"]
///     score: f64,
///     #[dynamo = "-"]
///     cached_rank: usize,
/// }
/// ```
///
/// Hand-written implementations must return, for every index `i` listed by
/// [`Record::fields`], a reference to a value of the declared type from both
/// [`Record::field`] and [`Record::field_mut`].
pub trait Record: Any {
    /// Describes the fields in declaration order.
    fn fields() -> Vec<FieldDescriptor>
    where
        Self: Sized;

    /// Returns the field at `index`.
    fn field(&self, index: usize) -> Option<&dyn Any>;

    /// Returns the field at `index` for assignment.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Any>;
}

/// Static description of one record field.
#[derive(Clone, Copy, Debug)]
pub struct FieldDescriptor {
    name: &'static str,
    tag: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    array: Option<ArrayShape>,
}

impl FieldDescriptor {
    /// Describes a field named `name` of type `T` carrying the raw annotation `tag`.
    pub fn new<T: Any>(name: &'static str, tag: &'static str) -> Self {
        Self {
            name,
            tag,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            array: None,
        }
    }

    /// Describes a field of type `[T; N]`.
    ///
    /// The array is stored as a set and needs no codec of its own: any `T`
    /// with a scalar codec, built in or registered, works.
    pub fn array<T: Any + Send + Sync, const N: usize>(
        name: &'static str,
        tag: &'static str,
    ) -> Self {
        Self {
            array: Some(ArrayShape::of::<T, N>()),
            ..Self::new::<[T; N]>(name, tag)
        }
    }

    /// The declared field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The raw annotation, `""` when the field has none.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// The field's type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The field's type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn array_shape(&self) -> Option<&ArrayShape> {
        self.array.as_ref()
    }
}

/// A record type's fields after tag parsing and codec resolution.
///
/// Excluded fields are dropped; the remaining fields keep declaration order.
pub(crate) struct RecordSchema {
    record: &'static str,
    fields: Vec<ResolvedField>,
}

pub(crate) struct ResolvedField {
    pub(crate) index: usize,
    pub(crate) attribute: String,
    pub(crate) options: FieldOptions,
    pub(crate) descriptor: FieldDescriptor,
    pub(crate) codec: Arc<dyn AttributeCodec>,
}

/// A field that survived tag parsing, before any codec lookup.
struct TaggedField {
    index: usize,
    attribute: String,
    options: FieldOptions,
    descriptor: FieldDescriptor,
}

/// Parses and validates the tags of `R`, dropping excluded fields.
fn tagged_fields<R: Record>() -> Result<Vec<TaggedField>, ConversionError> {
    let mut fields = Vec::new();
    for (index, descriptor) in R::fields().into_iter().enumerate() {
        let options = FieldOptions::parse(descriptor.tag());
        if options.excluded {
            continue;
        }
        let attribute = options.attribute_name(descriptor.name()).to_string();
        if let Err(err) = options.validate() {
            tracing::debug!(record = type_name::<R>(), tag = descriptor.tag(), "rejected field tag");
            return Err(err.for_field(attribute));
        }
        fields.push(TaggedField {
            index,
            attribute,
            options,
            descriptor,
        });
    }
    Ok(fields)
}

/// A key field of a record, known from its tag alone.
pub(crate) struct KeyField {
    pub(crate) attribute: String,
    pub(crate) key_type: KeyType,
    pub(crate) descriptor: FieldDescriptor,
}

/// Lists the key fields of `R` in declaration order without resolving any codec.
pub(crate) fn key_fields<R: Record>() -> Result<Vec<KeyField>, ConversionError> {
    Ok(tagged_fields::<R>()?
        .into_iter()
        .filter_map(|field| {
            field.options.key_type().map(|key_type| KeyField {
                attribute: field.attribute,
                key_type,
                descriptor: field.descriptor,
            })
        })
        .collect())
}

impl RecordSchema {
    pub(crate) fn build<R: Record>(codecs: &Codecs) -> Result<Self, ConversionError> {
        let fields = tagged_fields::<R>()?
            .into_iter()
            .map(|field| {
                let codec = codecs
                    .resolve_field(&field.descriptor)
                    .map_err(|err| err.for_field(&field.attribute))?;
                Ok(ResolvedField {
                    index: field.index,
                    attribute: field.attribute,
                    options: field.options,
                    descriptor: field.descriptor,
                    codec,
                })
            })
            .collect::<Result<Vec<_>, ConversionError>>()?;
        Ok(Self {
            record: type_name::<R>(),
            fields,
        })
    }

    pub(crate) fn record_name(&self) -> &'static str {
        self.record
    }

    pub(crate) fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }
}

impl fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("record", &self.record)
            .field(
                "attributes",
                &self.fields.iter().map(|f| &f.attribute).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ResolvedField {
    /// Reads the field from `record`, checking it against the descriptor.
    pub(crate) fn read<'a, R: Record>(&self, record: &'a R) -> Result<&'a dyn Any, ConversionError> {
        let value = record.field(self.index).ok_or_else(|| self.missing::<R>())?;
        if value.type_id() != self.descriptor.type_id() {
            return Err(self.wrong_type::<R>());
        }
        Ok(value)
    }

    /// Borrows the field of `record` for assignment.
    pub(crate) fn slot<'a, R: Record>(
        &self,
        record: &'a mut R,
    ) -> Result<&'a mut dyn Any, ConversionError> {
        let slot = record
            .field_mut(self.index)
            .ok_or_else(|| self.missing::<R>())?;
        if (*slot).type_id() != self.descriptor.type_id() {
            return Err(self.wrong_type::<R>());
        }
        Ok(slot)
    }

    fn missing<R>(&self) -> ConversionError {
        ConversionError::invalid_input(format!(
            "{} describes field '{}' at index {} but does not expose it",
            type_name::<R>(),
            self.descriptor.name(),
            self.index
        ))
    }

    fn wrong_type<R>(&self) -> ConversionError {
        ConversionError::invalid_input(format!(
            "{} exposes field '{}' with a type other than the declared {}",
            type_name::<R>(),
            self.descriptor.name(),
            self.descriptor.type_name()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionErrorKind;
    use crate::Record;
    use tracing_test::traced_test;

    #[derive(Record, Default)]
    struct Account {
        #[dynamo = "id,hash"]
        r#id: String,
        #[dynamo = "-"]
        session: Vec<String>,
        balance: i64,
        #[dynamo = "Owner"]
        owner: Option<String>,
    }

    #[derive(Record, Default)]
    struct Broken {
        #[dynamo = "k,hash,range"]
        k: String,
    }

    #[test]
    fn descriptors_follow_declaration_order() {
        let fields = Account::fields();
        assert_eq!(
            fields.iter().map(FieldDescriptor::name).collect::<Vec<_>>(),
            vec!["id", "session", "balance", "owner"]
        );
        assert_eq!(fields[0].tag(), "id,hash");
        assert_eq!(fields[2].tag(), "");
        assert_eq!(fields[2].type_id(), TypeId::of::<i64>());
    }

    #[test]
    fn schema_skips_excluded_fields() {
        let schema = RecordSchema::build::<Account>(&Codecs::new()).unwrap();
        let attributes: Vec<_> = schema.fields().iter().map(|f| f.attribute.as_str()).collect();
        assert_eq!(attributes, vec!["id", "balance", "Owner"]);
        assert_eq!(schema.fields()[0].descriptor.name(), "id");
        assert_eq!(schema.fields()[1].index, 2);
    }

    #[traced_test]
    #[test]
    fn contradictory_tags_are_rejected() {
        let err = RecordSchema::build::<Broken>(&Codecs::new()).unwrap_err();
        assert!(matches!(err.kind(), ConversionErrorKind::InvalidTag { .. }));
        assert_eq!(err.field(), Some("k"));
        assert!(logs_contain("rejected field tag"));
    }

    #[test]
    fn key_fields_come_from_tags() {
        let keys = key_fields::<Account>().unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].attribute, "id");
        assert_eq!(keys[0].key_type, KeyType::Hash);
        assert!(key_fields::<Broken>().is_err());
    }

    #[test]
    fn array_fields_carry_their_element_type() {
        let descriptor = FieldDescriptor::array::<u16, 3>("dims", "");
        assert_eq!(descriptor.type_id(), TypeId::of::<[u16; 3]>());
        let shape = descriptor.array_shape().unwrap();
        assert_eq!(shape.element_type_id, TypeId::of::<u16>());
        assert!(FieldDescriptor::new::<Vec<u16>>("dims", "").array_shape().is_none());
    }

    #[test]
    fn slot_checks_declared_type() {
        let schema = RecordSchema::build::<Account>(&Codecs::new()).unwrap();
        let mut account = Account::default();
        assert!(schema.fields()[1].slot(&mut account).is_ok());
    }

    #[test]
    fn read_checks_declared_type() {
        let schema = RecordSchema::build::<Account>(&Codecs::new()).unwrap();
        let account = Account {
            balance: 12,
            ..Default::default()
        };
        let value = schema.fields()[1].read(&account).unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&12));
    }
}
