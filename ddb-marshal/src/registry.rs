/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Codec dispatch keyed by field type.
//!
//! [`Codecs`] maps a field's [`TypeId`] to the codec that handles it.
//! Explicitly registered codecs are consulted first, then the built-in table;
//! a type found in neither is reported as
//! [`UnsupportedType`](crate::ConversionErrorKind::UnsupportedType) the first
//! time a record using it is converted.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::codec::{
    BlobCodec, BoolCodec, BytesCodec, DateTimeCodec, FloatCodec, IntegerCodec, ScalarCodec,
    StringCodec, TextCodec,
};
use crate::error::ConversionError;
use crate::record::{FieldDescriptor, Record, RecordSchema};
use crate::value::{AttributeValue, ScalarType};

/// A decoded field value waiting to be assigned.
pub(crate) struct Decoded {
    inner: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Decoded {
    fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// The type of the held value.
    pub(crate) fn value_type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }

    pub(crate) fn value_type_name(&self) -> &'static str {
        self.type_name
    }

    fn downcast<T: 'static>(self) -> Result<T, Self> {
        match self.inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self {
                inner,
                type_name: self.type_name,
            }),
        }
    }
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoded")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Type-erased encode/decode strategy for one field type.
pub(crate) trait AttributeCodec: Send + Sync + fmt::Debug {
    /// The attribute type this field contributes to a key definition, if it can be a key.
    fn key_type(&self) -> Option<ScalarType>;

    /// The element type this codec contributes to a set, if it encodes a single scalar.
    fn set_element(&self) -> Option<ScalarType> {
        None
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool, ConversionError>;

    fn encode(&self, value: &dyn Any) -> Result<AttributeValue, ConversionError>;

    fn decode(&self, value: AttributeValue) -> Result<Decoded, ConversionError>;

    fn assign(&self, slot: &mut dyn Any, value: Decoded) -> Result<(), ConversionError>;
}

fn downcast_ref<T: 'static>(value: &dyn Any) -> Result<&T, ConversionError> {
    value.downcast_ref::<T>().ok_or_else(|| {
        ConversionError::invalid_input(format!("value is not a {}", type_name::<T>()))
    })
}

fn assign_into<T: 'static>(slot: &mut dyn Any, value: Decoded) -> Result<(), ConversionError> {
    let slot = slot.downcast_mut::<T>().ok_or_else(|| {
        ConversionError::invalid_input(format!("field is not a {}", type_name::<T>()))
    })?;
    *slot = value.downcast::<T>().map_err(|value| {
        ConversionError::invalid_input(format!(
            "decoded a {} for a field of type {}",
            value.type_name,
            type_name::<T>()
        ))
    })?;
    Ok(())
}

/// A scalar field.
#[derive(Debug)]
struct Scalar<C>(C);

impl<C: ScalarCodec + fmt::Debug> AttributeCodec for Scalar<C> {
    fn key_type(&self) -> Option<ScalarType> {
        Some(self.0.scalar_type())
    }

    fn set_element(&self) -> Option<ScalarType> {
        Some(self.0.scalar_type())
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool, ConversionError> {
        downcast_ref(value).map(|value| self.0.is_empty(value))
    }

    fn encode(&self, value: &dyn Any) -> Result<AttributeValue, ConversionError> {
        self.0.encode(downcast_ref(value)?)
    }

    fn decode(&self, value: AttributeValue) -> Result<Decoded, ConversionError> {
        self.0.decode(value).map(Decoded::new)
    }

    fn assign(&self, slot: &mut dyn Any, value: Decoded) -> Result<(), ConversionError> {
        assign_into::<C::Value>(slot, value)
    }
}

/// A `Vec` of scalars, stored as the matching set type.
#[derive(Debug)]
struct SetCodec<C>(C);

impl<C: ScalarCodec + fmt::Debug> AttributeCodec for SetCodec<C> {
    fn key_type(&self) -> Option<ScalarType> {
        None
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool, ConversionError> {
        downcast_ref::<Vec<C::Value>>(value).map(Vec::is_empty)
    }

    fn encode(&self, value: &dyn Any) -> Result<AttributeValue, ConversionError> {
        let elements = downcast_ref::<Vec<C::Value>>(value)?
            .iter()
            .map(|element| self.0.encode(element))
            .collect::<Result<Vec<_>, _>>()?;
        AttributeValue::set_of(self.0.scalar_type(), elements)
    }

    fn decode(&self, value: AttributeValue) -> Result<Decoded, ConversionError> {
        let expected = self.0.scalar_type().set_tag();
        if value.type_tag() != expected {
            return Err(ConversionError::type_mismatch(
                expected.as_str(),
                value.type_tag().as_str(),
            ));
        }
        let elements = value.into_elements().unwrap_or_default();
        let decoded = elements
            .into_iter()
            .map(|element| self.0.decode(element))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Decoded::new(decoded))
    }

    fn assign(&self, slot: &mut dyn Any, value: Decoded) -> Result<(), ConversionError> {
        assign_into::<Vec<C::Value>>(slot, value)
    }
}

/// An `Option` of a scalar; `None` is always empty.
#[derive(Debug)]
struct OptionalCodec<C>(C);

impl<C: ScalarCodec + fmt::Debug> AttributeCodec for OptionalCodec<C> {
    fn key_type(&self) -> Option<ScalarType> {
        Some(self.0.scalar_type())
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool, ConversionError> {
        downcast_ref::<Option<C::Value>>(value).map(Option::is_none)
    }

    fn encode(&self, value: &dyn Any) -> Result<AttributeValue, ConversionError> {
        match downcast_ref::<Option<C::Value>>(value)? {
            Some(value) => self.0.encode(value),
            None => Err(ConversionError::invalid_input("cannot encode an absent value")),
        }
    }

    fn decode(&self, value: AttributeValue) -> Result<Decoded, ConversionError> {
        self.0.decode(value).map(|value| Decoded::new(Some(value)))
    }

    fn assign(&self, slot: &mut dyn Any, value: Decoded) -> Result<(), ConversionError> {
        assign_into::<Option<C::Value>>(slot, value)
    }
}

/// A fixed-size array of any type with a scalar codec, stored as the matching set type.
///
/// Elements go through the element type's own codec, so arrays of registered
/// types work without registering the array type.
struct ArrayCodec<T, const N: usize> {
    element: Arc<dyn AttributeCodec>,
    scalar_type: ScalarType,
    _array: PhantomData<fn() -> [T; N]>,
}

impl<T: Send + Sync + 'static, const N: usize> ArrayCodec<T, N> {
    fn build(
        element: Arc<dyn AttributeCodec>,
        scalar_type: ScalarType,
    ) -> Arc<dyn AttributeCodec> {
        Arc::new(Self {
            element,
            scalar_type,
            _array: PhantomData,
        })
    }
}

impl<T, const N: usize> fmt::Debug for ArrayCodec<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayCodec")
            .field("element", &self.element)
            .field("len", &N)
            .finish()
    }
}

impl<T: Send + Sync + 'static, const N: usize> AttributeCodec for ArrayCodec<T, N> {
    fn key_type(&self) -> Option<ScalarType> {
        None
    }

    fn is_empty(&self, value: &dyn Any) -> Result<bool, ConversionError> {
        downcast_ref::<[T; N]>(value).map(|array| array.is_empty())
    }

    fn encode(&self, value: &dyn Any) -> Result<AttributeValue, ConversionError> {
        let elements = downcast_ref::<[T; N]>(value)?
            .iter()
            .map(|element| self.element.encode(element))
            .collect::<Result<Vec<_>, _>>()?;
        AttributeValue::set_of(self.scalar_type, elements)
    }

    fn decode(&self, value: AttributeValue) -> Result<Decoded, ConversionError> {
        let expected = self.scalar_type.set_tag();
        if value.type_tag() != expected {
            return Err(ConversionError::type_mismatch(
                expected.as_str(),
                value.type_tag().as_str(),
            ));
        }
        let elements = value.into_elements().unwrap_or_default();
        if elements.len() != N {
            return Err(ConversionError::scalar_parse(format!(
                "expected {} elements for {}, got {}",
                N,
                type_name::<[T; N]>(),
                elements.len()
            )));
        }
        let decoded = elements
            .into_iter()
            .map(|element| {
                self.element.decode(element)?.downcast::<T>().map_err(|value| {
                    ConversionError::invalid_input(format!(
                        "element codec produced a {} instead of a {}",
                        value.type_name,
                        type_name::<T>()
                    ))
                })
            })
            .collect::<Result<Vec<T>, _>>()?;
        let array = <[T; N]>::try_from(decoded).map_err(|decoded| {
            ConversionError::scalar_parse(format!(
                "expected {} elements, got {}",
                N,
                decoded.len()
            ))
        })?;
        Ok(Decoded::new(array))
    }

    fn assign(&self, slot: &mut dyn Any, value: Decoded) -> Result<(), ConversionError> {
        assign_into::<[T; N]>(slot, value)
    }
}

/// How to build the codec of a fixed-size array field from its element codec.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ArrayShape {
    pub(crate) element_type_id: TypeId,
    pub(crate) element_type_name: &'static str,
    pub(crate) build: fn(Arc<dyn AttributeCodec>, ScalarType) -> Arc<dyn AttributeCodec>,
}

impl ArrayShape {
    pub(crate) fn of<T: Send + Sync + 'static, const N: usize>() -> Self {
        Self {
            element_type_id: TypeId::of::<T>(),
            element_type_name: type_name::<T>(),
            build: ArrayCodec::<T, N>::build,
        }
    }
}

type CodecTable = HashMap<TypeId, Arc<dyn AttributeCodec>>;
type Constructor = fn() -> Arc<dyn AttributeCodec>;

fn scalar<C: ScalarCodec + Default + fmt::Debug>() -> Arc<dyn AttributeCodec> {
    Arc::new(Scalar(C::default()))
}

fn set<C: ScalarCodec + Default + fmt::Debug>() -> Arc<dyn AttributeCodec> {
    Arc::new(SetCodec(C::default()))
}

fn optional<C: ScalarCodec + Default + fmt::Debug>() -> Arc<dyn AttributeCodec> {
    Arc::new(OptionalCodec(C::default()))
}

macro_rules! builtin {
    ($table:ident, $($codec:ty),+ $(,)?) => {
        $(
            $table.insert(TypeId::of::<<$codec as ScalarCodec>::Value>(), scalar::<$codec> as Constructor);
            $table.insert(TypeId::of::<Vec<<$codec as ScalarCodec>::Value>>(), set::<$codec> as Constructor);
            $table.insert(TypeId::of::<Option<<$codec as ScalarCodec>::Value>>(), optional::<$codec> as Constructor);
        )+
    };
}

fn builtins() -> &'static HashMap<TypeId, Constructor> {
    static BUILTINS: OnceLock<HashMap<TypeId, Constructor>> = OnceLock::new();
    BUILTINS.get_or_init(|| {
        let mut table = HashMap::new();
        builtin!(
            table,
            BoolCodec,
            IntegerCodec<i8>,
            IntegerCodec<i16>,
            IntegerCodec<i32>,
            IntegerCodec<i64>,
            IntegerCodec<isize>,
            IntegerCodec<u8>,
            IntegerCodec<u16>,
            IntegerCodec<u32>,
            IntegerCodec<u64>,
            IntegerCodec<usize>,
            FloatCodec<f32>,
            FloatCodec<f64>,
            StringCodec,
            BlobCodec,
            DateTimeCodec,
            // Must come after `IntegerCodec<u8>`: `Vec<u8>` is binary, not a number set.
            BytesCodec,
        );
        table
    })
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of field codecs and cache of record schemas.
///
/// A `Codecs` is cheap to share: resolutions are memoized behind locks and
/// concurrent callers may populate the caches at the same time. Use
/// [`Codecs::builder`] to add codecs for custom field types; the free
/// functions of this crate use a registry holding only the built-ins.
pub struct Codecs {
    registered: CodecTable,
    resolved: RwLock<CodecTable>,
    arrays: RwLock<CodecTable>,
    records: RwLock<HashMap<TypeId, Arc<RecordSchema>>>,
}

impl Codecs {
    /// Creates a registry with only the built-in codecs.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a [`CodecsBuilder`].
    pub fn builder() -> CodecsBuilder {
        CodecsBuilder::default()
    }

    /// Returns the registry shared by the free functions of this crate.
    pub fn shared() -> &'static Codecs {
        static SHARED: OnceLock<Codecs> = OnceLock::new();
        SHARED.get_or_init(Codecs::new)
    }

    /// Returns true if fields of type `T` can be converted.
    ///
    /// Fixed-size array fields are not covered: their codec is built from the
    /// element type when a record declares them.
    pub fn supports<T: Any>(&self) -> bool {
        self.resolve(TypeId::of::<T>(), type_name::<T>()).is_ok()
    }

    pub(crate) fn resolve(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Arc<dyn AttributeCodec>, ConversionError> {
        if let Some(codec) = self.registered.get(&type_id) {
            return Ok(codec.clone());
        }
        if let Some(codec) = read(&self.resolved).get(&type_id) {
            return Ok(codec.clone());
        }
        let Some(construct) = builtins().get(&type_id) else {
            tracing::debug!(type_name, "no codec registered for field type");
            return Err(ConversionError::unsupported_type(type_name));
        };
        let codec = construct();
        tracing::trace!(type_name, codec = ?codec, "resolved built-in codec");
        // Racing resolutions build equivalent codecs; the first one stored wins.
        Ok(write(&self.resolved).entry(type_id).or_insert(codec).clone())
    }

    /// Resolves the codec of a record field, building array codecs from their element codec.
    pub(crate) fn resolve_field(
        &self,
        descriptor: &FieldDescriptor,
    ) -> Result<Arc<dyn AttributeCodec>, ConversionError> {
        let Some(shape) = descriptor.array_shape() else {
            return self.resolve(descriptor.type_id(), descriptor.type_name());
        };
        if let Some(codec) = self.registered.get(&descriptor.type_id()) {
            return Ok(codec.clone());
        }
        if let Some(codec) = read(&self.arrays).get(&descriptor.type_id()) {
            return Ok(codec.clone());
        }
        let element = self
            .resolve(shape.element_type_id, shape.element_type_name)
            .map_err(|_| ConversionError::unsupported_type(descriptor.type_name()))?;
        let Some(scalar_type) = element.set_element() else {
            tracing::debug!(
                type_name = descriptor.type_name(),
                "array element is not a scalar"
            );
            return Err(ConversionError::unsupported_type(descriptor.type_name()));
        };
        let codec = (shape.build)(element, scalar_type);
        tracing::trace!(
            type_name = descriptor.type_name(),
            codec = ?codec,
            "resolved array codec"
        );
        Ok(write(&self.arrays)
            .entry(descriptor.type_id())
            .or_insert(codec)
            .clone())
    }

    pub(crate) fn schema<R: Record>(&self) -> Result<Arc<RecordSchema>, ConversionError> {
        let record = TypeId::of::<R>();
        if let Some(schema) = read(&self.records).get(&record) {
            return Ok(schema.clone());
        }
        let schema = Arc::new(RecordSchema::build::<R>(self)?);
        tracing::trace!(?schema, "built record schema");
        Ok(write(&self.records).entry(record).or_insert(schema).clone())
    }
}

impl Default for Codecs {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Codecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codecs")
            .field("registered", &self.registered.len())
            .field("resolved", &read(&self.resolved).len())
            .field("arrays", &read(&self.arrays).len())
            .field("records", &read(&self.records).len())
            .finish()
    }
}

/// Builder for [`Codecs`].
#[derive(Default)]
pub struct CodecsBuilder {
    registered: CodecTable,
}

impl CodecsBuilder {
    /// Registers `codec` for `C::Value`, `Vec<C::Value>` and `Option<C::Value>`.
    ///
    /// Registered codecs take precedence over the built-in ones.
    pub fn scalar<C>(mut self, codec: C) -> Self
    where
        C: ScalarCodec + Clone + fmt::Debug,
    {
        self.registered
            .insert(TypeId::of::<C::Value>(), Arc::new(Scalar(codec.clone())));
        self.registered
            .insert(TypeId::of::<Vec<C::Value>>(), Arc::new(SetCodec(codec.clone())));
        self.registered
            .insert(TypeId::of::<Option<C::Value>>(), Arc::new(OptionalCodec(codec)));
        self
    }

    /// Stores `T` as a string through its [`Display`](fmt::Display) and [`FromStr`] implementations.
    pub fn text<T>(self) -> Self
    where
        T: fmt::Display + FromStr + Send + Sync + 'static,
        T::Err: fmt::Display,
    {
        self.scalar(TextCodec::<T>::new())
    }

    /// Builds the registry.
    pub fn build(self) -> Codecs {
        Codecs {
            registered: self.registered,
            resolved: RwLock::new(HashMap::new()),
            arrays: RwLock::new(HashMap::new()),
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl fmt::Debug for CodecsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecsBuilder")
            .field("registered", &self.registered.len())
            .finish()
    }
}
