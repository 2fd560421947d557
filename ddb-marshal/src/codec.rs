/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Scalar codecs for the built-in field types.
//!
//! Each codec fixes the wire type and textual encoding of one value type.
//! Sets and optional fields are built on top of these by the registry, so a
//! codec only ever sees a single scalar.

use aws_smithy_types::date_time::Format;
use aws_smithy_types::{Blob, DateTime};
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::num::ParseFloatError;
use std::str::FromStr;

use crate::error::ConversionError;
use crate::value::{AttributeValue, ScalarType};

/// Encodes and decodes one scalar value type.
///
/// Register implementations with [`CodecsBuilder::scalar`](crate::CodecsBuilder::scalar)
/// to support additional field types; the registry derives the set form
/// (`Vec<Value>`) and the optional form (`Option<Value>`) automatically.
pub trait ScalarCodec: Send + Sync + 'static {
    /// The Rust type this codec handles.
    type Value: Send + Sync + 'static;

    /// The wire type produced by [`ScalarCodec::encode`].
    fn scalar_type(&self) -> ScalarType;

    /// Converts a value to its tagged wire form.
    fn encode(&self, value: &Self::Value) -> Result<AttributeValue, ConversionError>;

    /// Constructs a value from its tagged wire form.
    fn decode(&self, value: AttributeValue) -> Result<Self::Value, ConversionError>;

    /// Returns true if `value` is the zero value of its type and should be omitted.
    fn is_empty(&self, value: &Self::Value) -> bool;
}

fn mismatch(expected: ScalarType, actual: &AttributeValue) -> ConversionError {
    ConversionError::type_mismatch(expected.as_str(), actual.type_tag().as_str())
}

fn take_s(value: AttributeValue) -> Result<String, ConversionError> {
    match value {
        AttributeValue::S(s) => Ok(s),
        other => Err(mismatch(ScalarType::S, &other)),
    }
}

fn take_n(value: AttributeValue) -> Result<String, ConversionError> {
    match value {
        AttributeValue::N(n) => Ok(n),
        other => Err(mismatch(ScalarType::N, &other)),
    }
}

fn take_b(value: AttributeValue) -> Result<Blob, ConversionError> {
    match value {
        AttributeValue::B(b) => Ok(b),
        other => Err(mismatch(ScalarType::B, &other)),
    }
}

// ============================================================================
// Booleans
// ============================================================================

/// `bool` as the string `"true"` or `"false"`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoolCodec;

impl ScalarCodec for BoolCodec {
    type Value = bool;

    fn scalar_type(&self) -> ScalarType {
        ScalarType::S
    }

    fn encode(&self, value: &bool) -> Result<AttributeValue, ConversionError> {
        Ok(AttributeValue::S(value.to_string()))
    }

    fn decode(&self, value: AttributeValue) -> Result<bool, ConversionError> {
        let text = take_s(value)?;
        parse_bool(&text).ok_or_else(|| {
            ConversionError::scalar_parse(format!("cannot parse '{}' as bool", text))
        })
    }

    fn is_empty(&self, value: &bool) -> bool {
        !*value
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Integers
// ============================================================================

mod sealed {
    pub trait Sealed {}
}

/// Primitive integer types with a built-in codec.
pub trait Integer:
    sealed::Sealed + Copy + Default + PartialEq + fmt::Display + TryFrom<i128> + Send + Sync + 'static
{
    #[doc(hidden)]
    const SIGNED: bool;
}

macro_rules! integer {
    ($signed:literal => $($ty:ty),+) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Integer for $ty {
                const SIGNED: bool = $signed;
            }
        )+
    };
}

integer!(true => i8, i16, i32, i64, isize);
integer!(false => u8, u16, u32, u64, usize);

/// Integers as base-10 numbers.
///
/// Decoding also accepts prefixed literals (`0x1f`, `0o17`, `0b101`, `017`),
/// with single `_` separators between digits. Values outside the range of
/// the field type are rejected.
pub struct IntegerCodec<T>(PhantomData<fn() -> T>);

impl<T> IntegerCodec<T> {
    /// Creates the codec.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for IntegerCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for IntegerCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IntegerCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntegerCodec<{}>", type_name::<T>())
    }
}

impl<T: Integer> ScalarCodec for IntegerCodec<T> {
    type Value = T;

    fn scalar_type(&self) -> ScalarType {
        ScalarType::N
    }

    fn encode(&self, value: &T) -> Result<AttributeValue, ConversionError> {
        Ok(AttributeValue::N(value.to_string()))
    }

    fn decode(&self, value: AttributeValue) -> Result<T, ConversionError> {
        let text = take_n(value)?;
        let failed = |reason: &str| {
            ConversionError::scalar_parse(format!(
                "cannot parse '{}' as {}: {}",
                text,
                type_name::<T>(),
                reason
            ))
        };
        let wide = parse_integer(&text, T::SIGNED).map_err(|reason| failed(reason))?;
        T::try_from(wide).map_err(|_| failed("value out of range"))
    }

    fn is_empty(&self, value: &T) -> bool {
        *value == T::default()
    }
}

/// Parses an integer literal, accepting an optional sign (signed types only)
/// and an optional `0x`, `0o`, `0b` or legacy `0` octal prefix.
fn parse_integer(text: &str, signed: bool) -> Result<i128, &'static str> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'+') if signed => (false, &text[1..]),
        Some(b'-') if signed => (true, &text[1..]),
        _ => (false, text),
    };
    let lower = body.get(..2).map(|p| p.to_ascii_lowercase());
    let (radix, digits, prefixed) = match lower.as_deref() {
        Some("0x") => (16, &body[2..], true),
        Some("0o") => (8, &body[2..], true),
        Some("0b") => (2, &body[2..], true),
        _ if body.len() > 1 && body.starts_with('0') => (8, &body[1..], true),
        _ => (10, body, false),
    };
    if digits.is_empty() {
        return Err("no digits");
    }

    let mut magnitude: u128 = 0;
    // A separator must follow a digit or the prefix, and precede a digit.
    let mut after_digit_or_prefix = prefixed;
    let mut pending_separator = false;
    for c in digits.chars() {
        if c == '_' {
            if !after_digit_or_prefix {
                return Err("invalid digit separator");
            }
            after_digit_or_prefix = false;
            pending_separator = true;
            continue;
        }
        let digit = c.to_digit(radix).ok_or("invalid digit")?;
        magnitude = magnitude
            .checked_mul(u128::from(radix))
            .and_then(|m| m.checked_add(u128::from(digit)))
            .ok_or("value out of range")?;
        after_digit_or_prefix = true;
        pending_separator = false;
    }
    if pending_separator {
        return Err("invalid digit separator");
    }

    let magnitude = i128::try_from(magnitude).map_err(|_| "value out of range")?;
    Ok(if negative { -magnitude } else { magnitude })
}

// ============================================================================
// Floats
// ============================================================================

/// Primitive floating point types with a built-in codec.
pub trait Float:
    sealed::Sealed
    + Copy
    + Default
    + PartialEq
    + fmt::Display
    + FromStr<Err = ParseFloatError>
    + Send
    + Sync
    + 'static
{
}

impl sealed::Sealed for f32 {}
impl Float for f32 {}
impl sealed::Sealed for f64 {}
impl Float for f64 {}

/// Floats as the shortest decimal text that round-trips at the type's precision.
///
/// The text never uses exponent notation.
pub struct FloatCodec<T>(PhantomData<fn() -> T>);

impl<T> FloatCodec<T> {
    /// Creates the codec.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FloatCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for FloatCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FloatCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FloatCodec<{}>", type_name::<T>())
    }
}

impl<T: Float> ScalarCodec for FloatCodec<T> {
    type Value = T;

    fn scalar_type(&self) -> ScalarType {
        ScalarType::N
    }

    fn encode(&self, value: &T) -> Result<AttributeValue, ConversionError> {
        // `Display` for floats is the shortest round-trip form without an exponent.
        Ok(AttributeValue::N(value.to_string()))
    }

    fn decode(&self, value: AttributeValue) -> Result<T, ConversionError> {
        let text = take_n(value)?;
        text.parse().map_err(|err| {
            ConversionError::scalar_parse(format!(
                "cannot parse '{}' as {}",
                text,
                type_name::<T>()
            ))
            .with_source(err)
        })
    }

    fn is_empty(&self, value: &T) -> bool {
        *value == T::default()
    }
}

// ============================================================================
// Strings and bytes
// ============================================================================

/// `String` as itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringCodec;

impl ScalarCodec for StringCodec {
    type Value = String;

    fn scalar_type(&self) -> ScalarType {
        ScalarType::S
    }

    fn encode(&self, value: &String) -> Result<AttributeValue, ConversionError> {
        Ok(AttributeValue::S(value.clone()))
    }

    fn decode(&self, value: AttributeValue) -> Result<String, ConversionError> {
        take_s(value)
    }

    fn is_empty(&self, value: &String) -> bool {
        value.is_empty()
    }
}

/// `Vec<u8>` as a binary value holding the exact bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct BytesCodec;

impl ScalarCodec for BytesCodec {
    type Value = Vec<u8>;

    fn scalar_type(&self) -> ScalarType {
        ScalarType::B
    }

    fn encode(&self, value: &Vec<u8>) -> Result<AttributeValue, ConversionError> {
        Ok(AttributeValue::B(Blob::new(value.clone())))
    }

    fn decode(&self, value: AttributeValue) -> Result<Vec<u8>, ConversionError> {
        take_b(value).map(Blob::into_inner)
    }

    fn is_empty(&self, value: &Vec<u8>) -> bool {
        value.is_empty()
    }
}

/// [`Blob`] as a binary value.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlobCodec;

impl ScalarCodec for BlobCodec {
    type Value = Blob;

    fn scalar_type(&self) -> ScalarType {
        ScalarType::B
    }

    fn encode(&self, value: &Blob) -> Result<AttributeValue, ConversionError> {
        Ok(AttributeValue::B(value.clone()))
    }

    fn decode(&self, value: AttributeValue) -> Result<Blob, ConversionError> {
        take_b(value)
    }

    fn is_empty(&self, value: &Blob) -> bool {
        value.as_ref().is_empty()
    }
}

// ============================================================================
// Textual codecs
// ============================================================================

/// Any type with a textual form, stored as a string.
///
/// Encoding uses [`fmt::Display`] and decoding uses [`FromStr`]. Values of a
/// text type are never considered empty.
pub struct TextCodec<T>(PhantomData<fn() -> T>);

impl<T> TextCodec<T> {
    /// Creates the codec.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for TextCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TextCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TextCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextCodec<{}>", type_name::<T>())
    }
}

impl<T> ScalarCodec for TextCodec<T>
where
    T: fmt::Display + FromStr + Send + Sync + 'static,
    T::Err: fmt::Display,
{
    type Value = T;

    fn scalar_type(&self) -> ScalarType {
        ScalarType::S
    }

    fn encode(&self, value: &T) -> Result<AttributeValue, ConversionError> {
        Ok(AttributeValue::S(value.to_string()))
    }

    fn decode(&self, value: AttributeValue) -> Result<T, ConversionError> {
        let text = take_s(value)?;
        T::from_str(&text).map_err(|err| {
            ConversionError::custom_codec(format!(
                "cannot decode '{}' as {}: {}",
                text,
                type_name::<T>(),
                err
            ))
        })
    }

    fn is_empty(&self, _value: &T) -> bool {
        false
    }
}

/// [`DateTime`] as an RFC 3339 string such as `2013-12-12T17:55:30Z`.
///
/// The Unix epoch is the zero value and is omitted when marshaling.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateTimeCodec;

impl ScalarCodec for DateTimeCodec {
    type Value = DateTime;

    fn scalar_type(&self) -> ScalarType {
        ScalarType::S
    }

    fn encode(&self, value: &DateTime) -> Result<AttributeValue, ConversionError> {
        value
            .fmt(Format::DateTime)
            .map(AttributeValue::S)
            .map_err(|err| ConversionError::custom_codec(err.to_string()).with_source(err))
    }

    fn decode(&self, value: AttributeValue) -> Result<DateTime, ConversionError> {
        let text = take_s(value)?;
        DateTime::from_str(&text, Format::DateTime).map_err(|err| {
            ConversionError::custom_codec(format!("cannot decode '{}' as a timestamp", text))
                .with_source(err)
        })
    }

    fn is_empty(&self, value: &DateTime) -> bool {
        value.secs() == 0 && value.subsec_nanos() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionErrorKind;

    fn n(text: &str) -> AttributeValue {
        AttributeValue::N(text.to_string())
    }

    fn s(text: &str) -> AttributeValue {
        AttributeValue::S(text.to_string())
    }

    #[test]
    fn bool_encodes_as_string() {
        assert_eq!(BoolCodec.encode(&true).unwrap(), s("true"));
        assert_eq!(BoolCodec.encode(&false).unwrap(), s("false"));
        assert!(BoolCodec.decode(s("true")).unwrap());
        assert!(BoolCodec.decode(s("T")).unwrap());
        assert!(!BoolCodec.decode(s("0")).unwrap());
        assert!(BoolCodec.decode(s("yes")).is_err());
        assert!(BoolCodec.is_empty(&false));
    }

    #[test]
    fn integers_encode_as_decimal() {
        assert_eq!(IntegerCodec::<i64>::new().encode(&-42).unwrap(), n("-42"));
        assert_eq!(IntegerCodec::<u8>::new().encode(&255).unwrap(), n("255"));
        assert!(IntegerCodec::<i32>::new().is_empty(&0));
        assert!(!IntegerCodec::<i32>::new().is_empty(&-1));
    }

    #[test]
    fn integers_accept_prefixed_literals() {
        let codec = IntegerCodec::<i64>::new();
        assert_eq!(codec.decode(n("2007")).unwrap(), 2007);
        assert_eq!(codec.decode(n("+7")).unwrap(), 7);
        assert_eq!(codec.decode(n("-0x1F")).unwrap(), -31);
        assert_eq!(codec.decode(n("0o17")).unwrap(), 15);
        assert_eq!(codec.decode(n("017")).unwrap(), 15);
        assert_eq!(codec.decode(n("0b1010")).unwrap(), 10);
        assert_eq!(codec.decode(n("0x_ff_ff")).unwrap(), 0xffff);
        assert_eq!(codec.decode(n("1_000")).unwrap(), 1000);
        assert_eq!(codec.decode(n("0")).unwrap(), 0);
    }

    #[test]
    fn integers_reject_malformed_literals() {
        let codec = IntegerCodec::<i64>::new();
        for bad in ["", "0x", "_1", "1__000", "0x__1", "0x1_", "08", "1.5", "abc", "--1"] {
            let err = codec.decode(n(bad)).unwrap_err();
            assert!(
                matches!(err.kind(), ConversionErrorKind::ScalarParse { .. }),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn integers_reject_out_of_range() {
        let err = IntegerCodec::<i8>::new().decode(n("128")).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert_eq!(IntegerCodec::<i8>::new().decode(n("-128")).unwrap(), -128);
        assert!(IntegerCodec::<u32>::new().decode(n("-1")).is_err());
        assert_eq!(
            IntegerCodec::<u64>::new()
                .decode(n("18446744073709551615"))
                .unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn integers_reject_wrong_tag() {
        let err = IntegerCodec::<i32>::new().decode(s("8")).unwrap_err();
        assert!(matches!(
            err.kind(),
            ConversionErrorKind::TypeMismatch {
                expected: "N",
                actual: "S"
            }
        ));
    }

    #[test]
    fn floats_use_shortest_round_trip_text() {
        assert_eq!(FloatCodec::<f32>::new().encode(&8.12).unwrap(), n("8.12"));
        assert_eq!(FloatCodec::<f64>::new().encode(&12.8).unwrap(), n("12.8"));
        assert_eq!(FloatCodec::<f64>::new().encode(&1.5).unwrap(), n("1.5"));
        assert_eq!(FloatCodec::<f64>::new().encode(&2007.0).unwrap(), n("2007"));
        assert_eq!(
            FloatCodec::<f64>::new().encode(&1e21).unwrap(),
            n("1000000000000000000000")
        );
        assert_eq!(FloatCodec::<f32>::new().decode(n("8.12")).unwrap(), 8.12f32);
        assert!(FloatCodec::<f64>::new().is_empty(&0.0));
        assert!(FloatCodec::<f64>::new().decode(n("one")).is_err());
    }

    #[test]
    fn bytes_are_stored_verbatim() {
        let raw = vec![0u8, 159, 146, 150];
        let encoded = BytesCodec.encode(&raw).unwrap();
        assert_eq!(encoded, AttributeValue::B(Blob::new(raw.clone())));
        assert_eq!(BytesCodec.decode(encoded).unwrap(), raw);
        assert!(BytesCodec.is_empty(&Vec::new()));
    }

    #[derive(Debug, PartialEq)]
    struct Color(u8, u8, u8);

    impl fmt::Display for Color {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
        }
    }

    impl FromStr for Color {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let hex = s.strip_prefix('#').ok_or("missing #")?;
            let channel = |i: usize| {
                hex.get(i..i + 2)
                    .and_then(|c| u8::from_str_radix(c, 16).ok())
                    .ok_or_else(|| format!("bad channel in {}", s))
            };
            Ok(Color(channel(0)?, channel(2)?, channel(4)?))
        }
    }

    #[test]
    fn text_codec_uses_display_and_from_str() {
        let codec = TextCodec::<Color>::new();
        assert_eq!(codec.encode(&Color(255, 0, 16)).unwrap(), s("#ff0010"));
        assert_eq!(codec.decode(s("#0a0b0c")).unwrap(), Color(10, 11, 12));
        let err = codec.decode(s("red")).unwrap_err();
        assert!(matches!(err.kind(), ConversionErrorKind::CustomCodec { .. }));
        assert!(!codec.is_empty(&Color(0, 0, 0)));
    }

    #[test]
    fn date_time_uses_rfc3339() {
        let time = DateTime::from_secs(1386870930);
        assert_eq!(
            DateTimeCodec.encode(&time).unwrap(),
            s("2013-12-12T17:55:30Z")
        );
        assert_eq!(DateTimeCodec.decode(s("2013-12-12T17:55:30Z")).unwrap(), time);
        assert!(DateTimeCodec.is_empty(&DateTime::from_secs(0)));
        assert!(!DateTimeCodec.is_empty(&time));
        assert!(DateTimeCodec.decode(s("yesterday")).is_err());
    }
}
