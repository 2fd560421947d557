/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Field annotation parsing.
//!
//! A field annotation has the form `name,opt1,opt2,...`:
//!
//! - `-` on its own excludes the field entirely.
//! - An empty name keeps the field's declared name.
//! - `hash` marks the field as the partition key, `range` as the sort key.

use crate::error::ConversionError;
use crate::schema::KeyType;

const EXCLUDED: &str = "-";
const HASH: &str = "hash";
const RANGE: &str = "range";

/// The comma-delimited options that follow the name in an annotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagOptions<'a>(&'a str);

impl<'a> TagOptions<'a> {
    /// Returns true if `token` is one of the options.
    pub fn contains(&self, token: &str) -> bool {
        !self.0.is_empty() && self.0.split(',').any(|option| option == token)
    }

    /// Iterates over the options in annotation order.
    pub fn iter(&self) -> impl Iterator<Item = &'a str> {
        let options = self.0;
        options.split(',').filter(|option| !option.is_empty())
    }
}

/// Splits an annotation into its name and options at the first comma.
///
/// The name may be empty, meaning the declared field name applies.
pub fn parse_tag(tag: &str) -> (&str, TagOptions<'_>) {
    match tag.split_once(',') {
        Some((name, options)) => (name, TagOptions(options)),
        None => (tag, TagOptions::default()),
    }
}

/// The parsed form of one field annotation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Explicit attribute name, if the annotation gave a non-empty one.
    pub name: Option<String>,
    /// The field is the partition key.
    pub hash_key: bool,
    /// The field is the sort key.
    pub range_key: bool,
    /// The field is invisible to marshaling, unmarshaling and schema derivation.
    pub excluded: bool,
}

impl FieldOptions {
    /// Parses a raw annotation. Absent annotations are passed as `""`.
    pub fn parse(tag: &str) -> Self {
        if tag == EXCLUDED {
            return Self {
                excluded: true,
                ..Default::default()
            };
        }
        let (name, options) = parse_tag(tag);
        Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            hash_key: options.contains(HASH),
            range_key: options.contains(RANGE),
            excluded: false,
        }
    }

    /// Returns the attribute name for a field declared as `declared`.
    pub fn attribute_name<'a>(&'a self, declared: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(declared)
    }

    /// Returns true if the field carries a key role.
    pub fn is_key(&self) -> bool {
        self.hash_key || self.range_key
    }

    /// Returns the key role of the field, if any.
    pub fn key_type(&self) -> Option<KeyType> {
        match (self.hash_key, self.range_key) {
            (_, true) => Some(KeyType::Range),
            (true, false) => Some(KeyType::Hash),
            (false, false) => None,
        }
    }

    /// Rejects annotations that cannot describe a single field.
    pub fn validate(&self) -> Result<(), ConversionError> {
        if self.hash_key && self.range_key {
            return Err(ConversionError::invalid_tag(
                "a field cannot be both the hash key and the range key",
            ));
        }
        Ok(())
    }
}
