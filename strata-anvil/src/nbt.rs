//! Typed access into the NBT tag tree.
//!
//! Chunk data arrives as a parsed `fastnbt::Value`. These helpers
//! distinguish a missing tag (`Ok(None)`) from a tag of the wrong
//! type (`Err(UnexpectedTag)`), so callers can treat absence as air
//! while still surfacing corrupt data.

use std::collections::HashMap;

use fastnbt::Value;

use crate::error::{Error, Result};

pub type Compound = HashMap<String, Value>;

/// Reads any integer tag width as `i64`.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Byte(v) => Some(*v as i64),
        Value::Short(v) => Some(*v as i64),
        Value::Int(v) => Some(*v as i64),
        Value::Long(v) => Some(*v),
        _ => None,
    }
}

fn unexpected(tag: &str, expected: &'static str) -> Error {
    Error::UnexpectedTag {
        tag: tag.to_string(),
        expected,
    }
}

pub fn get_int(compound: &Compound, tag: &str) -> Result<Option<i64>> {
    match compound.get(tag) {
        None => Ok(None),
        Some(value) => as_int(value).map(Some).ok_or_else(|| unexpected(tag, "integer")),
    }
}

pub fn get_compound<'a>(compound: &'a Compound, tag: &str) -> Result<Option<&'a Compound>> {
    match compound.get(tag) {
        None => Ok(None),
        Some(Value::Compound(inner)) => Ok(Some(inner)),
        Some(_) => Err(unexpected(tag, "compound")),
    }
}

pub fn get_list<'a>(compound: &'a Compound, tag: &str) -> Result<Option<&'a [Value]>> {
    match compound.get(tag) {
        None => Ok(None),
        Some(Value::List(items)) => Ok(Some(&items[..])),
        Some(_) => Err(unexpected(tag, "list")),
    }
}

pub fn get_byte_array<'a>(compound: &'a Compound, tag: &str) -> Result<Option<&'a [i8]>> {
    match compound.get(tag) {
        None => Ok(None),
        Some(Value::ByteArray(bytes)) => Ok(Some(&bytes[..])),
        Some(_) => Err(unexpected(tag, "byte array")),
    }
}

pub fn get_long_array<'a>(compound: &'a Compound, tag: &str) -> Result<Option<&'a [i64]>> {
    match compound.get(tag) {
        None => Ok(None),
        Some(Value::LongArray(words)) => Ok(Some(&words[..])),
        Some(_) => Err(unexpected(tag, "long array")),
    }
}

pub fn get_string<'a>(compound: &'a Compound, tag: &str) -> Result<Option<&'a str>> {
    match compound.get(tag) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(unexpected(tag, "string")),
    }
}

/// Views a list element as a compound.
pub fn expect_compound<'a>(value: &'a Value, tag: &str) -> Result<&'a Compound> {
    match value {
        Value::Compound(inner) => Ok(inner),
        _ => Err(unexpected(tag, "compound")),
    }
}
