//! Message templates: JSON documents with a stream/function header and item
//! descriptors, optionally containing `{{key}}` placeholders.
//!
//! A [`Template`] is immutable once loaded. Every send substitutes into a fresh
//! copy, then reads the header with [`TemplateHeader::resolve`].

pub mod placeholder;
pub mod store;

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SecsGateError};
use crate::item::ItemDescriptor;

pub use placeholder::{find_placeholders, missing_keys, placeholder_key, substitute, ValueTable};
pub use store::{MemoryTemplateStore, TemplateStore};

/// Highest stream number representable in a 7-bit header field.
pub const MAX_STREAM: i64 = 127;
/// Highest device id representable in a 15-bit header field.
pub const MAX_DEVICE: i64 = 32767;

/// A loaded template. Always a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Template(Value);

impl Template {
    /// Wrap a JSON value; the top level must be an object.
    pub fn from_value(v: Value) -> Result<Self> {
        if !v.is_object() {
            return Err(SecsGateError::BadRequest(
                "template must be a JSON object".into(),
            ));
        }
        Ok(Self(v))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let v: Value = serde_json::from_str(s)
            .map_err(|e| SecsGateError::BadRequest(format!("invalid template json: {e}")))?;
        Self::from_value(v)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Field lookup; `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Fresh substituted copy. Substitution preserves keys, so the result is
    /// still an object.
    pub fn substitute(&self, values: &ValueTable) -> Template {
        Template(substitute(&self.0, values))
    }

    pub fn placeholders(&self) -> BTreeSet<String> {
        find_placeholders(&self.0)
    }

    /// `replyExpected` as written in the template, if it is a usable bool.
    pub fn reply_expected(&self) -> Option<bool> {
        self.get("replyExpected").and_then(as_bool)
    }

    /// Parse the `items` array into descriptors. Absent means no items.
    pub fn items(&self) -> Result<Vec<ItemDescriptor>> {
        match self.get("items") {
            None => Ok(Vec::new()),
            Some(Value::Array(raw)) => Ok(raw.iter().map(ItemDescriptor::from_value).collect()),
            Some(_) => Err(SecsGateError::BadRequest(
                "template items must be an array".into(),
            )),
        }
    }
}

/// Header fields read off a substituted template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateHeader {
    pub device: Option<u16>,
    pub stream: u8,
    pub function: u8,
    pub reply_expected: Option<bool>,
}

impl TemplateHeader {
    /// Read and validate the header. Each field comes from the substituted
    /// copy, falling back to the original when the copy lacks it.
    pub fn resolve(substituted: &Template, original: &Template) -> Result<Self> {
        let field = |key: &str| substituted.get(key).or_else(|| original.get(key));

        let stream = match field("stream") {
            Some(v) => int_in_range(v, "stream", 0, MAX_STREAM)?,
            None => return Err(SecsGateError::BadRequest("template stream is required".into())),
        };
        let function = match field("func") {
            Some(v) => int_in_range(v, "func", 0, 255)?,
            None => return Err(SecsGateError::BadRequest("template func is required".into())),
        };
        let device = field("device")
            .map(|v| int_in_range(v, "device", 0, MAX_DEVICE))
            .transpose()?;
        let reply_expected = field("replyExpected")
            .map(|v| {
                as_bool(v).ok_or_else(|| {
                    SecsGateError::BadRequest("template replyExpected must be a bool".into())
                })
            })
            .transpose()?;

        Ok(Self {
            device: device.map(|d| d as u16),
            stream: stream as u8,
            function: function as u8,
            reply_expected,
        })
    }
}

fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn int_in_range(v: &Value, field: &str, min: i64, max: i64) -> Result<i64> {
    let n = match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if (min..=max).contains(&n) => Ok(n),
        Some(n) => Err(SecsGateError::BadRequest(format!(
            "template {field} out of range: {n} (expected {min}..={max})"
        ))),
        None => Err(SecsGateError::BadRequest(format!(
            "template {field} must be an integer, got {v}"
        ))),
    }
}
