//! Typed items: descriptors in, encoded items out.
//!
//! - [`ItemDescriptor`] is the loosely-typed JSON form found in templates.
//! - [`Item`] is the concrete encoded form handed to a connection.
//! - [`Capabilities`] describes which encoders a connection implements; the
//!   [`builder`] walks a fixed fallback chain against it.

pub mod builder;
pub mod coerce;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use builder::{fallback_chain, Encoding, ItemBuilder};

/// Closed set of descriptor type tags. Unrecognized tags map to `Ascii`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Ascii,
    U2,
    U4,
    I2,
    I4,
    F4,
    F8,
    Boolean,
    BoolArray,
    Binary,
    List,
}

impl TypeTag {
    /// Case-insensitive parse. Never fails: unknown tags are text.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "U2" => TypeTag::U2,
            "U4" => TypeTag::U4,
            "I2" => TypeTag::I2,
            "I4" => TypeTag::I4,
            "F4" => TypeTag::F4,
            "F8" => TypeTag::F8,
            "BOOL" | "BOOLEAN" => TypeTag::Boolean,
            "BOOL_ARRAY" => TypeTag::BoolArray,
            "B" | "BIN" => TypeTag::Binary,
            "LIST" | "L" => TypeTag::List,
            _ => TypeTag::Ascii,
        }
    }
}

/// One `{ type, name, value, size? }` entry of a template's `items`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDescriptor {
    /// Raw tag as written; see [`ItemDescriptor::tag`].
    pub type_tag: String,
    pub name: String,
    pub value: Value,
    pub size: Option<usize>,
}

impl ItemDescriptor {
    pub fn new(type_tag: impl Into<String>, name: impl Into<String>, value: Value) -> Self {
        Self {
            type_tag: type_tag.into(),
            name: name.into(),
            value,
            size: None,
        }
    }

    /// Lenient parse from JSON; missing or odd fields get text defaults so
    /// building stays total. A non-object entry becomes an unnamed text item.
    pub fn from_value(v: &Value) -> Self {
        let Value::Object(map) = v else {
            return Self::new("A", "", v.clone());
        };

        let type_tag = match map.get("type") {
            Some(Value::String(s)) => s.clone(),
            _ => "A".to_owned(),
        };
        let name = match map.get("name") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let size = map
            .get("size")
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok());

        Self {
            type_tag,
            name,
            value: map.get("value").cloned().unwrap_or(Value::Null),
            size,
        }
    }

    pub fn tag(&self) -> TypeTag {
        TypeTag::parse(&self.type_tag)
    }
}

/// Concrete encoded item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Item {
    #[serde(rename = "A")]
    Ascii { name: String, value: String, size: usize },
    U2 { name: String, value: u16 },
    U4 { name: String, value: u32 },
    I2 { name: String, value: i16 },
    I4 { name: String, value: i32 },
    F4 { name: String, value: f32 },
    F8 { name: String, value: f64 },
    #[serde(rename = "BOOLEAN")]
    Boolean { name: String, value: bool },
    #[serde(rename = "BOOLEAN_ARRAY")]
    BoolArray { name: String, value: Vec<bool> },
    #[serde(rename = "B")]
    Binary { name: String, value: Vec<u8> },
    #[serde(rename = "L")]
    List { name: String, items: Vec<Item> },
}

impl Item {
    /// Text item with `size = max(1, len)`.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let size = value.len().max(1);
        Item::Ascii {
            name: name.into(),
            value,
            size,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Ascii { name, .. }
            | Item::U2 { name, .. }
            | Item::U4 { name, .. }
            | Item::I2 { name, .. }
            | Item::I4 { name, .. }
            | Item::F4 { name, .. }
            | Item::F8 { name, .. }
            | Item::Boolean { name, .. }
            | Item::BoolArray { name, .. }
            | Item::Binary { name, .. }
            | Item::List { name, .. } => name,
        }
    }
}

/// Encoders a connection implements natively. Text and list encoding are
/// always available and have no flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Capabilities {
    pub u2: bool,
    pub u4: bool,
    pub i2: bool,
    pub i4: bool,
    pub f4: bool,
    pub f8: bool,
    pub boolean: bool,
    pub bool_array: bool,
    pub binary: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}

impl Capabilities {
    /// Every encoder present.
    pub const fn full() -> Self {
        Self {
            u2: true,
            u4: true,
            i2: true,
            i4: true,
            f4: true,
            f8: true,
            boolean: true,
            bool_array: true,
            binary: true,
        }
    }

    /// Only text and lists.
    pub const fn text_only() -> Self {
        Self {
            u2: false,
            u4: false,
            i2: false,
            i4: false,
            f4: false,
            f8: false,
            boolean: false,
            bool_array: false,
            binary: false,
        }
    }

    pub fn supports(self, enc: Encoding) -> bool {
        match enc {
            Encoding::Ascii | Encoding::List => true,
            Encoding::U2 => self.u2,
            Encoding::U4 => self.u4,
            Encoding::I2 => self.i2,
            Encoding::I4 => self.i4,
            Encoding::F4 => self.f4,
            Encoding::F8 => self.f8,
            Encoding::Boolean => self.boolean,
            Encoding::BoolArray => self.bool_array,
            Encoding::BoolList => self.boolean,
            Encoding::Binary => self.binary,
        }
    }
}
