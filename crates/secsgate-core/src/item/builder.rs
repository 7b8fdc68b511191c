//! Descriptor -> item translation with per-type encoder fallback.
//!
//! Each type tag owns a fixed priority list of encodings ([`fallback_chain`]).
//! The builder picks the first one the connection's [`Capabilities`] support.
//! Text and list are always supported, so selection cannot fail and `build` is
//! total: it returns exactly one item per descriptor.

use serde_json::Value;
use tracing::trace;

use crate::item::coerce::{self, BinaryValue};
use crate::item::{Capabilities, Item, ItemDescriptor, TypeTag};

/// Concrete encoders a chain can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    U2,
    U4,
    I2,
    I4,
    F4,
    F8,
    Boolean,
    /// Single fixed-width boolean array item.
    BoolArray,
    /// List of individually named boolean items.
    BoolList,
    Binary,
    List,
}

/// Priority list for a type tag, most specific first. Always ends in an
/// encoding every connection supports.
pub fn fallback_chain(tag: TypeTag) -> &'static [Encoding] {
    use Encoding as E;
    match tag {
        TypeTag::Ascii => &[E::Ascii],
        TypeTag::U2 => &[E::U2, E::Ascii],
        TypeTag::U4 => &[E::U4, E::Ascii],
        TypeTag::I2 => &[E::I2, E::I4, E::Ascii],
        TypeTag::I4 => &[E::I4, E::Ascii],
        TypeTag::F4 => &[E::F4, E::Ascii],
        TypeTag::F8 => &[E::F8, E::Ascii],
        TypeTag::Boolean => &[E::Boolean, E::Ascii],
        TypeTag::BoolArray => &[E::BoolArray, E::BoolList, E::Ascii],
        TypeTag::Binary => &[E::Binary, E::Ascii],
        TypeTag::List => &[E::List],
    }
}

/// Builds items for one connection's capability set.
#[derive(Debug, Clone, Copy)]
pub struct ItemBuilder {
    caps: Capabilities,
}

impl ItemBuilder {
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }

    /// First encoding in the tag's chain that the capabilities allow.
    pub fn select(&self, tag: TypeTag) -> Encoding {
        fallback_chain(tag)
            .iter()
            .copied()
            .find(|e| self.caps.supports(*e))
            .unwrap_or(Encoding::Ascii)
    }

    /// Build one item per descriptor, in order. Never fails.
    pub fn build(&self, descriptors: &[ItemDescriptor]) -> Vec<Item> {
        descriptors.iter().map(|d| self.build_one(d)).collect()
    }

    pub fn build_one(&self, d: &ItemDescriptor) -> Item {
        let tag = d.tag();
        let enc = self.select(tag);
        if enc != fallback_chain(tag).first().copied().unwrap_or(Encoding::Ascii) {
            trace!(name = %d.name, tag = %d.type_tag, ?enc, "item encoder fallback");
        }

        let name = d.name.clone();
        match tag {
            TypeTag::Ascii => {
                let value = coerce::to_text(&d.value);
                let size = d.size.unwrap_or_else(|| value.len().max(1));
                Item::Ascii { name, value, size }
            }
            TypeTag::U2 => {
                let value = coerce::to_number(&d.value) as u16;
                numeric(enc, name, value, |name, value| Item::U2 { name, value })
            }
            TypeTag::U4 => {
                let value = coerce::to_number(&d.value) as u32;
                numeric(enc, name, value, |name, value| Item::U4 { name, value })
            }
            TypeTag::I2 => {
                let value = coerce::to_number(&d.value) as i16;
                match enc {
                    Encoding::I2 => Item::I2 { name, value },
                    Encoding::I4 => Item::I4 {
                        name,
                        value: i32::from(value),
                    },
                    _ => Item::text(name, value.to_string()),
                }
            }
            TypeTag::I4 => {
                let value = coerce::to_number(&d.value) as i32;
                numeric(enc, name, value, |name, value| Item::I4 { name, value })
            }
            TypeTag::F4 => {
                let value = coerce::to_number(&d.value) as f32;
                numeric(enc, name, value, |name, value| Item::F4 { name, value })
            }
            TypeTag::F8 => {
                let value = coerce::to_number(&d.value);
                numeric(enc, name, value, |name, value| Item::F8 { name, value })
            }
            TypeTag::Boolean => {
                let value = coerce::to_bool(&d.value);
                match enc {
                    Encoding::Boolean => Item::Boolean { name, value },
                    _ => Item::Ascii {
                        name,
                        value: value.to_string(),
                        size: 1,
                    },
                }
            }
            TypeTag::BoolArray => bool_array(enc, name, &d.value),
            TypeTag::Binary => binary(enc, name, &d.value),
            TypeTag::List => {
                let items = match &d.value {
                    Value::Array(children) => children
                        .iter()
                        .map(|c| self.build_one(&ItemDescriptor::from_value(c)))
                        .collect(),
                    _ => Vec::new(),
                };
                Item::List { name, items }
            }
        }
    }
}

/// Native numeric item when the chain selected its own encoder, else text.
fn numeric<T: ToString>(
    enc: Encoding,
    name: String,
    value: T,
    native: impl FnOnce(String, T) -> Item,
) -> Item {
    match enc {
        Encoding::Ascii => Item::text(name, value.to_string()),
        _ => native(name, value),
    }
}

fn bool_array(enc: Encoding, name: String, value: &Value) -> Item {
    let Value::Array(raw) = value else {
        // not an array: nothing to lay out element-wise
        return Item::text(name, value.to_string());
    };
    let flags: Vec<bool> = raw.iter().map(coerce::to_bool).collect();
    match enc {
        Encoding::BoolArray => Item::BoolArray { name, value: flags },
        Encoding::BoolList => {
            let items = flags
                .iter()
                .enumerate()
                .map(|(i, &value)| Item::Boolean {
                    name: format!("{name}_{i}"),
                    value,
                })
                .collect();
            Item::List { name, items }
        }
        _ => Item::text(name, Value::from(flags).to_string()),
    }
}

fn binary(enc: Encoding, name: String, value: &Value) -> Item {
    match (coerce::to_binary(value), enc) {
        (BinaryValue::Bytes(bytes), Encoding::Binary) => Item::Binary { name, value: bytes },
        (BinaryValue::Bytes(bytes), _) => Item::text(name, hex::encode(bytes)),
        (BinaryValue::Text(s), _) => Item::text(name, s),
    }
}
