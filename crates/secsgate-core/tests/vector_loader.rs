//! JSON test vector loader shared by item-building tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;
use serde_json::Value;

use secsgate_core::item::{Capabilities, Item, ItemDescriptor};
use secsgate_core::template::{substitute, ValueTable};

#[derive(Debug, Deserialize)]
pub struct ItemVector {
    pub description: String,
    /// `"full"`, `"text_only"`, or a partial capability object.
    #[serde(default)]
    pub capabilities: Option<Value>,
    /// Applied to `descriptors` before building.
    #[serde(default)]
    pub values: ValueTable,
    pub descriptors: Vec<Value>,
    pub expect: Vec<Item>,
}

impl ItemVector {
    pub fn caps(&self) -> Capabilities {
        match &self.capabilities {
            None => Capabilities::full(),
            Some(Value::String(s)) if s == "full" => Capabilities::full(),
            Some(Value::String(s)) if s == "text_only" => Capabilities::text_only(),
            Some(obj @ Value::Object(_)) => serde_json::from_value(obj.clone())
                .expect("invalid capabilities in test vector"),
            Some(other) => panic!("unsupported capabilities: {other}"),
        }
    }

    pub fn descriptors(&self) -> Vec<ItemDescriptor> {
        self.descriptors
            .iter()
            .map(|d| ItemDescriptor::from_value(&substitute(d, &self.values)))
            .collect()
    }
}

pub fn load(name: &str) -> ItemVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
