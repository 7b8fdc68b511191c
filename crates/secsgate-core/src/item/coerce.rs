//! Value coercion for item building. Every function here is total.

use serde_json::Value;

/// Text form: strings as-is, `null` as empty, everything else as JSON.
pub fn to_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Numeric form. Unparseable input yields NaN, which integer casts saturate to 0.
pub fn to_number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                0.0
            } else {
                t.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(a) if a.len() == 1 => a.first().map_or(f64::NAN, to_number),
        _ => f64::NAN,
    }
}

/// Boolean form. `"false"`, `"0"`, `"no"`, `"off"`, and `""` are false; other
/// strings are true.
pub fn to_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "0" | "no" | "off"
        ),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_byte(v: &Value) -> u8 {
    // `as` saturates and maps NaN to 0
    to_number(v) as u8
}

/// Decoded binary payload, or the text it degrades to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryValue {
    Bytes(Vec<u8>),
    Text(String),
}

/// Accepts a byte array, a single number, a comma-separated decimal string,
/// or a hex string. Hex input has an optional `0x` prefix removed and all
/// remaining non-hex characters stripped; an odd digit count degrades to text.
pub fn to_binary(v: &Value) -> BinaryValue {
    match v {
        Value::Array(a) => BinaryValue::Bytes(a.iter().map(to_byte).collect()),
        Value::Number(_) => BinaryValue::Bytes(vec![to_byte(v)]),
        Value::Null => BinaryValue::Bytes(Vec::new()),
        Value::String(s) if s.contains(',') => decimal_list(s),
        Value::String(s) => hex_string(s),
        other => BinaryValue::Text(other.to_string()),
    }
}

fn decimal_list(s: &str) -> BinaryValue {
    let parsed: Option<Vec<u8>> = s
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u8>().ok())
        .collect();
    match parsed {
        Some(bytes) => BinaryValue::Bytes(bytes),
        None => BinaryValue::Text(s.to_owned()),
    }
}

fn hex_string(s: &str) -> BinaryValue {
    let t = s.trim();
    let body = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    let digits: String = body.chars().filter(char::is_ascii_hexdigit).collect();
    if digits.len() % 2 != 0 {
        return BinaryValue::Text(s.to_owned());
    }
    match hex::decode(&digits) {
        Ok(bytes) => BinaryValue::Bytes(bytes),
        Err(_) => BinaryValue::Text(s.to_owned()),
    }
}
