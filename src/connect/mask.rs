//! Masking of card and account data before it reaches any log.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::error;

fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let length = chars.len();
    if length > 10 {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[length - 4..].iter().collect();
        format!("{}{}{}", head, "*".repeat(length - 10), tail)
    } else {
        value.to_string()
    }
}

fn is_pan_key(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "pan" | "cbu" | "cbui" | "number"
    )
}

fn is_cvv_key(key: &str) -> bool {
    let key = key.to_lowercase();
    key.contains("cvv")
        || key.contains("cvc")
        || key.contains("card_verification")
        || key.contains("cvn")
}

fn secure_field(key: &str, value: &Value) -> Value {
    let pan = is_pan_key(key);
    let cvv = is_cvv_key(key);
    if !pan && !cvv {
        return secure_value(value);
    }

    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.0}", f),
            _ => n.to_string(),
        },
        // Sensitive keys holding objects, arrays, bools or nulls are kept as is
        other => return other.clone(),
    };

    if pan {
        Value::String(mask(&raw))
    } else {
        Value::String("***".to_string())
    }
}

fn secure_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let secured: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), secure_field(k, v)))
                .collect();
            Value::Object(secured)
        }
        Value::Array(items) => Value::Array(items.iter().map(secure_value).collect()),
        other => other.clone(),
    }
}

/// Mask PAN-like and CVV-like fields anywhere in a JSON document.
pub fn secure_json(value: &Value) -> Value {
    secure_value(value)
}

/// Serialize `value` and return its masked JSON text.
///
/// Returns an empty string when the value cannot be serialized.
pub fn secure_struct<T: Serialize + ?Sized>(value: &T) -> String {
    let json = match serde_json::to_value(value) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to secure json payload: {}", e);
            return String::new();
        }
    };
    secure_json(&json).to_string()
}

/// Mask a raw body if it is JSON, otherwise return it unchanged.
pub fn secure_body(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(json) => secure_json(&json).to_string(),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}
