//! Layer merge
//!
//! Each layer is a JSON object such as `{"env": {...}, "output": {...}}`.
//! A later layer overrides an earlier one key by key; nested tables merge,
//! anything else (strings, numbers, arrays, null) is replaced wholesale.

use serde_json::Value;

/// Merge `overlay` into `target` in place.
pub fn merge_into(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, overlay_value),
                    None => {
                        target_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

/// Merge two layers, `overlay` winning.
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

/// Merge layers lowest precedence first.
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
