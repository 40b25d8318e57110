//! Configuration layer merge
//!
//! Tables merge key by key; any other value in a higher layer replaces the
//! lower one outright.

use serde_json::Value;

/// Apply `overlay` onto `base` in place.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Fold layers onto the first one; the last layer has the highest precedence
pub fn merge_layers(layers: Vec<Value>) -> Value {
    let mut layers = layers.into_iter();
    let mut merged = layers.next().unwrap_or(Value::Null);
    for layer in layers {
        deep_merge(&mut merged, layer);
    }
    merged
}
