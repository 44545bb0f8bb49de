//! Deterministic field ordering for task files, so that independently
//! edited copies of a task diff and merge cleanly in git.

use serde_json::{Map, Value};

use crate::types::Record;

/// Sort object keys lexicographically at every nesting level.
/// Arrays and scalars are returned unchanged, including objects inside arrays.
pub fn order_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(order_map(map)),
        other => other.clone(),
    }
}

/// Record form of [`order_value`]
pub fn order_fields(record: &Record) -> Record {
    Record::from(order_map(record.as_map()))
}

fn order_map(map: &Map<String, Value>) -> Map<String, Value> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|k| (k.clone(), order_value(&map[k.as_str()])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn is_ordered(value: &Value) -> bool {
        match value {
            Value::Object(map) => {
                let keys: Vec<&String> = map.keys().collect();
                keys.windows(2).all(|w| w[0] <= w[1]) && map.values().all(is_ordered)
            }
            _ => true,
        }
    }

    #[test]
    fn test_order_fields_sorts_top_level() {
        let record = Record::from_value(json!({
            "prop": "value1",
            "afield": { "fork": "example1" },
            "sweet": "right"
        }))
        .unwrap();
        let ordered = order_fields(&record);
        let keys: Vec<&String> = ordered.keys().collect();
        assert_eq!(keys, ["afield", "prop", "sweet"]);
    }

    #[test]
    fn test_order_fields_recurses_into_objects() {
        let value = json!({ "b": { "z": 1, "a": { "y": 2, "x": 3 } }, "a": [ { "d": 1, "c": 2 } ] });
        let ordered = order_value(&value);
        assert!(is_ordered(&ordered));
        assert_eq!(ordered, value);
        // objects inside arrays are left as they are
        let inner: Vec<&String> = ordered["a"][0].as_object().unwrap().keys().collect();
        assert_eq!(inner, ["d", "c"]);
    }

    #[test]
    fn test_order_fields_is_idempotent() {
        let record = Record::from_value(json!({
            "updatedAt": 2, "id": "x", "nested": { "k": 1, "b": { "q": 0, "c": 9 } }
        }))
        .unwrap();
        let once = order_fields(&record);
        let twice = order_fields(&once);
        let once_keys: Vec<&String> = once.keys().collect();
        let twice_keys: Vec<&String> = twice.keys().collect();
        assert_eq!(once_keys, twice_keys);
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(order_value(&json!(3)), json!(3));
        assert_eq!(order_value(&Value::Null), Value::Null);
    }
}
