use serde_json::{json, Map, Value};

use crate::sprinkler::config::Options;

/// `/jo` body: the full integer option map plus the public string options.
/// The device key is deliberately absent.
pub fn payload(options: &Options) -> Value {
    let mut map = Map::new();
    for (name, value) in options.int_map() {
        map.insert(name, json!(value));
    }
    for (name, value) in options.string_map() {
        map.insert(name, json!(value));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_contains_options_but_not_the_key() {
        let body = payload(&Options::default());
        assert_eq!(body["fwv"], 100);
        assert_eq!(body["wl"], 100);
        assert_eq!(body["loc"], "");
        assert!(body.get("dkey").is_none(), "device key never leaves the box");
        assert!(body.get("device_key").is_none());
    }
}
