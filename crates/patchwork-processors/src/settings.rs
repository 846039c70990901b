//! Decoding helpers for schema-less settings and messages.

use patchwork_core::{Message, Settings};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decodes factory settings into a typed struct.
///
/// `null` yields the struct's defaults. Missing keys fall back to their
/// defaults and unknown keys are ignored; a value of the wrong type is an
/// error. Decodes from the borrowed value, so it is safe to call while
/// producing audio.
pub fn decode_settings<T>(settings: &Settings) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned + Default,
{
    match settings {
        Value::Null => Ok(T::default()),
        other => T::deserialize(other),
    }
}

/// Numeric field `key` of a message object, if present.
pub fn number(message: &Message, key: &str) -> Option<f32> {
    message.get(key).and_then(Value::as_f64).map(|v| v as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default, rename_all = "camelCase")]
    struct Example {
        max_delay: f32,
        name: String,
    }

    impl Default for Example {
        fn default() -> Self {
            Self {
                max_delay: 1.0,
                name: String::from("sine"),
            }
        }
    }

    #[test]
    fn null_yields_defaults() {
        assert_eq!(decode_settings::<Example>(&Value::Null).unwrap(), Example::default());
    }

    #[test]
    fn partial_object_keeps_other_defaults() {
        let decoded: Example = decode_settings(&json!({"maxDelay": 2.5, "other": true})).unwrap();
        assert_eq!(decoded.max_delay, 2.5);
        assert_eq!(decoded.name, "sine");
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(decode_settings::<Example>(&json!({"maxDelay": "long"})).is_err());
        assert!(decode_settings::<Example>(&json!(3)).is_err());
    }

    #[test]
    fn number_reads_numeric_fields_only() {
        let message = json!({"frequency": 220, "gate": "on"});
        assert_eq!(number(&message, "frequency"), Some(220.0));
        assert_eq!(number(&message, "gate"), None);
        assert_eq!(number(&json!(1.0), "frequency"), None);
    }
}
