//! Serde field adapters
//!
//! Use with `#[serde(with = "...")]` on fields whose file representation
//! differs from the in-memory type.
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize)]
//! struct Settings {
//!     #[serde(with = "vstore_schema::codec::lowercase_bool")]
//!     dark: bool,
//!     #[serde(with = "vstore_schema::codec::duration_secs")]
//!     autosave: Duration,
//! }
//! ```

/// `bool` stored as the string `"true"` or `"false"`
pub mod lowercase_bool {
    use serde::de::{Error, Unexpected};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Write `"true"` or `"false"`
    ///
    /// # Errors
    /// Whatever the serializer reports.
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    /// Read `"true"` or `"false"`, nothing else
    ///
    /// # Errors
    /// Any other string or a non-string value.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let text = String::deserialize(deserializer)?;
        match text.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(D::Error::invalid_value(
                Unexpected::Str(other),
                &"\"true\" or \"false\"",
            )),
        }
    }
}

/// `Duration` stored as whole seconds
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Write whole seconds, dropping any fraction
    ///
    /// # Errors
    /// Whatever the serializer reports.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    /// Read whole seconds
    ///
    /// # Errors
    /// Negative or non-integer values.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// `Duration` stored as whole milliseconds
pub mod duration_millis {
    use serde::ser::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Write whole milliseconds
    ///
    /// # Errors
    /// Durations longer than `u64::MAX` milliseconds.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis())
            .map_err(|_| S::Error::custom("duration too long for milliseconds"))?;
        serializer.serialize_u64(millis)
    }

    /// Read whole milliseconds
    ///
    /// # Errors
    /// Negative or non-integer values.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Settings {
        #[serde(with = "super::lowercase_bool")]
        dark: bool,
        #[serde(with = "super::duration_secs")]
        autosave: Duration,
        #[serde(with = "super::duration_millis")]
        debounce: Duration,
    }

    #[test]
    fn encodes_wire_representation() {
        let settings = Settings {
            dark: true,
            autosave: Duration::from_millis(90_500),
            debounce: Duration::from_millis(250),
        };
        assert_eq!(
            serde_json::to_value(&settings).unwrap(),
            json!({"dark": "true", "autosave": 90, "debounce": 250})
        );
    }

    #[test]
    fn decodes_wire_representation() {
        let settings: Settings =
            serde_json::from_value(json!({"dark": "false", "autosave": 30, "debounce": 5}))
                .unwrap();
        assert_eq!(
            settings,
            Settings {
                dark: false,
                autosave: Duration::from_secs(30),
                debounce: Duration::from_millis(5),
            }
        );
    }

    #[test]
    fn lowercase_bool_is_exact() {
        for bad in [json!("True"), json!("yes"), json!(true), json!(1)] {
            let result = serde_json::from_value::<Settings>(
                json!({"dark": bad, "autosave": 1, "debounce": 1}),
            );
            assert!(result.is_err());
        }
    }

    #[test]
    fn durations_reject_negative() {
        let result =
            serde_json::from_value::<Settings>(json!({"dark": "true", "autosave": -1, "debounce": 1}));
        assert!(result.is_err());
    }
}
