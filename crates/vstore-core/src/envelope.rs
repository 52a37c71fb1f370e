//! Version envelope codec
//!
//! In versioned stores the serialized document carries one reserved integer
//! field holding the version. The field exists only at the wire boundary:
//! it is added after encoding and stripped before any shape sees the value.

use serde_json::{Map, Number, Value};
use std::fmt;

/// Reserved field name used when none is configured
pub const DEFAULT_VERSION_KEY: &str = "_version";

/// Why a version tag was rejected
///
/// `Missing` and `NotAnObject` mean no tag could be found; the remaining
/// faults mean a tag was present but malformed. All of them surface as
/// `ErrorKind::InvalidVersionTag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFault {
    /// Document root is not an object, so it cannot hold a tag
    NotAnObject { found: &'static str },
    /// Root object has no tag field
    Missing { key: String },
    /// Tag is not an integer
    NotAnInteger { found: String },
    /// Tag is zero or negative
    NotPositive { found: String },
    /// Tag does not fit a version number
    OutOfRange { found: String },
}

impl TagFault {
    /// No tag could be found at all (as opposed to a malformed one)
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotAnObject { .. } | Self::Missing { .. })
    }
}

impl fmt::Display for TagFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject { found } => {
                write!(f, "expected an object holding the version tag, found {found}")
            }
            Self::Missing { key } => write!(f, "missing version tag field `{key}`"),
            Self::NotAnInteger { found } => {
                write!(f, "version tag must be an integer, found {found}")
            }
            Self::NotPositive { found } => {
                write!(f, "version tag must be at least 1, found {found}")
            }
            Self::OutOfRange { found } => write!(f, "version tag {found} is out of range"),
        }
    }
}

impl std::error::Error for TagFault {}

/// Wraps and unwraps the version tag around a structured value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEnvelope {
    key: String,
}

impl Default for VersionEnvelope {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_KEY)
    }
}

impl VersionEnvelope {
    /// Envelope using a custom tag field name
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Tag field name
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Add the version tag to an encoded value
    ///
    /// Without a version the value is returned unchanged. With one, the tag
    /// is placed first, followed by the value's own fields. A field that
    /// collides with the tag name is replaced by the tag.
    ///
    /// # Errors
    /// [`TagFault::NotAnObject`] if a version is given and the value is not
    /// an object, since the tag would have nowhere to live.
    pub fn wrap(&self, value: Value, version: Option<u32>) -> Result<Value, TagFault> {
        let Some(version) = version else {
            return Ok(value);
        };

        let Value::Object(fields) = value else {
            return Err(TagFault::NotAnObject {
                found: type_name(&value),
            });
        };

        let mut wrapped = Map::with_capacity(fields.len() + 1);
        wrapped.insert(self.key.clone(), Value::from(version));
        for (name, field) in fields {
            if name != self.key {
                wrapped.insert(name, field);
            }
        }
        Ok(Value::Object(wrapped))
    }

    /// Split a decoded document into payload and version
    ///
    /// With versioning disabled the document is returned untouched.
    ///
    /// # Errors
    /// Returns the [`TagFault`] describing a missing or malformed tag.
    pub fn unwrap(&self, parsed: Value, versioned: bool) -> Result<(Value, Option<u32>), TagFault> {
        if !versioned {
            return Ok((parsed, None));
        }

        let Value::Object(mut fields) = parsed else {
            return Err(TagFault::NotAnObject {
                found: type_name(&parsed),
            });
        };

        let tag = fields.shift_remove(&self.key).ok_or_else(|| TagFault::Missing {
            key: self.key.clone(),
        })?;
        let version = parse_version(&tag)?;

        Ok((Value::Object(fields), Some(version)))
    }

    /// Read the tag without consuming the document
    ///
    /// # Errors
    /// Same faults as [`VersionEnvelope::unwrap`].
    pub fn peek(&self, parsed: &Value) -> Result<u32, TagFault> {
        let fields = parsed.as_object().ok_or_else(|| TagFault::NotAnObject {
            found: type_name(parsed),
        })?;
        let tag = fields.get(&self.key).ok_or_else(|| TagFault::Missing {
            key: self.key.clone(),
        })?;
        parse_version(tag)
    }
}

/// Interpret a tag value as a version number (integer ≥ 1)
///
/// Integral floats such as `2.0` are accepted since several formats cannot
/// tell them apart from integers.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_version(tag: &Value) -> Result<u32, TagFault> {
    let Value::Number(number) = tag else {
        return Err(TagFault::NotAnInteger {
            found: describe(tag),
        });
    };

    if let Some(int) = number.as_i64() {
        return positive(int, number);
    }
    if number.as_u64().is_some() {
        return Err(TagFault::OutOfRange {
            found: number.to_string(),
        });
    }

    match number.as_f64() {
        Some(float) if float.is_finite() && float.fract() == 0.0 => {
            if float < 1.0 {
                Err(TagFault::NotPositive {
                    found: number.to_string(),
                })
            } else if float > f64::from(u32::MAX) {
                Err(TagFault::OutOfRange {
                    found: number.to_string(),
                })
            } else {
                Ok(float as u32)
            }
        }
        _ => Err(TagFault::NotAnInteger {
            found: number.to_string(),
        }),
    }
}

fn positive(int: i64, number: &Number) -> Result<u32, TagFault> {
    if int < 1 {
        return Err(TagFault::NotPositive {
            found: number.to_string(),
        });
    }
    u32::try_from(int).map_err(|_| TagFault::OutOfRange {
        found: number.to_string(),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string {s:?}"),
        other => type_name(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn envelope() -> VersionEnvelope {
        VersionEnvelope::default()
    }

    #[test]
    fn wrap_without_version_is_identity() {
        let value = json!({"theme": "dark"});
        assert_eq!(envelope().wrap(value.clone(), None).unwrap(), value);
    }

    #[test]
    fn wrap_places_tag_first() {
        let wrapped = envelope().wrap(json!({"theme": "dark"}), Some(3)).unwrap();
        let keys: Vec<_> = wrapped.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["_version".to_string(), "theme".to_string()]);
        assert_eq!(wrapped["_version"], 3);
    }

    #[test]
    fn wrap_replaces_colliding_field() {
        let wrapped = envelope()
            .wrap(json!({"_version": "stale", "a": 1}), Some(2))
            .unwrap();
        let fields = wrapped.as_object().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["_version"], 2);
    }

    #[test]
    fn wrap_rejects_non_object_when_versioned() {
        let err = envelope().wrap(json!([1, 2]), Some(1)).unwrap_err();
        assert!(matches!(err, TagFault::NotAnObject { .. }));
        assert!(envelope().wrap(json!([1, 2]), None).is_ok());
    }

    #[test]
    fn unwrap_disabled_passes_through() {
        let doc = json!({"_version": 7, "x": 1});
        let (value, version) = envelope().unwrap(doc.clone(), false).unwrap();
        assert_eq!(value, doc);
        assert_eq!(version, None);
    }

    #[test]
    fn unwrap_strips_tag() {
        let (value, version) = envelope()
            .unwrap(json!({"_version": 2, "theme": "light"}), true)
            .unwrap();
        assert_eq!(value, json!({"theme": "light"}));
        assert_eq!(version, Some(2));
    }

    #[test]
    fn unwrap_custom_key() {
        let env = VersionEnvelope::new("schemaVersion");
        let (value, version) = env
            .unwrap(json!({"schemaVersion": 1, "_version": "kept"}), true)
            .unwrap();
        assert_eq!(version, Some(1));
        assert_eq!(value, json!({"_version": "kept"}));
    }

    #[test]
    fn missing_tag_is_reported_as_missing() {
        let err = envelope().unwrap(json!({"theme": "dark"}), true).unwrap_err();
        assert!(err.is_missing());

        let err = envelope().unwrap(json!("just a string"), true).unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn malformed_tags_are_rejected() {
        for tag in [json!(0), json!(-1), json!(1.5), json!("1"), json!(null), json!(true)] {
            let err = envelope()
                .unwrap(json!({"_version": tag.clone(), "a": 1}), true)
                .unwrap_err();
            assert!(!err.is_missing(), "tag {tag} should be malformed, got {err}");
        }
    }

    #[test]
    fn integral_float_tag_is_accepted() {
        let (_, version) = envelope().unwrap(json!({"_version": 2.0}), true).unwrap();
        assert_eq!(version, Some(2));
    }

    #[test]
    fn oversized_tag_is_out_of_range() {
        let err = envelope()
            .unwrap(json!({"_version": u64::from(u32::MAX) + 1}), true)
            .unwrap_err();
        assert!(matches!(err, TagFault::OutOfRange { .. }));
    }

    #[test]
    fn peek_reads_without_consuming() {
        let doc = json!({"_version": 4, "a": 1});
        assert_eq!(envelope().peek(&doc).unwrap(), 4);
        assert_eq!(doc["a"], 1);
    }

    proptest! {
        #[test]
        fn prop_wrap_then_unwrap_restores_value(
            version in 1u32..10_000,
            fields in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8)
        ) {
            let value = Value::Object(
                fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            );
            let wrapped = envelope().wrap(value.clone(), Some(version)).unwrap();
            let (restored, found) = envelope().unwrap(wrapped, true).unwrap();
            prop_assert_eq!(found, Some(version));
            prop_assert_eq!(restored, value);
        }
    }
}
