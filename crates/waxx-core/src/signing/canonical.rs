//! Canonical query strings for signed GET requests.
//!
//! Parameters are sorted by key and each key and value is percent-encoded
//! with the same unreserved set as URI-component encoding, so a parameter
//! set always produces the same string no matter how it was built.

use crate::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Characters left unescaped: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single key or value.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Render a number the way the API's verifier does: whole-valued floats
/// carry no fraction (`1.0` is `"1"`, `-0.0` is `"0"`).
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{:.0}", f)
            }
        }
        _ => n.to_string(),
    }
}

/// Query parameters of a signed request, kept in key order.
///
/// Inserting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    entries: BTreeMap<String, String>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical (ascending key) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build parameters from a serializable flat struct or map.
    ///
    /// Strings are taken as-is; numbers, booleans and null are rendered as
    /// text. Nested objects and arrays have no text form and are rejected.
    #[allow(clippy::result_large_err)]
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value).map_err(|e| Error::Signing {
            message: format!("Request parameters are not serializable: {}", e),
        })?;

        let object = match value {
            Value::Object(object) => object,
            Value::Null => return Ok(Self::new()),
            other => {
                return Err(Error::Signing {
                    message: format!("Request parameters must be a flat object, got {}", other),
                })
            }
        };

        let mut params = Self::new();
        for (key, value) in object {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => number_text(&n),
                Value::Bool(b) => b.to_string(),
                Value::Null => "null".to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(Error::Signing {
                        message: format!("Parameter '{}' has no text representation", key),
                    })
                }
            };
            params.insert(key, text);
        }
        Ok(params)
    }

    /// The canonical query string: `k1=v1&k2=v2`, empty when there are no
    /// parameters.
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
