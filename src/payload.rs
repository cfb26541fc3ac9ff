//! Wire format of remote build requests.
//!
//! A request is a JSON object delivered with content type
//! `application/json`:
//!
//! ```json
//! {"project": "app", "token": "secret", "parameter": [{"name": "BRANCH", "value": "main"}]}
//! ```
//!
//! Only `project` and `token` take part in matching. `parameter` is handed to
//! the matched trigger verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::PayloadError;

/// The only content type that is decoded. Compared exactly, case-sensitive.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Payload key holding the target project name.
pub const KEY_PROJECT: &str = "project";
/// Payload key holding the shared-secret token.
pub const KEY_TOKEN: &str = "token";
/// Payload key holding the build parameter array.
pub const KEY_PARAMETER: &str = "parameter";

/// A decoded remote build request.
///
/// `project` and `token` hold the field's text. Numbers and booleans are
/// read as their JSON text (`42`, `true`); a missing field or one holding
/// null, an array or an object is `None`, and such a request never matches
/// any trigger.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildRequest {
    project: Option<String>,
    token: Option<String>,
    parameters: Vec<Value>,
}

impl BuildRequest {
    /// Decode a raw message body.
    ///
    /// Fails with [`PayloadError::UnsupportedContentType`] for anything but
    /// `application/json`, before the body is looked at.
    pub fn decode(content_type: &str, body: &[u8]) -> Result<Self, PayloadError> {
        if content_type != CONTENT_TYPE_JSON {
            return Err(PayloadError::UnsupportedContentType {
                content_type: content_type.to_string(),
            });
        }

        let text = std::str::from_utf8(body)
            .map_err(|source| PayloadError::InvalidEncoding { source })?;
        Self::parse(text)
    }

    /// Parse JSON text that must hold an object.
    pub fn parse(text: &str) -> Result<Self, PayloadError> {
        let value: Value =
            serde_json::from_str(text).map_err(|source| PayloadError::InvalidJson { source })?;
        match value {
            Value::Object(map) => Ok(Self::from_object(map)),
            other => Err(PayloadError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }

    /// Build a request from an already parsed JSON object.
    #[must_use]
    pub fn from_object(mut map: Map<String, Value>) -> Self {
        let parameters = match map.remove(KEY_PARAMETER) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                debug!(
                    found = json_kind(&other),
                    "'parameter' is not an array; scheduling without parameters"
                );
                Vec::new()
            }
        };

        Self {
            project: take_text(&mut map, KEY_PROJECT),
            token: take_text(&mut map, KEY_TOKEN),
            parameters,
        }
    }

    /// Create a request directly, mostly useful for hosts and tests.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        token: impl Into<String>,
        parameters: Vec<Value>,
    ) -> Self {
        Self {
            project: Some(project.into()),
            token: Some(token.into()),
            parameters,
        }
    }

    /// Requested project name, if the payload carried one.
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Shared-secret token, if the payload carried one.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The `parameter` array exactly as it appeared in the payload.
    #[must_use]
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }
}

fn take_text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A `{name, value}` build parameter descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildParameter {
    /// Parameter name as defined on the build job.
    pub name: String,
    /// Parameter value, `null` when the descriptor had none.
    #[serde(default)]
    pub value: Value,
}

impl BuildParameter {
    /// Create a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Interpret a raw `parameter` array.
    ///
    /// Entries without a string `name` are skipped.
    #[must_use]
    pub fn from_values(values: &[Value]) -> Vec<Self> {
        let mut out = Vec::with_capacity(values.len());
        for (index, raw) in values.iter().enumerate() {
            let Some(obj) = raw.as_object() else {
                debug!(index, "skipping build parameter: not an object");
                continue;
            };
            let Some(name) = obj.get("name").and_then(Value::as_str) else {
                debug!(index, "skipping build parameter: missing 'name'");
                continue;
            };
            out.push(Self {
                name: name.to_string(),
                value: obj.get("value").cloned().unwrap_or(Value::Null),
            });
        }
        out
    }
}
