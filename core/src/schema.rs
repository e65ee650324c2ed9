//! Event envelope schema.
//!
//! The intake endpoint accepts bodies of the form
//!
//! ```json
//! {
//!   "id": "evt_1",
//!   "event": {
//!     "name": "user.created",
//!     "payload": { "plan": "pro" },
//!     "context": { "source": "signup" },
//!     "timestamp": "2024-03-01T12:00:00Z"
//!   }
//! }
//! ```
//!
//! `serde` stops at the first mismatch, but a 422 response has to list every
//! problem with the body, so validation walks the raw [`serde_json::Value`]
//! and collects [`Issue`]s instead. Unknown keys are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A custom event as defined by the shared cross-service event schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    /// Event name (e.g. `"user.created"`).
    pub name: String,

    /// Arbitrary JSON payload. Required, may be `null`.
    pub payload: Value,

    /// Optional arbitrary JSON context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Optional client-side timestamp (UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// The validated intake body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Client-supplied idempotency / correlation token.
    pub id: String,

    /// The event itself.
    pub event: CustomEvent,
}

/// Kind of schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    /// Value missing or of the wrong JSON type.
    InvalidType,
    /// String present but not in the required format.
    InvalidString,
}

impl IssueCode {
    /// Wire name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidType => "invalid_type",
            Self::InvalidString => "invalid_string",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Violation kind.
    pub code: IssueCode,
    /// Location of the offending value, outermost key first.
    pub path: Vec<String>,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Code: {} ~ Path: {} ~ Message: {}",
            self.code,
            self.path.join("."),
            self.message
        )
    }
}

/// Every violation found in a body. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<Issue>,
}

impl ValidationErrors {
    /// The individual issues, in document order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl EventEnvelope {
    /// Validate a parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns every schema violation found if the body does not match.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gateway_core::EventEnvelope;
    /// let body = serde_json::json!({ "event": { "name": 1 } });
    /// let errors = EventEnvelope::from_json(&body).unwrap_err();
    /// // id missing, event.name wrong type, event.payload missing
    /// assert_eq!(errors.issues().len(), 3);
    /// ```
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::default();
        let envelope = v.envelope(value);

        match envelope {
            Some(envelope) if v.issues.is_empty() => Ok(envelope),
            _ => Err(ValidationErrors { issues: v.issues }),
        }
    }
}

#[derive(Default)]
struct Validator {
    path: Vec<String>,
    issues: Vec<Issue>,
}

impl Validator {
    fn envelope(&mut self, value: &Value) -> Option<EventEnvelope> {
        let object = self.object(value)?;

        let id = self.field(object, "id", |v, value| v.string(value));
        let event = self.field(object, "event", |v, value| v.custom_event(value));

        Some(EventEnvelope { id: id?, event: event? })
    }

    fn custom_event(&mut self, value: &Value) -> Option<CustomEvent> {
        let object = self.object(value)?;

        let name = self.field(object, "name", |v, value| v.string(value));
        let payload = self.field(object, "payload", |_, value| Some(value.clone()));
        let context = self.optional_field(object, "context", |_, value| Some(value.clone()));
        let timestamp = self.optional_field(object, "timestamp", |v, value| v.datetime(value));

        Some(CustomEvent {
            name: name?,
            payload: payload?,
            context: context?,
            timestamp: timestamp?,
        })
    }

    /// Required key. Missing keys are reported as `Required`.
    fn field<T>(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        check: impl FnOnce(&mut Self, &Value) -> Option<T>,
    ) -> Option<T> {
        self.path.push(key.to_string());
        let result = match object.get(key) {
            Some(value) => check(self, value),
            None => {
                self.push(IssueCode::InvalidType, "Required".to_string());
                None
            }
        };
        self.path.pop();
        result
    }

    /// Optional key. Returns `Some(None)` when absent, `None` when invalid.
    fn optional_field<T>(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        check: impl FnOnce(&mut Self, &Value) -> Option<T>,
    ) -> Option<Option<T>> {
        let Some(value) = object.get(key) else {
            return Some(None);
        };

        self.path.push(key.to_string());
        let result = check(self, value).map(Some);
        self.path.pop();
        result
    }

    fn object<'v>(&mut self, value: &'v Value) -> Option<&'v Map<String, Value>> {
        if let Value::Object(object) = value {
            Some(object)
        } else {
            self.type_mismatch("object", value);
            None
        }
    }

    fn string(&mut self, value: &Value) -> Option<String> {
        if let Value::String(s) = value {
            Some(s.clone())
        } else {
            self.type_mismatch("string", value);
            None
        }
    }

    /// ISO 8601 datetime in UTC: `YYYY-MM-DDTHH:MM:SS[.fff]Z`.
    fn datetime(&mut self, value: &Value) -> Option<DateTime<Utc>> {
        let raw = self.string(value)?;

        let parsed = is_utc_datetime_shape(&raw)
            .then(|| DateTime::parse_from_rfc3339(&raw).ok())
            .flatten();

        if let Some(parsed) = parsed {
            Some(parsed.with_timezone(&Utc))
        } else {
            self.push(IssueCode::InvalidString, "Invalid datetime".to_string());
            None
        }
    }

    fn type_mismatch(&mut self, expected: &str, received: &Value) {
        self.push(
            IssueCode::InvalidType,
            format!("Expected {expected}, received {}", json_kind(received)),
        );
    }

    fn push(&mut self, code: IssueCode, message: String) {
        self.issues.push(Issue {
            code,
            path: self.path.clone(),
            message,
        });
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Exact shape check; chrono's RFC 3339 parser is more lenient (space or
/// lowercase `t` as separator).
fn is_utc_datetime_shape(raw: &str) -> bool {
    const SHAPE: &[u8; 19] = b"dddd-dd-ddTdd:dd:dd";

    let bytes = raw.as_bytes();
    if bytes.len() < 20 || bytes[bytes.len() - 1] != b'Z' {
        return false;
    }

    let shape_ok = SHAPE.iter().zip(bytes).all(|(expected, actual)| match expected {
        b'd' => actual.is_ascii_digit(),
        sep => actual == sep,
    });

    let fraction = &bytes[19..bytes.len() - 1];
    let fraction_ok = match fraction.split_first() {
        None => true,
        Some((b'.', digits)) => !digits.is_empty() && digits.iter().all(u8::is_ascii_digit),
        Some(_) => false,
    };

    shape_ok && fraction_ok
}
