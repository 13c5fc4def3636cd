use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// The fixed call vocabulary understood by the gateway.
///
/// The serialized form is the dotted method name that travels in the
/// envelope's `component` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Component {
    /// List the application's scoreboards.
    #[strum(serialize = "ScoreBoard.getBoards")]
    GetBoards,
    /// Post a score value to a scoreboard.
    #[strum(serialize = "ScoreBoard.postScore")]
    PostScore,
    /// Fetch a paged window of scores from a scoreboard.
    #[strum(serialize = "ScoreBoard.getScores")]
    GetScores,
    /// List the application's medals.
    #[strum(serialize = "Medal.getList")]
    MedalList,
    /// Mark a medal unlocked for the current session.
    #[strum(serialize = "Medal.unlock")]
    MedalUnlock,
}

/// A single call as it travels inside the outer gateway envelope.
///
/// In plaintext form only `component` and `parameters` are set. After
/// encryption the ciphertext sits in `secure`; depending on the strategy the
/// component name either stays visible for routing or travels inside the
/// ciphertext (see [`crate::CipherStrategy`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEnvelope {
    /// Dotted method name, e.g. `Medal.unlock`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub component: Option<String>,
    /// Call parameters. Serialized as `null` when the call is encrypted.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parameters: Option<Value>,
    /// Base64 of `iv || ciphertext` for an encrypted call.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub secure: Option<String>,
}

impl CallEnvelope {
    /// Builds a plaintext call for `component`.
    #[must_use]
    pub fn new(component: Component, parameters: Option<Value>) -> Self {
        Self {
            component: Some(component.to_string()),
            parameters,
            secure: None,
        }
    }
}

/// Parsed gateway response.
///
/// The gateway replies with `{"result":{"data":{...}}}` for list calls; an
/// empty body is normal for fire-and-forget calls and calls made without a
/// session, and anything else is kept verbatim as [`Self::Malformed`] so
/// callers can decide whether they care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResponse {
    /// The `result.data` payload of a well-formed response.
    Success {
        /// The inner `data` object.
        data: Value,
    },
    /// No response body. Not an error.
    Empty,
    /// A body that is not JSON or not the expected shape.
    Malformed {
        /// The raw response body.
        body: String,
    },
}

impl GatewayResponse {
    /// Classifies a raw response body.
    #[must_use]
    pub fn from_body(body: Option<String>) -> Self {
        let Some(body) = body else {
            return Self::Empty;
        };
        if body.trim().is_empty() {
            return Self::Empty;
        }
        let data = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("result")
                    .and_then(|result| result.get("data"))
                    .cloned()
            });
        data.map_or(Self::Malformed { body }, |data| Self::Success { data })
    }

    /// Returns the `result.data` payload, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data } => Some(data),
            Self::Empty | Self::Malformed { .. } => None,
        }
    }

    /// Deserializes the list under `key` in the `data` payload, defaulting
    /// to an empty list for any missing or mismatched shape.
    #[must_use]
    pub fn list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.data()
            .and_then(|data| data.get(key))
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }
}
