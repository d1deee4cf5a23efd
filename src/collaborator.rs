//! Collaborator boundary: client trait and reply normalization.
//!
//! The remote agents answer in whatever shape their prototype emits — plain
//! text, JSON-in-a-string, or an object whose payload hides behind any of
//! several keys. Every adapter normalizes into [`CollaboratorReply`] here so
//! the rest of the agent only ever sees one tagged result type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::registry::Collaborator;

/// Keys the prototype agents have been observed to put their payload under.
const PAYLOAD_KEYS: &[&str] = &[
    "payload",
    "documentation",
    "workflows",
    "code",
    "response",
    "result",
    "text",
    "output",
];

/// Keys that may carry an error description.
const ERROR_KEYS: &[&str] = &["error_message", "error", "message"];

/// Normalized collaborator reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CollaboratorReply {
    /// The collaborator produced a result.
    Success { payload: String },
    /// The collaborator reported an application error.
    Error { error_message: String },
}

impl CollaboratorReply {
    /// Normalize a raw response body.
    ///
    /// Bodies that parse as JSON go through [`CollaboratorReply::from_value`];
    /// anything else is taken verbatim as a successful text payload.
    pub fn from_text(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => CollaboratorReply::Success {
                payload: body.to_string(),
            },
        }
    }

    /// Normalize a parsed JSON value.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => CollaboratorReply::Success { payload: text },
            Value::Object(map) => {
                let status = map.get("status").and_then(Value::as_str);
                if status == Some("error") {
                    let error_message = ERROR_KEYS
                        .iter()
                        .find_map(|key| map.get(*key).and_then(Value::as_str))
                        .unwrap_or("collaborator reported an error")
                        .to_string();
                    return CollaboratorReply::Error { error_message };
                }

                let payload = PAYLOAD_KEYS
                    .iter()
                    .find_map(|key| map.get(*key))
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| Value::Object(map.clone()).to_string());
                CollaboratorReply::Success { payload }
            }
            other => CollaboratorReply::Success {
                payload: other.to_string(),
            },
        }
    }
}

/// Client used to invoke a remote collaborator.
///
/// The orchestrator only depends on this trait; tests substitute scripted
/// implementations.
#[async_trait]
pub trait CollaboratorClient: Send + Sync {
    /// Send `message` to `collaborator` and return the normalized reply.
    ///
    /// Connection-level failures surface as
    /// [`Error::CollaboratorUnavailable`]; application-level errors come back
    /// as [`CollaboratorReply::Error`].
    async fn call(&self, collaborator: &Collaborator, message: &str) -> Result<CollaboratorReply>;
}

/// HTTP client posting JSON tasks to collaborator endpoints.
pub struct HttpCollaboratorClient {
    http: reqwest::Client,
}

impl HttpCollaboratorClient {
    /// Create a client with default settings.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpCollaboratorClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollaboratorClient for HttpCollaboratorClient {
    async fn call(&self, collaborator: &Collaborator, message: &str) -> Result<CollaboratorReply> {
        let response = self
            .http
            .post(&collaborator.url)
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await
            .map_err(|e| Error::CollaboratorUnavailable {
                collaborator: collaborator.name,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(Error::CollaboratorUnavailable {
                collaborator: collaborator.name,
                message: format!("endpoint returned {}", status),
            });
        }
        if !status.is_success() {
            return Err(Error::CollaboratorError {
                collaborator: collaborator.name,
                message: format!("endpoint returned {}", status),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::CollaboratorUnavailable {
                collaborator: collaborator.name,
                message: e.to_string(),
            })?;

        Ok(CollaboratorReply::from_text(&body))
    }
}
