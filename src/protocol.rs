//! Task protocol definitions.
//!
//! One task request per line in, one response per line out. A request carries
//! free-form message text plus an optional session identifier; a response
//! carries a terminal status and either human-readable text or a structured
//! error object.

use serde::{Deserialize, Serialize};

/// Inbound task request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Free-text message. May start with an in-band command (`status`,
    /// `reset`) or an `@<collaborator>` routing directive.
    pub message: String,
    /// Session to operate on. A fresh id is minted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// The request carried no usable text; the caller should re-prompt.
    InputRequired,
    /// A collaborator call is in flight.
    Working,
    /// The task finished and the session was updated.
    Completed,
    /// The task failed; see the error object.
    Failed,
}

/// Outbound task response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Terminal status of the task.
    pub state: TaskState,
    /// Session the task ran against (echoed back so callers can continue
    /// the conversation). Absent only for malformed requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Human-readable result or prompt text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Suggested collaborator for the next pipeline stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    /// Structured error details (on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
}

impl TaskResponse {
    /// Create a completed response.
    pub fn completed(
        session_id: impl Into<String>,
        text: impl Into<String>,
        next_step: Option<String>,
    ) -> Self {
        Self {
            state: TaskState::Completed,
            session_id: Some(session_id.into()),
            text: Some(text.into()),
            next_step,
            error: None,
        }
    }

    /// Create an input-required response.
    pub fn input_required(session_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            state: TaskState::InputRequired,
            session_id: Some(session_id.into()),
            text: Some(prompt.into()),
            next_step: None,
            error: None,
        }
    }

    /// Create a failed response.
    pub fn failed(session_id: impl Into<String>, error: TaskError) -> Self {
        Self {
            state: TaskState::Failed,
            session_id: Some(session_id.into()),
            text: None,
            next_step: None,
            error: Some(error),
        }
    }

    /// Create a failed response for a request that never reached a session
    /// (e.g. a frame that did not parse).
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self {
            state: TaskState::Failed,
            session_id: None,
            text: None,
            next_step: None,
            error: Some(TaskError {
                message: message.into(),
                collaborator: None,
                session_id: None,
                request_excerpt: None,
            }),
        }
    }
}

/// Structured error payload attached to failed responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskError {
    /// Human-readable description of the failure.
    pub message: String,
    /// Collaborator involved, if the failure occurred during routing or a
    /// collaborator call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborator: Option<String>,
    /// Session the failing task ran against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Truncated copy of the original request, for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_excerpt: Option<String>,
}
