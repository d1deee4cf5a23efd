//! Root Orchestration Agent for the MCP Generation Pipeline
//!
//! This crate coordinates a three-stage multi-agent pipeline that turns a
//! natural-language request ("build me an MCP server for API X") into
//! generated server code. It provides:
//!
//! - Per-session workflow tracking (documentation → workflows → code)
//! - Keyword/state/LLM routing of free-text requests to collaborators
//! - Bounded exponential-backoff retry around collaborator calls
//! - A normalized collaborator reply type at every adapter boundary
//! - In-band control commands and explicit `@<collaborator>` routing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Caller / Frontend                      │
//! └───────────────────────────┬─────────────────────────────────────┘
//!                             │ Task protocol (JSON lines over stdio)
//!                             ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       mcp-pipeline-agent                        │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐   │
//! │  │ Session    │ │ Router     │ │ Retry      │ │ Agent      │   │
//! │  │ Store      │ │            │ │ Wrapper    │ │ Registry   │   │
//! │  └────────────┘ └────────────┘ └────────────┘ └────────────┘   │
//! └───────────────────────────┬─────────────────────────────────────┘
//!                             │
//!         ┌───────────────────┼───────────────────┐
//!         ▼                   ▼                   ▼
//! ┌───────────────┐ ┌───────────────┐ ┌───────────────┐
//! │ doc_extractor │ │ workflow_     │ │ mcp_generator │
//! │    :10001     │ │ generator     │ │    :10003     │
//! │               │ │    :10002     │ │               │
//! └───────────────┘ └───────────────┘ └───────────────┘
//! ```
//!
//! # In-band commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `status` | Formatted progress report for the session |
//! | `reset` | Clears the session; the pipeline starts over |
//! | `@<collaborator> <text>` | Forces routing, overriding the router |

pub mod collaborator;
pub mod error;
pub mod orchestrator;
pub mod protocol;
pub mod registry;
pub mod retry;
pub mod router;
pub mod server;
pub mod session;

pub use collaborator::{CollaboratorClient, CollaboratorReply, HttpCollaboratorClient};
pub use error::{Error, Result};
pub use orchestrator::{OrchestratorConfig, RootOrchestrator};
pub use protocol::{TaskError, TaskRequest, TaskResponse, TaskState};
pub use registry::{AgentRegistry, Collaborator, CollaboratorName};
pub use retry::{call_with_retry, RetryPolicy};
pub use router::{IntentClassifier, LlmIntentClassifier, Router};
pub use server::AgentServer;
pub use session::{Session, SessionStore, SessionUpdate, WorkflowStep};
