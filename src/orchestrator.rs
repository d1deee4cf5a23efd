//! Root orchestrator: session coordination and the task-handler state machine.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::collaborator::{CollaboratorClient, CollaboratorReply};
use crate::error::Error;
use crate::protocol::{TaskError, TaskRequest, TaskResponse};
use crate::registry::{AgentRegistry, CollaboratorName};
use crate::retry::{call_with_retry, RetryPolicy};
use crate::router::{ensure_prerequisites, parse_directive, IntentClassifier, Router};
use crate::session::{SessionStore, SessionUpdate};

/// Prompt returned for empty requests.
const INPUT_PROMPT: &str = "Please provide a request to process. I can extract API documentation, \
     analyze it into workflows, generate MCP server code, or report this \
     session's progress (`status`, `reset`).";

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Retry policy for collaborator calls.
    pub retry: RetryPolicy,
    /// Character budget for the request excerpt in failure payloads.
    pub excerpt_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            excerpt_chars: 120,
        }
    }
}

/// Root coordination agent for the generation pipeline.
///
/// Owns the session store and the agent registry explicitly; nothing here is
/// ambient module state. Collaborators are reached through the injected
/// [`CollaboratorClient`] so tests can script them.
pub struct RootOrchestrator {
    sessions: Arc<SessionStore>,
    registry: AgentRegistry,
    router: Router,
    client: Arc<dyn CollaboratorClient>,
    config: OrchestratorConfig,
}

impl RootOrchestrator {
    /// Create an orchestrator with default configuration and no classifier.
    pub fn new(registry: AgentRegistry, client: Arc<dyn CollaboratorClient>) -> Self {
        Self::with_config(registry, client, OrchestratorConfig::default())
    }

    /// Create an orchestrator with custom configuration.
    pub fn with_config(
        registry: AgentRegistry,
        client: Arc<dyn CollaboratorClient>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            registry,
            router: Router::new(),
            client,
            config,
        }
    }

    /// Attach an LLM classifier as the router's last-resort fallback.
    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.router = Router::with_classifier(classifier);
        self
    }

    /// Shared handle to the session store.
    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.sessions)
    }

    /// Handle one inbound task.
    ///
    /// Every error kind is converted into a terminal response here; this
    /// method never fails the serving loop.
    pub async fn handle_task(&self, request: TaskRequest) -> TaskResponse {
        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let text = request.message.trim();

        if text.is_empty() {
            return TaskResponse::input_required(session_id, INPUT_PROMPT);
        }

        // In-band control commands bypass the router.
        match text.to_lowercase().as_str() {
            "status" => {
                let session = self.sessions.get_or_create(&session_id).await;
                let next_step = session.next_stage().map(|n| n.to_string());
                return TaskResponse::completed(session_id, session.progress_report(), next_step);
            }
            "reset" => {
                let existed = self.sessions.reset(&session_id).await;
                info!(session = %session_id, existed, "session reset");
                return TaskResponse::completed(
                    session_id,
                    "Session reset. The next request starts the pipeline from the beginning.",
                    Some(CollaboratorName::DocExtractor.to_string()),
                );
            }
            _ => {}
        }

        // Explicit @<collaborator> directive overrides the automatic router.
        let (forced, text) = match parse_directive(text) {
            Ok(parsed) => parsed,
            Err(err) => return self.failure(err, &session_id, text),
        };
        if text.is_empty() {
            return TaskResponse::input_required(session_id, INPUT_PROMPT);
        }

        let session = self.sessions.get_or_create(&session_id).await;
        let target = match forced {
            Some(name) => name,
            None => self.router.decide(text, &session).await,
        };

        // Prerequisite guard applies to forced routes too.
        if let Err(err) = ensure_prerequisites(target, &session) {
            warn!(session = %session_id, collaborator = %target, error = %err, "route rejected");
            return self.failure(err, &session_id, text);
        }

        info!(session = %session_id, collaborator = %target, "dispatching task");
        match self.call_collaborator(target, text).await {
            Ok(payload) => self.complete(&session_id, target, payload).await,
            Err(err) => {
                warn!(session = %session_id, collaborator = %target, error = %err, "task failed");
                self.failure(err, &session_id, text)
            }
        }
    }

    /// Invoke a collaborator with retry, normalizing application errors.
    async fn call_collaborator(
        &self,
        target: CollaboratorName,
        text: &str,
    ) -> crate::error::Result<String> {
        let collaborator = self.registry.get(target).clone();
        let client = Arc::clone(&self.client);
        let message = text.to_string();

        call_with_retry(self.config.retry, move || {
            let client = Arc::clone(&client);
            let collaborator = collaborator.clone();
            let message = message.clone();
            async move {
                match client.call(&collaborator, &message).await? {
                    CollaboratorReply::Success { payload } => Ok(payload),
                    CollaboratorReply::Error { error_message } => Err(Error::CollaboratorError {
                        collaborator: collaborator.name,
                        message: error_message,
                    }),
                }
            }
        })
        .await
    }

    /// Merge a successful collaborator result into the session and build the
    /// completed response with its next-step hint.
    async fn complete(
        &self,
        session_id: &str,
        target: CollaboratorName,
        payload: String,
    ) -> TaskResponse {
        let (heading, update) = match target {
            CollaboratorName::DocExtractor => (
                "Documentation Extraction Result",
                SessionUpdate::documentation(payload.clone()),
            ),
            CollaboratorName::WorkflowGenerator => (
                "Workflow Analysis Result",
                SessionUpdate::workflows(payload.clone()),
            ),
            CollaboratorName::McpGenerator => (
                "Generated MCP Code",
                SessionUpdate::generated_code(payload.clone()),
            ),
        };

        let session = self.sessions.update(session_id, update).await;
        info!(session = %session_id, step = %session.current_step, "session advanced");

        let text = match session.next_stage() {
            Some(next) => format!(
                "**{}**\n\n{}\n\n_Next step: {}_",
                heading, payload, next
            ),
            None => format!("**{}**\n\n{}\n\n_Pipeline complete._", heading, payload),
        };
        TaskResponse::completed(
            session_id,
            text,
            session.next_stage().map(|n| n.to_string()),
        )
    }

    /// Build a failed response carrying the diagnostic payload.
    fn failure(&self, err: Error, session_id: &str, request_text: &str) -> TaskResponse {
        let error = TaskError {
            message: err.to_string(),
            collaborator: err.collaborator().map(|c| c.to_string()),
            session_id: Some(session_id.to_string()),
            request_excerpt: Some(truncate_chars(request_text, self.config.excerpt_chars)),
        };
        TaskResponse::failed(session_id, error)
    }
}

/// Truncate to at most `max` characters, on a char boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}
