//! Per-conversation session state for the generation pipeline.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::registry::CollaboratorName;

/// Pipeline stage marker for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    /// Nothing produced yet.
    Start,
    /// Documentation extracted.
    DocumentationComplete,
    /// Workflows analyzed.
    WorkflowsComplete,
    /// Server code generated.
    Complete,
}

impl WorkflowStep {
    /// String form used in progress reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::Start => "start",
            WorkflowStep::DocumentationComplete => "documentation_complete",
            WorkflowStep::WorkflowsComplete => "workflows_complete",
            WorkflowStep::Complete => "complete",
        }
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one conversation as it moves through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: String,
    /// Extracted API documentation.
    pub documentation: Option<String>,
    /// Workflow analysis derived from the documentation.
    pub workflows: Option<String>,
    /// Generated MCP server/tool code.
    pub generated_code: Option<String>,
    /// Current pipeline stage.
    pub current_step: WorkflowStep,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last touched.
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session at the start of the pipeline.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            documentation: None,
            workflows: None,
            generated_code: None,
            current_step: WorkflowStep::Start,
            created_at: now,
            last_activity_at: now,
        }
    }

    /// The collaborator that would advance this session, or `None` once the
    /// pipeline has produced code.
    pub fn next_stage(&self) -> Option<CollaboratorName> {
        if self.documentation.is_none() {
            Some(CollaboratorName::DocExtractor)
        } else if self.workflows.is_none() {
            Some(CollaboratorName::WorkflowGenerator)
        } else if self.generated_code.is_none() {
            Some(CollaboratorName::McpGenerator)
        } else {
            None
        }
    }

    /// Merge an update into the session and recompute the stage marker.
    fn apply(&mut self, update: SessionUpdate) {
        if let Some(documentation) = update.documentation {
            self.documentation = Some(documentation);
        }
        if let Some(workflows) = update.workflows {
            self.workflows = Some(workflows);
        }
        if let Some(generated_code) = update.generated_code {
            self.generated_code = Some(generated_code);
        }
        self.current_step = if self.generated_code.is_some() {
            WorkflowStep::Complete
        } else if self.workflows.is_some() {
            WorkflowStep::WorkflowsComplete
        } else if self.documentation.is_some() {
            WorkflowStep::DocumentationComplete
        } else {
            WorkflowStep::Start
        };
        self.last_activity_at = Utc::now();
    }

    /// Format a human-readable progress report for the `status` command.
    pub fn progress_report(&self) -> String {
        let stage = |done: bool| if done { "Complete" } else { "Pending" };
        format!(
            "**Session Progress** (`{}`)\n\n\
             Current step: {}\n\n\
             - Documentation: {}\n\
             - Workflows: {}\n\
             - Generated code: {}\n\n\
             Created: {} | Last activity: {}",
            self.id,
            self.current_step,
            stage(self.documentation.is_some()),
            stage(self.workflows.is_some()),
            stage(self.generated_code.is_some()),
            self.created_at.to_rfc3339(),
            self.last_activity_at.to_rfc3339(),
        )
    }
}

/// Fields to merge into a session after a successful collaborator call.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub documentation: Option<String>,
    pub workflows: Option<String>,
    pub generated_code: Option<String>,
}

impl SessionUpdate {
    /// Update carrying extracted documentation.
    pub fn documentation(text: impl Into<String>) -> Self {
        Self {
            documentation: Some(text.into()),
            ..Default::default()
        }
    }

    /// Update carrying a workflow analysis.
    pub fn workflows(text: impl Into<String>) -> Self {
        Self {
            workflows: Some(text.into()),
            ..Default::default()
        }
    }

    /// Update carrying generated server code.
    pub fn generated_code(text: impl Into<String>) -> Self {
        Self {
            generated_code: Some(text.into()),
            ..Default::default()
        }
    }
}

/// In-memory session store. The only shared mutable state in the agent;
/// a single mutex serializes access so concurrent tasks for the same session
/// cannot interleave their updates.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `id`, creating a fresh one on first reference.
    pub async fn get_or_create(&self, id: &str) -> Session {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id))
            .clone()
    }

    /// Merge `update` into the session, refreshing `last_activity_at`.
    /// Creates the session first if it does not exist yet.
    pub async fn update(&self, id: &str, update: SessionUpdate) -> Session {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id));
        session.apply(update);
        session.clone()
    }

    /// Delete the session so the next `get_or_create` starts fresh.
    /// Returns whether a session existed.
    pub async fn reset(&self, id: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(id).is_some()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_starts_fresh() {
        let store = SessionStore::new();
        let session = store.get_or_create("s-1").await;
        assert_eq!(session.current_step, WorkflowStep::Start);
        assert!(session.documentation.is_none());
        assert!(session.workflows.is_none());
        assert!(session.generated_code.is_none());
    }

    #[tokio::test]
    async fn test_get_or_create_returns_existing() {
        let store = SessionStore::new();
        store
            .update("s-1", SessionUpdate::documentation("api docs"))
            .await;
        let session = store.get_or_create("s-1").await;
        assert_eq!(session.documentation.as_deref(), Some("api docs"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_advances_step_and_refreshes_activity() {
        let store = SessionStore::new();
        let created = store.get_or_create("s-1").await;

        let session = store
            .update("s-1", SessionUpdate::documentation("api docs"))
            .await;
        assert_eq!(session.current_step, WorkflowStep::DocumentationComplete);
        assert!(session.last_activity_at >= created.last_activity_at);

        let session = store
            .update("s-1", SessionUpdate::workflows("workflow analysis"))
            .await;
        assert_eq!(session.current_step, WorkflowStep::WorkflowsComplete);

        let session = store
            .update("s-1", SessionUpdate::generated_code("def tool(): ..."))
            .await;
        assert_eq!(session.current_step, WorkflowStep::Complete);
        assert!(session.next_stage().is_none());
    }

    #[tokio::test]
    async fn test_reset_forgets_session() {
        let store = SessionStore::new();
        store
            .update("s-1", SessionUpdate::documentation("api docs"))
            .await;
        assert!(store.reset("s-1").await);
        assert!(!store.reset("s-1").await);

        let session = store.get_or_create("s-1").await;
        assert_eq!(session.current_step, WorkflowStep::Start);
        assert!(session.documentation.is_none());
    }

    #[test]
    fn test_progress_report_fresh_session() {
        let session = Session::new("s-1");
        let report = session.progress_report();
        assert!(report.contains("Current step: start"));
        assert_eq!(report.matches("Pending").count(), 3);
    }

    #[test]
    fn test_next_stage_follows_pipeline_order() {
        let mut session = Session::new("s-1");
        assert_eq!(session.next_stage(), Some(CollaboratorName::DocExtractor));
        session.apply(SessionUpdate::documentation("docs"));
        assert_eq!(
            session.next_stage(),
            Some(CollaboratorName::WorkflowGenerator)
        );
        session.apply(SessionUpdate::workflows("flows"));
        assert_eq!(session.next_stage(), Some(CollaboratorName::McpGenerator));
    }
}
