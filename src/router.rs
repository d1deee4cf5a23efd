//! Request routing across the pipeline collaborators.
//!
//! Priority ladder: explicit keywords in the request text, then the session's
//! workflow progression, then a best-effort LLM classifier, then the safe
//! default (the extractor). Explicit user intent always wins over state.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::CollaboratorName;
use crate::session::Session;

/// Keywords that force routing to the documentation extractor.
const DOC_KEYWORDS: &[&str] = &["document", "extract", "api"];
/// Keywords that force routing to the workflow generator.
const WORKFLOW_KEYWORDS: &[&str] = &["workflow", "analyze"];
/// Keywords that force routing to the code generator.
const CODE_KEYWORDS: &[&str] = &["mcp", "generate", "code"];

/// Best-effort intent classifier consulted when neither keywords nor session
/// state decide the route.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify free text into the collaborator that should handle it.
    async fn classify(&self, text: &str) -> Result<CollaboratorName>;
}

/// LLM-backed classifier posting the request text to a completion endpoint
/// and reading a collaborator name out of the reply.
pub struct LlmIntentClassifier {
    http: reqwest::Client,
    url: String,
}

impl LlmIntentClassifier {
    /// Create a classifier against the given completion endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, text: &str) -> Result<CollaboratorName> {
        let prompt = format!(
            "Pick the agent for this request. Answer with exactly one of \
             doc_extractor, workflow_generator, mcp_generator.\n\nRequest: {}",
            text
        );
        let body = self
            .http
            .post(&self.url)
            .json(&serde_json::json!({ "message": prompt }))
            .send()
            .await
            .map_err(|e| Error::Protocol(format!("classifier call failed: {}", e)))?
            .text()
            .await
            .map_err(|e| Error::Protocol(format!("classifier reply unreadable: {}", e)))?;

        let lower = body.to_lowercase();
        CollaboratorName::all()
            .into_iter()
            .find(|name| lower.contains(name.as_str()))
            .ok_or_else(|| Error::Protocol(format!("classifier gave no collaborator: {}", body)))
    }
}

/// Router deciding which collaborator handles the next step.
#[derive(Default)]
pub struct Router {
    classifier: Option<Arc<dyn IntentClassifier>>,
}

impl Router {
    /// Create a router without a classifier fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router with an LLM classifier fallback.
    pub fn with_classifier(classifier: Arc<dyn IntentClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    /// Decide the collaborator for `text` given the session's progress.
    pub async fn decide(&self, text: &str, session: &Session) -> CollaboratorName {
        if let Some(name) = keyword_match(text) {
            debug!(collaborator = %name, "routed by keyword");
            return name;
        }

        if let Some(name) = session.next_stage() {
            debug!(collaborator = %name, step = %session.current_step, "routed by session state");
            return name;
        }

        if let Some(classifier) = &self.classifier {
            match classifier.classify(text).await {
                Ok(name) => {
                    debug!(collaborator = %name, "routed by classifier");
                    return name;
                }
                Err(err) => {
                    debug!(error = %err, "classifier failed, using default route");
                }
            }
        }

        CollaboratorName::DocExtractor
    }
}

/// Match explicit routing keywords in the request text.
fn keyword_match(text: &str) -> Option<CollaboratorName> {
    let lower = text.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if contains_any(DOC_KEYWORDS) {
        Some(CollaboratorName::DocExtractor)
    } else if contains_any(WORKFLOW_KEYWORDS) {
        Some(CollaboratorName::WorkflowGenerator)
    } else if contains_any(CODE_KEYWORDS) {
        Some(CollaboratorName::McpGenerator)
    } else {
        None
    }
}

/// Verify that `target` may run given the session's progress.
///
/// Workflow analysis needs documentation; code generation needs workflows.
/// Violations come back as an error result naming the step that unblocks
/// them, never as an unguarded collaborator call.
pub fn ensure_prerequisites(target: CollaboratorName, session: &Session) -> Result<()> {
    match target {
        CollaboratorName::DocExtractor => Ok(()),
        CollaboratorName::WorkflowGenerator if session.documentation.is_none() => {
            Err(Error::PrerequisiteMissing {
                collaborator: target,
                missing: "documentation",
                unblock: CollaboratorName::DocExtractor,
            })
        }
        CollaboratorName::McpGenerator if session.workflows.is_none() => {
            Err(Error::PrerequisiteMissing {
                collaborator: target,
                missing: "workflows",
                unblock: CollaboratorName::WorkflowGenerator,
            })
        }
        _ => Ok(()),
    }
}

/// Parse an `@<collaborator> <text>` routing directive.
///
/// Returns the forced target (if any) and the remaining request text.
pub fn parse_directive(text: &str) -> Result<(Option<CollaboratorName>, &str)> {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix('@') else {
        return Ok((None, trimmed));
    };

    let (name, remainder) = match rest.split_once(char::is_whitespace) {
        Some((name, remainder)) => (name, remainder.trim()),
        None => (rest, ""),
    };
    let target = CollaboratorName::from_str(name)?;
    Ok((Some(target), remainder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionUpdate;

    fn session_with(
        documentation: Option<&str>,
        workflows: Option<&str>,
        generated_code: Option<&str>,
    ) -> Session {
        let mut session = Session::new("s-1");
        let update = SessionUpdate {
            documentation: documentation.map(String::from),
            workflows: workflows.map(String::from),
            generated_code: generated_code.map(String::from),
        };
        // Route through the store in real code; tests build state directly.
        session.documentation = update.documentation;
        session.workflows = update.workflows;
        session.generated_code = update.generated_code;
        session
    }

    struct FixedClassifier(CollaboratorName);

    #[async_trait]
    impl IntentClassifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<CollaboratorName> {
            Ok(self.0)
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl IntentClassifier for FailingClassifier {
        async fn classify(&self, _text: &str) -> Result<CollaboratorName> {
            Err(Error::Protocol("classifier offline".into()))
        }
    }

    #[tokio::test]
    async fn test_keywords_override_session_state() {
        let router = Router::new();
        // Session already has documentation, but the text asks for extraction.
        let session = session_with(Some("docs"), None, None);
        let decision = router
            .decide("extract the api documentation again", &session)
            .await;
        assert_eq!(decision, CollaboratorName::DocExtractor);
    }

    #[tokio::test]
    async fn test_state_progression_fallback() {
        let router = Router::new();

        let fresh = session_with(None, None, None);
        assert_eq!(
            router.decide("hello there", &fresh).await,
            CollaboratorName::DocExtractor
        );

        let with_docs = session_with(Some("docs"), None, None);
        assert_eq!(
            router.decide("hello there", &with_docs).await,
            CollaboratorName::WorkflowGenerator
        );

        let with_flows = session_with(Some("docs"), Some("flows"), None);
        assert_eq!(
            router.decide("hello there", &with_flows).await,
            CollaboratorName::McpGenerator
        );
    }

    #[tokio::test]
    async fn test_classifier_consulted_only_when_pipeline_done() {
        let router = Router::with_classifier(Arc::new(FixedClassifier(
            CollaboratorName::WorkflowGenerator,
        )));
        let done = session_with(Some("docs"), Some("flows"), Some("server.py"));
        assert_eq!(
            router.decide("hello there", &done).await,
            CollaboratorName::WorkflowGenerator
        );
    }

    #[tokio::test]
    async fn test_classifier_failure_defaults_to_extractor() {
        let router = Router::with_classifier(Arc::new(FailingClassifier));
        let done = session_with(Some("docs"), Some("flows"), Some("server.py"));
        assert_eq!(
            router.decide("hello there", &done).await,
            CollaboratorName::DocExtractor
        );
    }

    #[test]
    fn test_workflow_route_requires_documentation() {
        let fresh = session_with(None, None, None);
        let err = ensure_prerequisites(CollaboratorName::WorkflowGenerator, &fresh).unwrap_err();
        match err {
            Error::PrerequisiteMissing {
                missing, unblock, ..
            } => {
                assert_eq!(missing, "documentation");
                assert_eq!(unblock, CollaboratorName::DocExtractor);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_code_route_requires_workflows() {
        let with_docs = session_with(Some("docs"), None, None);
        let err = ensure_prerequisites(CollaboratorName::McpGenerator, &with_docs).unwrap_err();
        assert!(matches!(
            err,
            Error::PrerequisiteMissing {
                missing: "workflows",
                ..
            }
        ));
    }

    #[test]
    fn test_prerequisites_satisfied_in_order() {
        let fresh = session_with(None, None, None);
        assert!(ensure_prerequisites(CollaboratorName::DocExtractor, &fresh).is_ok());

        let with_docs = session_with(Some("docs"), None, None);
        assert!(ensure_prerequisites(CollaboratorName::WorkflowGenerator, &with_docs).is_ok());

        let with_flows = session_with(Some("docs"), Some("flows"), None);
        assert!(ensure_prerequisites(CollaboratorName::McpGenerator, &with_flows).is_ok());
    }

    #[test]
    fn test_parse_directive() {
        let (target, rest) = parse_directive("@mcp_generator generate tools").unwrap();
        assert_eq!(target, Some(CollaboratorName::McpGenerator));
        assert_eq!(rest, "generate tools");

        let (target, rest) = parse_directive("plain request").unwrap();
        assert!(target.is_none());
        assert_eq!(rest, "plain request");

        assert!(parse_directive("@frontend do things").is_err());

        let (target, rest) = parse_directive("@doc_extractor").unwrap();
        assert_eq!(target, Some(CollaboratorName::DocExtractor));
        assert_eq!(rest, "");
    }
}
