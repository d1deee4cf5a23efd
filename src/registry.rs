//! Registry of the pipeline's remote collaborators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Name of a pipeline collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorName {
    /// Extracts API documentation from a website or service.
    DocExtractor,
    /// Analyzes documentation into workflow descriptions.
    WorkflowGenerator,
    /// Generates MCP tool/server code from workflows.
    McpGenerator,
}

impl CollaboratorName {
    /// All collaborators, in pipeline order.
    pub fn all() -> [CollaboratorName; 3] {
        [
            CollaboratorName::DocExtractor,
            CollaboratorName::WorkflowGenerator,
            CollaboratorName::McpGenerator,
        ]
    }

    /// Canonical string form, as used in `@<collaborator>` directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaboratorName::DocExtractor => "doc_extractor",
            CollaboratorName::WorkflowGenerator => "workflow_generator",
            CollaboratorName::McpGenerator => "mcp_generator",
        }
    }
}

impl fmt::Display for CollaboratorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollaboratorName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "doc_extractor" | "doc" | "docs" | "extractor" | "documentation" => {
                Ok(CollaboratorName::DocExtractor)
            }
            "workflow_generator" | "workflow" | "workflows" => {
                Ok(CollaboratorName::WorkflowGenerator)
            }
            "mcp_generator" | "mcp" | "generator" | "code_generator" => {
                Ok(CollaboratorName::McpGenerator)
            }
            _ => Err(Error::InvalidParams(format!("unknown collaborator: {}", s))),
        }
    }
}

/// A remote collaborator: a named agent reachable at a network address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaborator {
    /// Collaborator name.
    pub name: CollaboratorName,
    /// Network address of the collaborator's task endpoint.
    pub url: String,
}

/// Static registry of pipeline collaborators. Read-only at runtime.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    doc_extractor: Collaborator,
    workflow_generator: Collaborator,
    mcp_generator: Collaborator,
}

impl AgentRegistry {
    /// Create a registry from collaborator addresses.
    pub fn new(
        extractor_url: impl Into<String>,
        workflow_url: impl Into<String>,
        generator_url: impl Into<String>,
    ) -> Self {
        Self {
            doc_extractor: Collaborator {
                name: CollaboratorName::DocExtractor,
                url: extractor_url.into(),
            },
            workflow_generator: Collaborator {
                name: CollaboratorName::WorkflowGenerator,
                url: workflow_url.into(),
            },
            mcp_generator: Collaborator {
                name: CollaboratorName::McpGenerator,
                url: generator_url.into(),
            },
        }
    }

    /// Look up a collaborator by name.
    pub fn get(&self, name: CollaboratorName) -> &Collaborator {
        match name {
            CollaboratorName::DocExtractor => &self.doc_extractor,
            CollaboratorName::WorkflowGenerator => &self.workflow_generator,
            CollaboratorName::McpGenerator => &self.mcp_generator,
        }
    }

    /// Iterate over all collaborators in pipeline order.
    pub fn collaborators(&self) -> impl Iterator<Item = &Collaborator> {
        [
            &self.doc_extractor,
            &self.workflow_generator,
            &self.mcp_generator,
        ]
        .into_iter()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        // Port layout of the reference deployment.
        Self::new(
            "http://localhost:10001/",
            "http://localhost:10002/",
            "http://localhost:10003/",
        )
    }
}
