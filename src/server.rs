//! Stdio serving loop for the pipeline agent.

use std::io::{BufRead, BufReader, Write};

use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::orchestrator::RootOrchestrator;
use crate::protocol::{TaskRequest, TaskResponse};

/// Serving loop: one JSON task request per line on stdin, one JSON response
/// per line on stdout. Logs go to stderr so the protocol stream stays clean.
pub struct AgentServer {
    orchestrator: RootOrchestrator,
}

impl AgentServer {
    /// Create a server around an orchestrator.
    pub fn new(orchestrator: RootOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Run the server on stdio until stdin closes.
    pub async fn run_stdio(&self) -> Result<()> {
        info!("pipeline agent serving on stdio");

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());

        for line in reader.lines() {
            let line = line.map_err(Error::Io)?;
            if line.trim().is_empty() {
                continue;
            }

            debug!("received: {}", line);

            let response = self.handle_line(&line).await;
            let response_json = serde_json::to_string(&response)?;

            debug!("sending: {}", response_json);

            writeln!(stdout, "{}", response_json).map_err(Error::Io)?;
            stdout.flush().map_err(Error::Io)?;
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one request frame. Malformed frames answer with a failed
    /// response instead of killing the loop.
    async fn handle_line(&self, line: &str) -> TaskResponse {
        match serde_json::from_str::<TaskRequest>(line) {
            Ok(request) => self.orchestrator.handle_task(request).await,
            Err(e) => {
                error!("failed to parse task request: {}", e);
                TaskResponse::protocol_error(format!("invalid task request: {}", e))
            }
        }
    }
}
