//! Configuration and error taxonomy for the adapter.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::connector::FetchError;
use crate::rpc::RpcError;

/// Configuration for one supervised build-tool instance.
///
/// The command is the launcher program that boots patternplate and speaks
/// the line protocol on its stdio; `cwd` is the workspace root containing
/// the `patterns/` folder.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    /// Launcher executable (e.g. `node`).
    pub command: String,
    /// Arguments to pass to the launcher.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory the build tool boots in.
    pub cwd: PathBuf,
}

impl AdapterConfig {
    pub fn new(command: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// The subprocess failed to report readiness.
///
/// Never retried by the core; the editor command layer owns restart UX.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("launcher stdio unavailable")]
    Stdio,
    /// The launcher sent an explicit `error` message.
    #[error("build tool reported: {0}")]
    Reported(String),
    #[error("build tool exited before reporting readiness")]
    Disconnected,
    #[error("message channel failed before readiness: {0}")]
    Channel(#[source] RpcError),
}

/// Failure of an adapter operation.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("build tool failed to start: {0}")]
    Start(#[from] StartError),
    #[error("adapter is already running, call `stop()` first")]
    AlreadyStarted,
    #[error("adapter has not been started")]
    NotStarted,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
