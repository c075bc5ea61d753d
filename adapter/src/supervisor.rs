//! Adapter facade — public API for supervising one patternplate instance.
//!
//! Owns the child process handle and the discovered base address. State is
//! kept as location: a populated handle plus a populated base means running;
//! `stop()` clears both. One adapter supervises exactly one instance —
//! overlapping `start()` calls are rejected, not serialized.

use plate_types::PatternId;
use url::Url;

use crate::connector::RenderConnector;
use crate::meta::{DependencyGraph, MetaTree};
use crate::process::ToolProcess;
use crate::retry::{self, RetryPolicy};
use crate::types::{AdapterConfig, AdapterError, StartError};

pub struct Adapter {
    config: AdapterConfig,
    connector: RenderConnector,
    process: Option<ToolProcess>,
    /// Set exactly once per lifecycle, from the `started` message.
    base: Option<Url>,
    render_retry: RetryPolicy,
}

impl Adapter {
    #[must_use]
    pub fn new(config: AdapterConfig) -> Self {
        Self {
            config,
            connector: RenderConnector::new(),
            process: None,
            base: None,
            render_retry: RetryPolicy::new(),
        }
    }

    /// Spawn the launcher and wait until the build tool reports readiness.
    ///
    /// There is deliberately no timeout here — patternplate may cold-start
    /// slowly. Callers needing an upper bound race this future externally.
    pub async fn start(&mut self) -> Result<(), AdapterError> {
        if self.process.is_some() || self.base.is_some() {
            return Err(AdapterError::AlreadyStarted);
        }

        tracing::info!(
            command = %self.config.command,
            cwd = %self.config.cwd.display(),
            "starting build tool"
        );
        let (process, ready_rx) = ToolProcess::start(&self.config).await?;
        self.process = Some(process);

        let outcome = match ready_rx.await {
            Ok(outcome) => outcome,
            // Reader task gone without resolving readiness.
            Err(_) => Err(StartError::Disconnected),
        };
        let port = match outcome {
            Ok(port) => port,
            Err(error) => {
                self.teardown().await;
                return Err(error.into());
            }
        };

        match Url::parse(&format!("http://localhost:{port}")) {
            Ok(base) => {
                tracing::info!(%base, "build tool ready");
                self.base = Some(base);
                Ok(())
            }
            Err(error) => {
                self.teardown().await;
                Err(StartError::Reported(format!("unusable port {port}: {error}")).into())
            }
        }
    }

    /// Terminate the subprocess and reset to not-started. Idempotent.
    pub async fn stop(&mut self) {
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        if let Some(process) = self.process.take() {
            tracing::info!("stopping build tool");
            process.shutdown().await;
        }
        self.base = None;
    }

    /// Whether a base address has been discovered.
    ///
    /// Stays true after a post-readiness crash until `stop()` is called —
    /// the crash is logged by the reader task, not acted on here.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.base.is_some()
    }

    /// The build tool's base address; `None` before `start()` resolves.
    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// The demo page URL for a pattern, once started.
    #[must_use]
    pub fn demo_url(&self, pattern_id: &PatternId) -> Option<Url> {
        let base = self.base.as_ref()?;
        base.join(&format!("demo/{pattern_id}")).ok()
    }

    /// Render a self-contained demo page for `pattern_id`.
    ///
    /// Transient failures are retried (1 s spacing, at most 10 attempts)
    /// until the first render of this adapter's lifetime succeeds; after
    /// that, failures propagate immediately.
    pub async fn render_demo(&mut self, pattern_id: &PatternId) -> Result<String, AdapterError> {
        let Some(base) = self.base_str() else {
            return Err(AdapterError::NotStarted);
        };

        let connector = &self.connector;
        let render_retry = &mut self.render_retry;
        let html = retry::run_with_retry(render_retry, || {
            let base = base.clone();
            let id = pattern_id.clone();
            async move { connector.render(&base, &id).await }
        })
        .await?;
        Ok(html)
    }

    /// All pattern IDs known to the build tool.
    ///
    /// Best-effort: any failure (including not being started) degrades to
    /// an empty list — this feeds completion, where silence beats noise.
    pub async fn get_pattern_ids(&self) -> Vec<PatternId> {
        match self.fetch_meta().await {
            Ok(tree) => tree.pattern_ids(),
            Err(error) => {
                tracing::debug!(%error, "pattern ID listing unavailable");
                Vec::new()
            }
        }
    }

    /// Snapshot of every pattern's declared dependencies. Best-effort.
    pub async fn get_pattern_dependencies(&self) -> DependencyGraph {
        match self.fetch_meta().await {
            Ok(tree) => tree.dependency_graph(),
            Err(error) => {
                tracing::debug!(%error, "dependency snapshot unavailable");
                DependencyGraph::default()
            }
        }
    }

    /// Every pattern depending on `pattern_id`, in traversal order.
    /// Best-effort.
    pub async fn get_pattern_dependents(&self, pattern_id: &PatternId) -> Vec<PatternId> {
        self.get_pattern_dependencies()
            .await
            .dependents_of(pattern_id)
    }

    async fn fetch_meta(&self) -> Result<MetaTree, AdapterError> {
        let Some(base) = self.base_str() else {
            return Err(AdapterError::NotStarted);
        };
        Ok(self.connector.fetch_meta(&base).await?)
    }

    /// Base address without the trailing slash `Url` renders, ready for
    /// path concatenation.
    fn base_str(&self) -> Option<String> {
        self.base
            .as_ref()
            .map(|base| base.as_str().trim_end_matches('/').to_string())
    }
}
