//! HTTP connector for the build tool's demo and metadata endpoints.
//!
//! Demo pages come back as served, then get two fixups so they are
//! self-contained when embedded in an editor preview: the referenced
//! stylesheet is inlined (the preview pane does not reload external CSS on
//! change), and the head gains a `<base>` plus a default white background so
//! relative assets resolve and the page stays legible on dark themes.

use std::sync::LazyLock;

use plate_types::PatternId;
use regex::{NoExpand, Regex};
use thiserror::Error;

use crate::meta::MetaTree;

static STYLESHEET_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<link rel="stylesheet" href="([^"]+)">"#).expect("stylesheet link regex")
});

/// Failure talking to the build tool over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure: connection refused, DNS, interrupted body.
    /// A non-2xx status is NOT an error at this layer — the build tool's
    /// own error pages are still pages.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("metadata response is not a valid tree: {0}")]
    Meta(#[from] serde_json::Error),
}

/// Fetches and post-processes build-tool responses.
///
/// Stateless apart from the connection pool; the base address is passed per
/// call because it belongs to the supervisor's lifecycle, not to this layer.
#[derive(Debug, Clone, Default)]
pub struct RenderConnector {
    client: reqwest::Client,
}

impl RenderConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// GET `url` with the given `Accept` header and return the body text.
    pub async fn request_file(&self, url: &str, mime_type: &str) -> Result<String, FetchError> {
        tracing::debug!(url, mime_type, "loading build-tool file");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, mime_type)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })
    }

    /// Fetch and parse the metadata tree from `{base}/api/meta`.
    pub async fn fetch_meta(&self, base: &str) -> Result<MetaTree, FetchError> {
        let body = self
            .request_file(&format!("{base}/api/meta"), "application/json")
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Render a fully self-contained demo page for `pattern_id`.
    pub async fn render(&self, base: &str, pattern_id: &PatternId) -> Result<String, FetchError> {
        let body = self
            .request_file(&format!("{base}/demo/{pattern_id}"), "text/html")
            .await?;
        let body = self.inline_stylesheet(base, pattern_id, body).await?;
        Ok(patch_head(base, &body))
    }

    /// Replace the page's stylesheet link with an inline `<style>` block.
    /// A page without a stylesheet link is left alone.
    async fn inline_stylesheet(
        &self,
        base: &str,
        pattern_id: &PatternId,
        body: String,
    ) -> Result<String, FetchError> {
        let Some(href) = STYLESHEET_LINK
            .captures(&body)
            .map(|captures| captures[1].to_string())
        else {
            return Ok(body);
        };

        // Hrefs are relative to the demo path: `./x.css` lives under
        // `/demo/{id}/`, anything else is already server-absolute.
        let css_path = match href.strip_prefix("./") {
            Some(rest) => format!("/demo/{pattern_id}/{rest}"),
            None => href,
        };
        let css = self
            .request_file(&format!("{base}{css_path}"), "text/css")
            .await?;

        let style = format!("<style type=\"text/css\">\n{css}\n</style>");
        Ok(STYLESHEET_LINK
            .replace(&body, NoExpand(&style))
            .into_owned())
    }
}

/// Inject a `<base>` element and a default white background into `<head>`.
fn patch_head(base: &str, html: &str) -> String {
    let injected = format!(
        "<head>\n<base href=\"{base}/\">\n<style type=\"text/css\">\nbody {{ background-color: #fff; }}\n</style>"
    );
    html.replacen("<head>", &injected, 1)
}
