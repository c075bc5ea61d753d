//! Manifest-aware language assistance.
//!
//! Composes the position-indexed analyzer with the adapter's live queries
//! into editor-agnostic results: completion candidates, hover information,
//! document links and reference lookups, all expressed as spans and
//! strings. The editor layer maps spans to its own range type and renders.
//!
//! Parse failures surface as [`ManifestParseError`]; adapter-side failures
//! degrade to empty results, matching the adapter's best-effort queries —
//! a build tool that is still booting must not turn typing into error
//! popups.

use plate_adapter::Adapter;
use plate_manifest::{ManifestAst, ManifestParseError, Span};
use plate_types::PatternId;
use url::Url;

/// A completion candidate for a dependency value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The pattern ID offered.
    pub label: PatternId,
    /// The span to replace: exactly the text between the value's quotes.
    pub replace: Span,
}

/// Hover information for a dependency under the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    /// Span of the hovered value token, quotes included.
    pub span: Span,
    pub pattern_id: PatternId,
    /// Whether the build tool currently knows this ID.
    pub known: bool,
    /// The dependency's demo page, when the adapter is started.
    pub demo_url: Option<Url>,
}

/// A clickable link on a dependency value.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLink {
    pub span: Span,
    pub target: Url,
}

/// Completion candidates at `offset` in manifest `text`.
///
/// Candidates are offered only when the offset sits strictly inside a
/// declared dependency value — never on its quotes, never elsewhere in the
/// document. One candidate per known pattern ID.
pub async fn completion(
    adapter: &Adapter,
    text: &str,
    offset: usize,
) -> Result<Vec<Completion>, ManifestParseError> {
    let ast = ManifestAst::parse(text)?;
    let Some(entry) = ast.dependency_at(offset) else {
        return Ok(Vec::new());
    };
    let replace = entry.span.interior();
    Ok(adapter
        .get_pattern_ids()
        .await
        .into_iter()
        .map(|label| Completion { label, replace })
        .collect())
}

/// Hover information at `offset`, when a dependency value sits there.
pub async fn hover(
    adapter: &Adapter,
    text: &str,
    offset: usize,
) -> Result<Option<Hover>, ManifestParseError> {
    let ast = ManifestAst::parse(text)?;
    let Some(entry) = ast.dependency_at(offset) else {
        return Ok(None);
    };
    let known = adapter.get_pattern_ids().await.contains(&entry.value);
    let demo_url = adapter.demo_url(&entry.value);
    Ok(Some(Hover {
        span: entry.span,
        pattern_id: entry.value,
        known,
        demo_url,
    }))
}

/// One link per declared dependency, targeting its demo page.
///
/// Empty when the adapter is not started — there is no address to link to.
pub async fn document_links(
    adapter: &Adapter,
    text: &str,
) -> Result<Vec<DocumentLink>, ManifestParseError> {
    let ast = ManifestAst::parse(text)?;
    Ok(ast
        .dependencies()
        .into_iter()
        .filter_map(|entry| {
            adapter.demo_url(&entry.value).map(|target| DocumentLink {
                span: entry.span,
                target,
            })
        })
        .collect())
}

/// Every pattern whose manifest depends on `pattern_id`. Best-effort.
pub async fn references(adapter: &Adapter, pattern_id: &PatternId) -> Vec<PatternId> {
    adapter.get_pattern_dependents(pattern_id).await
}
