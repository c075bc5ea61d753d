//! Manifest queries over the spanned AST.

use plate_types::PatternId;

use crate::ast::{JsonKind, JsonMember, JsonNode};
use crate::parser::{self, ManifestParseError};
use crate::span::Span;

/// Immutable parse of one manifest's JSON text.
///
/// Created fresh per analysis call from current document text, queried, and
/// discarded — there is no incremental reparse and no shared mutable state.
#[derive(Debug, Clone)]
pub struct ManifestAst {
    root: JsonNode,
}

/// A top-level string field with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    /// Span of the value token, quotes included.
    pub span: Span,
    pub value: String,
}

/// One declared dependency: a string-valued member of the `patterns` object.
///
/// Member keys are local aliases and are not exposed at this layer; callers
/// needing the alias combine key and value at the member level via
/// [`ManifestAst::root`].
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEntry {
    /// Span of the value token, quotes included.
    pub span: Span,
    pub value: PatternId,
}

impl ManifestAst {
    /// Parse manifest text.
    pub fn parse(text: &str) -> Result<Self, ManifestParseError> {
        Ok(Self {
            root: parser::parse(text)?,
        })
    }

    /// The underlying AST root, for callers needing raw member access.
    #[must_use]
    pub fn root(&self) -> &JsonNode {
        &self.root
    }

    /// The value of the top-level `name` field, when present and a string.
    #[must_use]
    pub fn pattern_name(&self) -> Option<FieldValue> {
        self.string_field("name")
    }

    /// The value of the top-level `displayName` field. Demo titles prefer
    /// this over `name` when both are declared.
    #[must_use]
    pub fn display_name(&self) -> Option<FieldValue> {
        self.string_field("displayName")
    }

    fn string_field(&self, key: &str) -> Option<FieldValue> {
        let member = self.root.member(key)?;
        member.value.as_str().map(|value| FieldValue {
            span: member.value.span,
            value: value.to_string(),
        })
    }

    /// One entry per string-valued member of the top-level `patterns`
    /// object, in document order.
    ///
    /// Empty when `patterns` is absent or not an object — a manifest with no
    /// dependencies is not an error.
    #[must_use]
    pub fn dependencies(&self) -> Vec<DependencyEntry> {
        self.dependency_members()
            .iter()
            .filter_map(|member| {
                member.value.as_str().map(|value| DependencyEntry {
                    span: member.value.span,
                    value: PatternId::new(value),
                })
            })
            .collect()
    }

    /// The declared dependency whose value span strictly contains `offset`.
    ///
    /// Boundary offsets (on the quotes) do not match; this is the trigger
    /// test for completion and hover.
    #[must_use]
    pub fn dependency_at(&self, offset: usize) -> Option<DependencyEntry> {
        self.dependencies()
            .into_iter()
            .find(|entry| entry.span.strictly_contains(offset))
    }

    fn dependency_members(&self) -> &[JsonMember] {
        match self.root.member("patterns") {
            Some(member) if matches!(member.value.kind, JsonKind::Object(_)) => {
                member.value.members()
            }
            _ => &[],
        }
    }
}
