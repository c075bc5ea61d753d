//! Position-indexed JSON analysis for pattern manifests.
//!
//! Parses manifest text into a minimal AST in which every value carries an
//! exact source [`Span`], then answers the queries language assistance is
//! built on: the pattern's `name`, each entry of its `patterns` dependency
//! map, and "which declared dependency, if any, contains this offset".
//!
//! Everything here is synchronous and allocation-light; an AST is parsed
//! fresh from document text per query batch and discarded afterwards.

mod analyzer;
mod ast;
mod parser;
mod span;

pub use analyzer::{DependencyEntry, FieldValue, ManifestAst};
pub use ast::{JsonKind, JsonMember, JsonNode};
pub use parser::ManifestParseError;
pub use span::{Location, Span};
