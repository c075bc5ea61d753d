//! Core domain types for plate.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Everything here can be used from any layer of the workspace.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// Identifier of a single pattern within one patternplate instance.
///
/// Slash-structured (`atoms/button`): the first segment is the pattern's
/// group, the rest its name. Uniqueness is global within one build-tool
/// instance; the ID carries no implied ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(String);

impl PatternId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the pattern ID from a file path inside the pattern's folder.
    ///
    /// Patternplate keeps each pattern under `…/patterns/<group>/<name>/`;
    /// any file below that folder (the manifest, demo markup, styles) maps
    /// back to `<group>/<name>`. Returns `None` for paths outside that
    /// shape, including the `patterns` folder itself and bare
    /// `patterns/<group>/<name>` with no file below it.
    #[must_use]
    pub fn from_manifest_path(path: &Path) -> Option<Self> {
        let names: Vec<&str> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();

        let at = names.iter().position(|part| *part == "patterns")?;
        // group, name, plus at least one path element below the pattern dir
        if names.len() < at + 4 {
            return None;
        }
        Some(Self(format!("{}/{}", names[at + 1], names[at + 2])))
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatternId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PatternId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for PatternId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_manifest_path_manifest_file() {
        let path = PathBuf::from("/work/patterns/atoms/button/pattern.json");
        assert_eq!(
            PatternId::from_manifest_path(&path),
            Some(PatternId::new("atoms/button"))
        );
    }

    #[test]
    fn test_from_manifest_path_nested_file() {
        let path = PathBuf::from("/work/patterns/molecules/card/demo/index.html");
        assert_eq!(
            PatternId::from_manifest_path(&path),
            Some(PatternId::new("molecules/card"))
        );
    }

    #[test]
    fn test_from_manifest_path_relative() {
        let path = PathBuf::from("patterns/atoms/button/index.js");
        assert_eq!(
            PatternId::from_manifest_path(&path),
            Some(PatternId::new("atoms/button"))
        );
    }

    #[test]
    fn test_from_manifest_path_pattern_dir_itself_rejected() {
        // No file below the pattern folder
        let path = PathBuf::from("/work/patterns/atoms/button");
        assert_eq!(PatternId::from_manifest_path(&path), None);
    }

    #[test]
    fn test_from_manifest_path_unrelated_rejected() {
        let path = PathBuf::from("/work/src/main.rs");
        assert_eq!(PatternId::from_manifest_path(&path), None);
    }

    #[test]
    fn test_from_manifest_path_patterns_folder_too_shallow() {
        let path = PathBuf::from("/work/patterns/atoms");
        assert_eq!(PatternId::from_manifest_path(&path), None);
    }

    #[test]
    fn test_serde_transparent() {
        let id: PatternId = serde_json::from_str(r#""atoms/button""#).unwrap();
        assert_eq!(id, PatternId::new("atoms/button"));
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""atoms/button""#);
    }

    #[test]
    fn test_display() {
        assert_eq!(PatternId::new("atoms/button").to_string(), "atoms/button");
    }
}
