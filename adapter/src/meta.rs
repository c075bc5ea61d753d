//! The build tool's metadata tree and the dependency index derived from it.
//!
//! `GET {base}/api/meta` returns a recursive name→node map: `folder` nodes
//! carry children, `pattern` nodes carry an ID and the dependency map their
//! manifest declares. Everything here is an immutable snapshot — built on
//! demand per query, never cached across calls.

use std::fmt;
use std::marker::PhantomData;

use plate_types::PatternId;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Deserialize a JSON object into a `Vec` of entries, preserving document
/// order. `null` is tolerated and maps to no entries (the build tool emits
/// it for patterns without declared dependencies).
fn ordered_map<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct OrderedMap<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedMap<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a JSON object or null")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::new();
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(OrderedMap(PhantomData))
}

/// One node of the metadata tree.
///
/// A pattern node is always a leaf; unknown members on either variant are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetaNode {
    Folder {
        #[serde(default, deserialize_with = "ordered_map")]
        children: Vec<(String, MetaNode)>,
    },
    Pattern {
        id: PatternId,
        #[serde(default)]
        manifest: PatternManifest,
    },
}

/// The manifest data the build tool attaches to a pattern node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternManifest {
    /// Declared dependencies: local alias → pattern ID, in document order.
    #[serde(default, deserialize_with = "ordered_map")]
    pub patterns: Vec<(String, PatternId)>,
}

/// The metadata tree root: an ordered name→node map.
#[derive(Debug, Clone, Default)]
pub struct MetaTree {
    roots: Vec<(String, MetaNode)>,
}

impl<'de> Deserialize<'de> for MetaTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self {
            roots: ordered_map(deserializer)?,
        })
    }
}

impl MetaTree {
    #[must_use]
    pub fn roots(&self) -> &[(String, MetaNode)] {
        &self.roots
    }

    /// The children of every folder node, in depth-first pre-order.
    ///
    /// Patterns sitting outside any folder are not reachable through this
    /// walk, matching how the build tool lays the tree out (patterns always
    /// live in a group folder).
    fn folders(&self) -> Vec<&[(String, MetaNode)]> {
        fn collect<'a>(
            entries: &'a [(String, MetaNode)],
            out: &mut Vec<&'a [(String, MetaNode)]>,
        ) {
            for (_, node) in entries {
                if let MetaNode::Folder { children } = node {
                    out.push(children.as_slice());
                    collect(children, out);
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.roots, &mut out);
        out
    }

    /// All known pattern IDs, in folder-then-child traversal order.
    #[must_use]
    pub fn pattern_ids(&self) -> Vec<PatternId> {
        let mut ids = Vec::new();
        for folder in self.folders() {
            for (_, node) in folder {
                if let MetaNode::Pattern { id, .. } = node {
                    ids.push(id.clone());
                }
            }
        }
        ids
    }

    /// Snapshot of every pattern's declared dependencies.
    #[must_use]
    pub fn dependency_graph(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        for folder in self.folders() {
            for (_, node) in folder {
                if let MetaNode::Pattern { id, manifest } = node {
                    graph.insert(id.clone(), manifest.patterns.clone());
                }
            }
        }
        graph
    }
}

/// Read-only snapshot: pattern ID → (local alias → pattern ID), in tree
/// traversal order.
///
/// Dangling references — a dependency value naming an ID absent from the
/// snapshot — are preserved as-is; they simply resolve to nothing in
/// reverse lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    entries: Vec<(PatternId, Vec<(String, PatternId)>)>,
}

impl DependencyGraph {
    /// Duplicate IDs indicate a malformed tree: the first occurrence wins
    /// and later ones are dropped with a warning, never silently
    /// overwritten.
    fn insert(&mut self, id: PatternId, dependencies: Vec<(String, PatternId)>) {
        if self.entries.iter().any(|(existing, _)| *existing == id) {
            tracing::warn!(
                pattern = %id,
                "duplicate pattern ID in metadata tree, keeping first occurrence"
            );
            return;
        }
        self.entries.push((id, dependencies));
    }

    /// The declared dependencies of `id`, when the snapshot knows it.
    #[must_use]
    pub fn get(&self, id: &PatternId) -> Option<&[(String, PatternId)]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, dependencies)| dependencies.as_slice())
    }

    /// Every pattern whose dependency *values* (not aliases) contain
    /// `target`, in recorded order.
    #[must_use]
    pub fn dependents_of(&self, target: &PatternId) -> Vec<PatternId> {
        self.entries
            .iter()
            .filter(|(_, dependencies)| dependencies.iter().any(|(_, dep)| dep == target))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PatternId, &[(String, PatternId)])> {
        self.entries
            .iter()
            .map(|(id, dependencies)| (id, dependencies.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
