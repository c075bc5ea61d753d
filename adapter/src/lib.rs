//! Supervision of a locally running patternplate instance.
//!
//! The [`Adapter`] owns the launcher subprocess and the base address it
//! reports, and serves three kinds of queries on top of it: rendering
//! self-contained demo pages (with cold-start retry), listing known pattern
//! IDs, and answering "who depends on this pattern" from the build tool's
//! metadata tree.

pub mod meta;
pub mod rpc;

pub(crate) mod connector;
pub(crate) mod process;
pub(crate) mod retry;

mod supervisor;
mod types;

pub use connector::{FetchError, RenderConnector};
pub use meta::{DependencyGraph, MetaNode, MetaTree, PatternManifest};
pub use rpc::{Message, MessageReader, MessageWriter, RpcError};
pub use supervisor::Adapter;
pub use types::{AdapterConfig, AdapterError, StartError};
