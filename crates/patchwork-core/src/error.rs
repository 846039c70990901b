//! Error types for graph mutations and address parsing.
//!
//! Only structural mistakes are errors. Topology tolerances (connecting an
//! out-of-range port, duplicate edges, unresolved identifiers) are no-ops and
//! never surface here.

use thiserror::Error;

use crate::graph::NodeId;

/// Errors that can occur during graph operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The specified module was not found in the graph.
    #[error("module {0} not found")]
    ModuleNotFound(NodeId),

    /// The identifier is empty, contains `/` or `:`, or names a bridge.
    #[error("invalid module identifier '{0}'")]
    InvalidIdentifier(String),
}

/// Errors produced when parsing an [`Address`](crate::Address).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The path has no components.
    #[error("address is empty")]
    Empty,

    /// The path contains an empty component, as in `a//b`.
    #[error("address '{0}' contains an empty component")]
    EmptyComponent(String),
}
