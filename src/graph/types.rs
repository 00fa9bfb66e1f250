//! Core type definitions for the relation store

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// Interned key of a relation type
///
/// Keys are 16 bits wide, bounding a process to 65 535 distinct labels.
/// Key 0 is reserved and never assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct TypeKey(pub u16);

impl TypeKey {
    pub fn new(key: u16) -> Self {
        TypeKey(key)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl From<u16> for TypeKey {
    fn from(key: u16) -> Self {
        TypeKey(key)
    }
}

/// Relation type label (e.g., "access", "follows")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RelationType(String);

impl RelationType {
    pub fn new(label: impl Into<String>) -> Self {
        RelationType(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RelationType {
    fn from(s: String) -> Self {
        RelationType(s)
    }
}

impl From<&str> for RelationType {
    fn from(s: &str) -> Self {
        RelationType(s.to_string())
    }
}

/// A directed, weighted, typed relation between two nodes, with the type
/// resolved back to its label
///
/// Relations are addressed by the `(source, target, type)` triple; at most
/// one weight exists per triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Source node (the relation goes FROM this node)
    pub source: NodeId,

    /// Target node (the relation goes TO this node)
    pub target: NodeId,

    /// Resolved relation type label
    pub rel_type: RelationType,

    /// Relation weight
    pub weight: f64,
}

impl Relation {
    pub fn new(
        source: NodeId,
        target: NodeId,
        rel_type: impl Into<RelationType>,
        weight: f64,
    ) -> Self {
        Relation {
            source,
            target,
            rel_type: rel_type.into(),
            weight,
        }
    }
}
