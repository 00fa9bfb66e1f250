//! Packed identity keys
//!
//! Every relation is addressed by an 18-byte key: source (u64), target
//! (u64) and type key (u16), each little-endian, concatenated in that
//! order. The layout is shared with the storage engine and must not drift:
//! bulk lookups return packed keys, and weights are resolved by re-packing
//! the same bytes.

use crate::graph::types::{NodeId, TypeKey};

/// Byte length of a packed identity key
pub const KEY_LEN: usize = 18;

/// Packed `(source, target, type)` triple addressing one relation
///
/// Ordering is lexicographic over the packed bytes, which keeps every key
/// sharing a leading node id contiguous. Index scans rely on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationKey([u8; KEY_LEN]);

impl RelationKey {
    /// Pack a triple into its identity key
    pub fn pack(source: NodeId, target: NodeId, type_key: TypeKey) -> Self {
        let mut buf = [0u8; KEY_LEN];
        buf[0..8].copy_from_slice(&source.as_u64().to_le_bytes());
        buf[8..16].copy_from_slice(&target.as_u64().to_le_bytes());
        buf[16..18].copy_from_slice(&type_key.as_u16().to_le_bytes());
        RelationKey(buf)
    }

    /// Unpack into `(first node, second node, type key)`.
    ///
    /// Forward-index keys lead with the source; reverse-index keys lead
    /// with the target. Callers name the fields accordingly.
    pub fn unpack(&self) -> (NodeId, NodeId, TypeKey) {
        let mut a = [0u8; 8];
        a.copy_from_slice(&self.0[0..8]);
        let mut b = [0u8; 8];
        b.copy_from_slice(&self.0[8..16]);
        let mut t = [0u8; 2];
        t.copy_from_slice(&self.0[16..18]);

        (
            NodeId::new(u64::from_le_bytes(a)),
            NodeId::new(u64::from_le_bytes(b)),
            TypeKey::new(u16::from_le_bytes(t)),
        )
    }

    /// The leading packed node id
    pub fn lead(&self) -> NodeId {
        let mut a = [0u8; 8];
        a.copy_from_slice(&self.0[0..8]);
        NodeId::new(u64::from_le_bytes(a))
    }

    /// Smallest key leading with `node`; lower bound for range scans
    pub fn floor(node: NodeId) -> Self {
        Self::pack(node, NodeId::new(0), TypeKey::new(0))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        RelationKey(bytes)
    }
}
