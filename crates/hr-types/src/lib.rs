#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hypergraphlet types the counter knows about (types up to four
/// nodes). Valid type ids are `1..DEFAULT_TYPE_COUNT`.
pub const DEFAULT_TYPE_COUNT: u32 = 472;

/// Node count of a descriptor carrying at least one marker hyperedge.
pub const EXTENDED_NODE_COUNT: usize = 5;

/// Highest numeric id a symbolic node can map to.
pub const MAX_NODE_ID: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u8);

impl NodeId {
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reserved synthetic hyperedges that flag a 4-node type as extended to a
/// 5-node pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Triggered by the `R,A,B,C` hyperedge.
    Full,
    /// Triggered by the `A,B,C` hyperedge.
    Partial,
}

impl MarkerKind {
    pub const ALL: [Self; 2] = [Self::Full, Self::Partial];

    /// Symbolic hyperedge whose presence appends this marker.
    #[must_use]
    pub const fn trigger(self) -> &'static str {
        match self {
            Self::Full => "R,A,B,C",
            Self::Partial => "A,B,C",
        }
    }

    /// Literal fields written for the marker line. Never permuted.
    #[must_use]
    pub const fn fields(self) -> &'static [u8] {
        match self {
            Self::Full => &[0, 1, 2, 3, 4],
            Self::Partial => &[1, 2, 3, 4],
        }
    }

    #[must_use]
    pub fn from_trigger(symbolic: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.trigger() == symbolic)
    }

    #[must_use]
    pub fn from_fields(fields: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.fields() == fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Hyperedge {
    Nodes(Vec<NodeId>),
    Marker(MarkerKind),
}

impl Hyperedge {
    /// Rebuilds a hyperedge from the numeric fields of one hypergraph line.
    pub fn from_fields(fields: &[u8]) -> Result<Self, DescriptorError> {
        if let Some(kind) = MarkerKind::from_fields(fields) {
            return Ok(Self::Marker(kind));
        }
        if fields.is_empty() || fields.iter().any(|&raw| raw > MAX_NODE_ID) {
            return Err(DescriptorError::InvalidFields {
                fields: fields.to_vec(),
            });
        }
        Ok(Self::Nodes(fields.iter().copied().map(NodeId::new).collect()))
    }

    #[must_use]
    pub fn fields(&self) -> Vec<u8> {
        match self {
            Self::Nodes(nodes) => nodes.iter().map(|node| node.get()).collect(),
            Self::Marker(kind) => kind.fields().to_vec(),
        }
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            Self::Nodes(nodes) => nodes.len(),
            Self::Marker(kind) => kind.fields().len(),
        }
    }

    #[must_use]
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::Marker(_))
    }

    /// Node tuples are sets; sorting them yields the order-free form.
    #[must_use]
    pub fn canonical(&self) -> Self {
        match self {
            Self::Nodes(nodes) => {
                let mut sorted = nodes.clone();
                sorted.sort_unstable();
                Self::Nodes(sorted)
            }
            Self::Marker(kind) => Self::Marker(*kind),
        }
    }
}

#[must_use]
pub fn default_node_count(type_id: u32) -> usize {
    match type_id {
        1 => 2,
        2..=10 => 3,
        _ => 4,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct HypergraphletDescriptor {
    type_id: u32,
    hyperedges: Vec<Hyperedge>,
    node_count: usize,
}

/// Deserialized form; `node_count` is re-derived, never trusted.
#[derive(Deserialize)]
struct RawDescriptor {
    type_id: u32,
    hyperedges: Vec<Hyperedge>,
}

impl TryFrom<RawDescriptor> for HypergraphletDescriptor {
    type Error = DescriptorError;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        Self::new(raw.type_id, raw.hyperedges)
    }
}

impl HypergraphletDescriptor {
    /// `hyperedges` must already contain any appended marker edges; the node
    /// count is derived from the type id and upgraded when a marker is present.
    pub fn new(type_id: u32, hyperedges: Vec<Hyperedge>) -> Result<Self, DescriptorError> {
        if type_id == 0 {
            return Err(DescriptorError::InvalidTypeId(type_id));
        }
        if hyperedges.is_empty() {
            return Err(DescriptorError::NoHyperedges { type_id });
        }
        if hyperedges
            .iter()
            .any(|edge| matches!(edge, Hyperedge::Nodes(nodes) if nodes.is_empty()))
        {
            return Err(DescriptorError::EmptyHyperedge { type_id });
        }

        let node_count = if hyperedges.iter().any(Hyperedge::is_marker) {
            EXTENDED_NODE_COUNT
        } else {
            default_node_count(type_id)
        };

        Ok(Self {
            type_id,
            hyperedges,
            node_count,
        })
    }

    #[must_use]
    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    #[must_use]
    pub fn hyperedges(&self) -> &[Hyperedge] {
        &self.hyperedges
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[must_use]
    pub fn hyperedge_count(&self) -> usize {
        self.hyperedges.len()
    }

    #[must_use]
    pub fn has_marker(&self, kind: MarkerKind) -> bool {
        self.hyperedges
            .iter()
            .any(|edge| *edge == Hyperedge::Marker(kind))
    }

    #[must_use]
    pub fn multiset(&self) -> HyperedgeMultiset {
        HyperedgeMultiset::from_edges(&self.hyperedges)
    }
}

/// Order-free view of a hyperedge list: node tuples sorted, then the tuples
/// themselves sorted. Multiplicity is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HyperedgeMultiset(Vec<Hyperedge>);

impl HyperedgeMultiset {
    #[must_use]
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a Hyperedge>) -> Self {
        let mut canonical = edges
            .into_iter()
            .map(Hyperedge::canonical)
            .collect::<Vec<_>>();
        canonical.sort();
        Self(canonical)
    }

    #[must_use]
    pub fn edges(&self) -> &[Hyperedge] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMembershipSets {
    pub extended_full: BTreeSet<u32>,
    pub extended_partial: BTreeSet<u32>,
    pub extended_both: BTreeSet<u32>,
}

impl TypeMembershipSets {
    pub fn record(&mut self, descriptor: &HypergraphletDescriptor) {
        let type_id = descriptor.type_id();
        let full = descriptor.has_marker(MarkerKind::Full);
        let partial = descriptor.has_marker(MarkerKind::Partial);
        if full {
            self.extended_full.insert(type_id);
        }
        if partial {
            self.extended_partial.insert(type_id);
        }
        if full && partial {
            self.extended_both.insert(type_id);
        }
    }

    /// `(full, partial, both)` set sizes.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.extended_full.len(),
            self.extended_partial.len(),
            self.extended_both.len(),
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("type id must be positive, got {0}")]
    InvalidTypeId(u32),
    #[error("type {type_id} has no hyperedges")]
    NoHyperedges { type_id: u32 },
    #[error("type {type_id} has an empty hyperedge")]
    EmptyHyperedge { type_id: u32 },
    #[error("fields {fields:?} are neither a node tuple nor a marker")]
    InvalidFields { fields: Vec<u8> },
}

#[cfg(test)]
mod tests {
    use super::{
        DescriptorError, EXTENDED_NODE_COUNT, Hyperedge, HypergraphletDescriptor,
        HyperedgeMultiset, MarkerKind, NodeId, TypeMembershipSets, default_node_count,
    };

    fn nodes(raw: &[u8]) -> Hyperedge {
        Hyperedge::Nodes(raw.iter().copied().map(NodeId::new).collect())
    }

    #[test]
    fn node_count_follows_type_bands() {
        assert_eq!(default_node_count(1), 2);
        assert_eq!(default_node_count(2), 3);
        assert_eq!(default_node_count(10), 3);
        assert_eq!(default_node_count(11), 4);
        assert_eq!(default_node_count(471), 4);
    }

    #[test]
    fn marker_upgrades_node_count_and_counts_as_hyperedge() {
        let descriptor = HypergraphletDescriptor::new(
            40,
            vec![nodes(&[1, 2, 3]), Hyperedge::Marker(MarkerKind::Partial)],
        )
        .expect("descriptor");
        assert_eq!(descriptor.node_count(), EXTENDED_NODE_COUNT);
        assert_eq!(descriptor.hyperedge_count(), 2);
        assert!(descriptor.has_marker(MarkerKind::Partial));
        assert!(!descriptor.has_marker(MarkerKind::Full));
    }

    #[test]
    fn zero_type_and_empty_lists_are_rejected() {
        assert_eq!(
            HypergraphletDescriptor::new(0, vec![nodes(&[0, 1])]),
            Err(DescriptorError::InvalidTypeId(0))
        );
        assert_eq!(
            HypergraphletDescriptor::new(3, Vec::new()),
            Err(DescriptorError::NoHyperedges { type_id: 3 })
        );
        assert_eq!(
            HypergraphletDescriptor::new(3, vec![Hyperedge::Nodes(Vec::new())]),
            Err(DescriptorError::EmptyHyperedge { type_id: 3 })
        );
    }

    #[test]
    fn marker_fields_are_recognised_only_in_literal_order() {
        assert_eq!(
            Hyperedge::from_fields(&[0, 1, 2, 3, 4]),
            Ok(Hyperedge::Marker(MarkerKind::Full))
        );
        assert_eq!(
            Hyperedge::from_fields(&[1, 2, 3, 4]),
            Ok(Hyperedge::Marker(MarkerKind::Partial))
        );
        assert!(matches!(
            Hyperedge::from_fields(&[4, 3, 2, 1]),
            Err(DescriptorError::InvalidFields { .. })
        ));
        assert_eq!(Hyperedge::from_fields(&[2, 0]), Ok(nodes(&[2, 0])));
    }

    #[test]
    fn multiset_ignores_order_but_keeps_multiplicity() {
        let left = HyperedgeMultiset::from_edges(&[nodes(&[0, 1]), nodes(&[2, 1]), nodes(&[0, 1])]);
        let right =
            HyperedgeMultiset::from_edges(&[nodes(&[1, 2]), nodes(&[1, 0]), nodes(&[1, 0])]);
        assert_eq!(left, right);

        let fewer = HyperedgeMultiset::from_edges(&[nodes(&[0, 1]), nodes(&[1, 2])]);
        assert_ne!(left, fewer);
    }

    #[test]
    fn membership_tracks_intersection() {
        let both = HypergraphletDescriptor::new(
            300,
            vec![
                nodes(&[0, 1, 2, 3]),
                Hyperedge::Marker(MarkerKind::Full),
                nodes(&[1, 2, 3]),
                Hyperedge::Marker(MarkerKind::Partial),
            ],
        )
        .expect("descriptor");
        let partial_only = HypergraphletDescriptor::new(
            120,
            vec![nodes(&[1, 2, 3]), Hyperedge::Marker(MarkerKind::Partial)],
        )
        .expect("descriptor");

        let mut sets = TypeMembershipSets::default();
        sets.record(&both);
        sets.record(&partial_only);

        assert_eq!(sets.counts(), (1, 2, 1));
        assert!(sets.extended_both.contains(&300));
        assert!(!sets.extended_both.contains(&120));
    }

    #[test]
    fn descriptor_serialization_is_stable() {
        let descriptor = HypergraphletDescriptor::new(
            12,
            vec![nodes(&[0, 1, 2, 3]), Hyperedge::Marker(MarkerKind::Full)],
        )
        .expect("descriptor");
        let json = serde_json::to_string(&descriptor).expect("serialize");
        assert!(json.contains(r#"{"kind":"marker","value":"full"}"#), "{json}");
        let back: HypergraphletDescriptor = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, descriptor);
    }

    #[test]
    fn deserialization_rederives_node_count() {
        let json = r#"{"type_id":3,"hyperedges":[{"kind":"nodes","value":[0,1]},{"kind":"marker","value":"partial"}],"node_count":2}"#;
        let descriptor: HypergraphletDescriptor = serde_json::from_str(json).expect("deserialize");
        assert_eq!(descriptor.node_count(), EXTENDED_NODE_COUNT);
        assert_eq!(descriptor.hyperedge_count(), 2);

        let empty = r#"{"type_id":3,"hyperedges":[],"node_count":3}"#;
        let err = serde_json::from_str::<HypergraphletDescriptor>(empty).expect_err("no hyperedges");
        assert!(err.to_string().contains("has no hyperedges"), "{err}");

        let zero = r#"{"type_id":0,"hyperedges":[{"kind":"nodes","value":[0,1]}]}"#;
        assert!(serde_json::from_str::<HypergraphletDescriptor>(zero).is_err());
    }
}
