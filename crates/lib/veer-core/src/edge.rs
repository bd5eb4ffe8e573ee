use std::fmt::{Display, Formatter};

use rand::Rng;
use serde::Deserialize;
use smallvec::SmallVec;

/// Width of the fixed view returned by [`NextEdges::slots`]. Most junctions in the
/// networks we drive offer at most three ways out of a road segment.
pub const NEXT_EDGE_SLOTS: usize = 3;

/// Identifier of a road segment (a SUMO `edge`).
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Internal edges are the junction-internal links SUMO generates, e.g. `:J3_0`.
    pub fn is_internal(&self) -> bool {
        self.0.contains(':')
    }
}

impl Display for EdgeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for EdgeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EdgeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Identifier of a lane, `<edge>_<index>` in SUMO networks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LaneId(String);

impl LaneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The rightmost lane of an edge.
    pub fn primary(edge: &EdgeId) -> Self {
        Self(format!("{}_0", edge.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LaneId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Segments reachable from one segment in a single hop, one entry per connection
/// in the order the network lists them. A target linked through several lane
/// pairs appears once per pair, which weights it accordingly in [`Self::choose`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NextEdges {
    targets: SmallVec<[EdgeId; NEXT_EDGE_SLOTS]>,
}

impl NextEdges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edge: EdgeId) {
        self.targets.push(edge);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn contains(&self, edge: &EdgeId) -> bool {
        self.targets.contains(edge)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EdgeId> {
        self.targets.iter()
    }

    /// Fixed-width view: the real targets first, then `None` up to
    /// [`NEXT_EDGE_SLOTS`] entries. Segments with more targets show all of them.
    pub fn slots(&self) -> Vec<Option<&EdgeId>> {
        let width = self.targets.len().max(NEXT_EDGE_SLOTS);
        (0..width).map(|idx| self.targets.get(idx)).collect()
    }

    /// Uniform choice among the entries, `None` when there is no way out.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&EdgeId> {
        if self.targets.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.targets.len());
        self.targets.get(idx)
    }
}

impl FromIterator<EdgeId> for NextEdges {
    fn from_iter<T: IntoIterator<Item = EdgeId>>(iter: T) -> Self {
        let mut next_edges = NextEdges::new();
        iter.into_iter().for_each(|edge| next_edges.push(edge));
        next_edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_edges_are_detected() {
        assert!(EdgeId::from(":J1_0").is_internal());
        assert!(!EdgeId::from("-E0").is_internal());
    }

    #[test]
    fn primary_lane_of_edge() {
        assert_eq!(LaneId::primary(&EdgeId::from("E4")).as_str(), "E4_0");
    }
}
