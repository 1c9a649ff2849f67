//! Road segment graph and builder.
//!
//! # Data layout
//!
//! Every [`Edge`] lives in one owning `Vec`, addressed by [`EdgeIdx`].
//! Successor and predecessor lists hold `EdgeIdx` handles only, so the
//! back-and-forth adjacency never forms an ownership cycle.
//!
//! # Junction inference
//!
//! Nothing in the input says which segments meet.  `build()` keys every
//! edge's first and last point by its coordinates rounded to
//! `junction_precision` decimal digits; edge `B` succeeds edge `A` exactly
//! when `B` starts on the key where `A` ends.  Rounding absorbs the small
//! coordinate jitter between features digitised separately.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) holds one entry per polyline segment.  It answers
//! "which edge is under this map point" queries from the rendering layer.

use std::collections::{HashMap, HashSet};
use std::ops::Index;

use log::{info, warn};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use rf_core::{EdgeIdx, GeoPoint, NetworkConfig, point_to_segment_distance_within};

use crate::edge::{Edge, EdgeCongestion};
use crate::{NetworkError, NetworkResult};

// ── R-tree segment entry ──────────────────────────────────────────────────────

/// One straight piece of an edge's polyline, in `[lon, lat]` space.
#[derive(Clone)]
struct SegmentEntry {
    start: [f64; 2],
    end:   [f64; 2],
    edge:  EdgeIdx,
}

impl SegmentEntry {
    fn distance(&self, point: &[f64; 2]) -> f64 {
        point_to_segment_distance_within(
            GeoPoint::from(*point),
            GeoPoint::from(self.start),
            GeoPoint::from(self.end),
            0.0,
        )
        .distance
    }
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.start, self.end)
    }
}

impl PointDistance for SegmentEntry {
    /// Squared planar distance in degree space, matching the proximity
    /// tolerance's units.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.distance(point).powi(2)
    }
}

// ── Junction key ──────────────────────────────────────────────────────────────

/// A coordinate rounded to a fixed number of decimal digits.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
struct JunctionKey {
    lon: i64,
    lat: i64,
}

impl JunctionKey {
    fn new(point: GeoPoint, scale: f64) -> Self {
        Self {
            lon: (point.lon * scale).round() as i64,
            lat: (point.lat * scale).round() as i64,
        }
    }
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Directed segment graph plus a spatial index for point queries.
///
/// Do not construct directly; use [`RoadGraphBuilder`] or one of the
/// GeoJSON loaders in [`crate::loader`].
pub struct RoadGraph {
    edges:               Vec<Edge>,
    id_index:            HashMap<i64, EdgeIdx>,
    junction_count:      usize,
    proximity_tolerance: f64,
    spatial_idx:         RTree<SegmentEntry>,
}

impl RoadGraph {
    /// Construct an empty graph with no edges.
    pub fn empty() -> Self {
        RoadGraphBuilder::new().build()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of distinct rounded endpoint coordinates.
    pub fn junction_count(&self) -> usize {
        self.junction_count
    }

    pub fn proximity_tolerance(&self) -> f64 {
        self.proximity_tolerance
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn contains(&self, idx: EdgeIdx) -> bool {
        idx.index() < self.edges.len()
    }

    pub fn get(&self, idx: EdgeIdx) -> Option<&Edge> {
        self.edges.get(idx.index())
    }

    /// Mutable access stays inside the crate; outside callers change edges
    /// only through the lane and flow operations below.
    pub(crate) fn get_mut(&mut self, idx: EdgeIdx) -> Option<&mut Edge> {
        self.edges.get_mut(idx.index())
    }

    /// Handle of the first edge carrying input id `id`.
    pub fn index_of(&self, id: i64) -> Option<EdgeIdx> {
        self.id_index.get(&id).copied()
    }

    pub fn edge_by_id(&self, id: i64) -> Option<&Edge> {
        self.index_of(id).map(|idx| &self[idx])
    }

    /// Like [`index_of`](Self::index_of), as a `Result`.
    pub fn require_id(&self, id: i64) -> NetworkResult<EdgeIdx> {
        self.index_of(id).ok_or(NetworkError::UnknownEdgeId(id))
    }

    /// Like [`get`](Self::get), as a `Result`.
    pub fn require(&self, idx: EdgeIdx) -> NetworkResult<&Edge> {
        self.get(idx).ok_or(NetworkError::EdgeNotFound(idx))
    }

    /// All edges in insertion order, paired with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (EdgeIdx, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeIdx(i as u32), e))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Downstream edges of `idx`, in graph order.
    ///
    /// # Panics
    ///
    /// If `idx` is not a handle into this graph.
    #[inline]
    pub fn successors(&self, idx: EdgeIdx) -> &[EdgeIdx] {
        self.edges[idx.index()].successors()
    }

    /// Upstream edges of `idx`.
    ///
    /// # Panics
    ///
    /// If `idx` is not a handle into this graph.
    #[inline]
    pub fn predecessors(&self, idx: EdgeIdx) -> &[EdgeIdx] {
        self.edges[idx.index()].predecessors()
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The first edge (in graph order) with a segment within the proximity
    /// tolerance of `point`, or `None`.
    pub fn find_edge_containing_point(&self, point: GeoPoint) -> Option<EdgeIdx> {
        let query = point.to_array();
        let tol = self.proximity_tolerance;
        self.spatial_idx
            .locate_within_distance(query, tol * tol)
            .filter(|entry| entry.distance(&query) < tol)
            .map(|entry| entry.edge)
            .min()
    }

    /// The edge nearest to `point` and its planar distance in degrees.
    ///
    /// Returns `None` only if no edge has any geometry.
    pub fn nearest_edge(&self, point: GeoPoint) -> Option<(EdgeIdx, f64)> {
        let query = point.to_array();
        self.spatial_idx
            .nearest_neighbor(&query)
            .map(|entry| (entry.edge, entry.distance(&query)))
    }

    // ── Lane operations ───────────────────────────────────────────────────

    /// Close one lane on `idx`, returning the remaining lane count.
    pub fn remove_lane(&mut self, idx: EdgeIdx) -> NetworkResult<u32> {
        let edge = self.get_mut(idx).ok_or(NetworkError::EdgeNotFound(idx))?;
        edge.remove_lane();
        Ok(edge.lane_count())
    }

    pub fn set_lane_count(&mut self, idx: EdgeIdx, lanes: u32) -> NetworkResult<()> {
        let edge = self.get_mut(idx).ok_or(NetworkError::EdgeNotFound(idx))?;
        edge.set_lane_count(lanes);
        Ok(())
    }

    // ── Congestion state ──────────────────────────────────────────────────

    /// Charge `flow` onto `idx` (see [`Edge::apply_flow`]).  Returns the
    /// multiplier applied, or `None` if the edge has no open lanes.
    pub fn apply_flow(&mut self, idx: EdgeIdx, flow: f64) -> NetworkResult<Option<f64>> {
        let edge = self.get_mut(idx).ok_or(NetworkError::EdgeNotFound(idx))?;
        Ok(edge.apply_flow(flow))
    }

    /// Zero every edge's congestion accumulators.
    pub fn reset_congestion(&mut self) {
        for edge in &mut self.edges {
            edge.reset_congestion();
        }
    }

    /// Current congestion state of every edge, in graph order.
    pub fn congestion_snapshot(&self) -> Vec<EdgeCongestion> {
        self.iter().map(|(idx, e)| e.congestion(idx)).collect()
    }
}

/// # Panics
///
/// If the handle is not from this graph; use [`RoadGraph::get`] or
/// [`RoadGraph::require`] for unchecked handles.
impl Index<EdgeIdx> for RoadGraph {
    type Output = Edge;

    #[inline]
    fn index(&self, idx: EdgeIdx) -> &Edge {
        &self.edges[idx.index()]
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Collect edges, then call [`build`](Self::build) to infer adjacency.
///
/// # Example
///
/// ```
/// use rf_core::GeoPoint;
/// use rf_network::RoadGraphBuilder;
///
/// let mut b = RoadGraphBuilder::new();
/// let a = b.add_edge(1, 12_000.0, 2, vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01)]);
/// let c = b.add_edge(2, 8_000.0, 1, vec![GeoPoint::new(0.0, 0.01), GeoPoint::new(0.01, 0.01)]);
/// let graph = b.build();
/// assert_eq!(graph.successors(a), &[c]);
/// assert_eq!(graph.predecessors(c), &[a]);
/// ```
pub struct RoadGraphBuilder {
    /// Capped by `arena_handle`, so every position casts to `EdgeIdx`.
    edges:               Vec<Edge>,
    junction_precision:  u32,
    proximity_tolerance: f64,
}

impl RoadGraphBuilder {
    /// Builder using the default [`NetworkConfig`].
    pub fn new() -> Self {
        Self::from_config(&NetworkConfig::default())
    }

    /// Builder taking junction precision and proximity tolerance from
    /// `config`.  The config is assumed validated.
    pub fn from_config(config: &NetworkConfig) -> Self {
        Self {
            edges:               Vec::new(),
            junction_precision:  config.junction_precision,
            proximity_tolerance: config.proximity_tolerance,
        }
    }

    /// Pre-allocate for the expected number of edges.
    pub fn with_capacity(mut self, edges: usize) -> Self {
        self.edges.reserve(edges);
        self
    }

    /// Add an edge, measuring its length from `geometry`.
    pub fn add_edge(
        &mut self,
        id:              i64,
        capacity_weight: f64,
        lane_count:      u32,
        geometry:        Vec<GeoPoint>,
    ) -> EdgeIdx {
        self.push(Edge::new(id, capacity_weight, lane_count, geometry))
    }

    /// Add an edge with length 0.  Its geometry still takes part in junction
    /// matching and point queries.
    pub fn add_unmeasured_edge(
        &mut self,
        id:              i64,
        capacity_weight: f64,
        lane_count:      u32,
        geometry:        Vec<GeoPoint>,
    ) -> EdgeIdx {
        self.push(Edge::unmeasured(id, capacity_weight, lane_count, geometry))
    }

    fn push(&mut self, edge: Edge) -> EdgeIdx {
        let Some(idx) = arena_handle(self.edges.len()) else {
            warn!("Edge arena full; edge {} dropped", edge.id());
            return EdgeIdx::INVALID;
        };
        self.edges.push(edge);
        idx
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Consume the builder and produce a linked [`RoadGraph`].
    ///
    /// Time complexity: O(E) for junction matching plus O(S log S) for the
    /// R-tree bulk load, where S is the total number of polyline segments.
    pub fn build(self) -> RoadGraph {
        let mut edges = self.edges;
        let scale = 10f64.powi(self.junction_precision as i32);

        // ── Group edges by rounded start and end point ────────────────────
        let mut starting_at: HashMap<JunctionKey, Vec<EdgeIdx>> = HashMap::new();
        let mut ending_at:   HashMap<JunctionKey, Vec<EdgeIdx>> = HashMap::new();

        let keys: Vec<Option<(JunctionKey, JunctionKey)>> = edges
            .iter()
            .map(|e| Some((JunctionKey::new(e.start()?, scale), JunctionKey::new(e.end()?, scale))))
            .collect();

        for (i, key) in keys.iter().enumerate() {
            if let Some((start, end)) = key {
                let idx = EdgeIdx(i as u32);
                starting_at.entry(*start).or_default().push(idx);
                ending_at.entry(*end).or_default().push(idx);
            }
        }

        // ── Link edges meeting at a junction ──────────────────────────────
        for (i, key) in keys.iter().enumerate() {
            let Some((start, end)) = key else { continue };
            let idx = EdgeIdx(i as u32);
            let others = |list: Option<&Vec<EdgeIdx>>| -> Vec<EdgeIdx> {
                list.map(|l| l.iter().copied().filter(|&o| o != idx).collect())
                    .unwrap_or_default()
            };
            edges[i].predecessors = others(ending_at.get(start));
            edges[i].successors = others(starting_at.get(end));
        }

        let junction_count = starting_at
            .keys()
            .chain(ending_at.keys())
            .collect::<HashSet<_>>()
            .len();

        // ── Resolve input ids (first occurrence wins) ─────────────────────
        let mut id_index: HashMap<i64, EdgeIdx> = HashMap::with_capacity(edges.len());
        for (i, e) in edges.iter().enumerate() {
            if id_index.contains_key(&e.id()) {
                warn!("Duplicate edge id {} at {}; lookups by id resolve to the first", e.id(), EdgeIdx(i as u32));
            } else {
                id_index.insert(e.id(), EdgeIdx(i as u32));
            }
        }

        // ── Bulk-load the segment R-tree ──────────────────────────────────
        let segments: Vec<SegmentEntry> = edges
            .iter()
            .enumerate()
            .flat_map(|(i, e)| segment_entries(EdgeIdx(i as u32), e.geometry()))
            .collect();
        let spatial_idx = RTree::bulk_load(segments);

        info!(
            "Road graph built: {} edges, {} junctions, {} indexed segments",
            edges.len(),
            junction_count,
            spatial_idx.size()
        );

        RoadGraph {
            edges,
            id_index,
            junction_count,
            proximity_tolerance: self.proximity_tolerance,
            spatial_idx,
        }
    }
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for the arena slot at position `len`, or `None` once the arena is
/// full.  `EdgeIdx::INVALID` is never handed out.
pub(crate) fn arena_handle(len: usize) -> Option<EdgeIdx> {
    EdgeIdx::try_from(len).ok().filter(|&idx| idx != EdgeIdx::INVALID)
}

/// Segment entries for one polyline.  A single point becomes a zero-length
/// segment; non-finite coordinates are skipped.
fn segment_entries(edge: EdgeIdx, geometry: &[GeoPoint]) -> Vec<SegmentEntry> {
    let finite = |p: &GeoPoint| p.lon.is_finite() && p.lat.is_finite();
    let entry = |a: GeoPoint, b: GeoPoint| SegmentEntry { start: a.to_array(), end: b.to_array(), edge };

    match geometry {
        [] => Vec::new(),
        [p] if finite(p) => vec![entry(*p, *p)],
        [_] => Vec::new(),
        _ => geometry
            .windows(2)
            .filter(|w| finite(&w[0]) && finite(&w[1]))
            .map(|w| entry(w[0], w[1]))
            .collect(),
    }
}
