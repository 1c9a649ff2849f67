//! The road segment entity and its congestion model.
//!
//! Identity, capacity, and geometry are fixed at construction.  Only the
//! congestion accumulators and the lane count change afterwards, through
//! [`Edge::apply_flow`], [`Edge::remove_lane`], [`Edge::set_lane_count`], and
//! [`Edge::reset_congestion`].

use rf_core::{EdgeIdx, GeoPoint, polyline_length};

// ── Congestion model ──────────────────────────────────────────────────────────

/// Upper bounds (exclusive) of congestion classes 0, 1, and 2.  Anything at
/// or above the last bound is class 3.
pub const CONGESTION_CLASS_BOUNDS: [f64; 3] = [10_000.0, 20_000.0, 30_000.0];

/// Bucket a nominal traffic volume into a congestion class in `0..=3`.
pub fn congestion_class(capacity_weight: f64) -> u8 {
    CONGESTION_CLASS_BOUNDS
        .iter()
        .position(|&bound| capacity_weight < bound)
        .unwrap_or(CONGESTION_CLASS_BOUNDS.len()) as u8
}

/// Congestion multiplier for a flow/capacity ratio.
///
/// Quadratic up to nominal capacity, cubic beyond it; both branches give 2
/// at a ratio of exactly 1.
#[inline]
pub fn congestion_multiplier(density_ratio: f64) -> f64 {
    if density_ratio <= 1.0 {
        1.0 + density_ratio.powi(2)
    } else {
        1.0 + density_ratio.powi(3)
    }
}

// ── Edge ──────────────────────────────────────────────────────────────────────

/// A directed road segment.
#[derive(Debug, Clone)]
pub struct Edge {
    id:              i64,
    capacity_weight: f64,
    lane_count:      u32,
    length_km:       f64,
    geometry:        Vec<GeoPoint>,
    congestion_class: u8,

    congestion_factor: f64,
    accumulated_cost:  f64,

    pub(crate) successors:   Vec<EdgeIdx>,
    pub(crate) predecessors: Vec<EdgeIdx>,
}

impl Edge {
    /// Create an edge, deriving its length from `geometry`.
    pub fn new(id: i64, capacity_weight: f64, lane_count: u32, geometry: Vec<GeoPoint>) -> Self {
        let length_km = polyline_length(&geometry);
        Self::with_length(id, capacity_weight, lane_count, geometry, length_km)
    }

    /// Create an edge whose geometry could not be measured.  The geometry is
    /// kept for junction matching but the length is zero.
    pub fn unmeasured(id: i64, capacity_weight: f64, lane_count: u32, geometry: Vec<GeoPoint>) -> Self {
        Self::with_length(id, capacity_weight, lane_count, geometry, 0.0)
    }

    fn with_length(
        id:              i64,
        capacity_weight: f64,
        lane_count:      u32,
        geometry:        Vec<GeoPoint>,
        length_km:       f64,
    ) -> Self {
        let mut edge = Self {
            id,
            capacity_weight,
            lane_count,
            length_km,
            geometry,
            congestion_class: congestion_class(capacity_weight),
            congestion_factor: 0.0,
            accumulated_cost: 0.0,
            successors: Vec::new(),
            predecessors: Vec::new(),
        };
        edge.reset_congestion();
        edge
    }

    // ── Identity and static attributes ────────────────────────────────────

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn capacity_weight(&self) -> f64 {
        self.capacity_weight
    }

    pub fn lane_count(&self) -> u32 {
        self.lane_count
    }

    /// Geodesic length in kilometres.
    pub fn length_km(&self) -> f64 {
        self.length_km
    }

    pub fn geometry(&self) -> &[GeoPoint] {
        &self.geometry
    }

    /// First point of the geometry, if any.
    pub fn start(&self) -> Option<GeoPoint> {
        self.geometry.first().copied()
    }

    /// Last point of the geometry, if any.
    pub fn end(&self) -> Option<GeoPoint> {
        self.geometry.last().copied()
    }

    pub fn congestion_class(&self) -> u8 {
        self.congestion_class
    }

    // ── Adjacency ─────────────────────────────────────────────────────────

    /// Edges starting where this one ends.
    pub fn successors(&self) -> &[EdgeIdx] {
        &self.successors
    }

    /// Edges ending where this one starts.
    pub fn predecessors(&self) -> &[EdgeIdx] {
        &self.predecessors
    }

    // ── Congestion state ──────────────────────────────────────────────────

    /// `false` once every lane is closed.
    #[inline]
    pub fn is_passable(&self) -> bool {
        self.lane_count > 0
    }

    /// Running sum of applied congestion multipliers.
    pub fn congestion_factor(&self) -> f64 {
        self.congestion_factor
    }

    /// Running sum of `length × multiplier`; `+inf` while impassable.
    pub fn accumulated_cost(&self) -> f64 {
        self.accumulated_cost
    }

    /// Flow divided by total lane capacity.  Zero capacity yields zero
    /// rather than an unbounded ratio.
    pub fn density_ratio(&self, flow: f64) -> f64 {
        let capacity = self.capacity_weight * f64::from(self.lane_count);
        if capacity > 0.0 { flow / capacity } else { 0.0 }
    }

    /// Charge this edge with `flow` units of traffic.
    ///
    /// Returns the multiplier applied, or `None` when the edge is impassable
    /// (its cost stays at `+inf`).  Negative or non-finite flow counts as 0.
    pub fn apply_flow(&mut self, flow: f64) -> Option<f64> {
        if !self.is_passable() {
            self.accumulated_cost = f64::INFINITY;
            return None;
        }
        let flow = if flow.is_finite() { flow.max(0.0) } else { 0.0 };
        let multiplier = congestion_multiplier(self.density_ratio(flow));
        self.congestion_factor += multiplier;
        self.accumulated_cost += self.length_km * multiplier;
        Some(multiplier)
    }

    /// Close one lane.  Closing the last lane makes the edge impassable.
    pub fn remove_lane(&mut self) {
        self.lane_count = self.lane_count.saturating_sub(1);
        if self.lane_count == 0 {
            self.accumulated_cost = f64::INFINITY;
        }
    }

    /// Overwrite the lane count (external reset of closures).
    ///
    /// Reopening a closed edge clears its infinite cost back to zero; the
    /// congestion factor is left alone.
    pub fn set_lane_count(&mut self, lanes: u32) {
        let was_passable = self.is_passable();
        self.lane_count = lanes;
        if !self.is_passable() {
            self.accumulated_cost = f64::INFINITY;
        } else if !was_passable {
            self.accumulated_cost = 0.0;
        }
    }

    /// Discard all accumulated congestion.
    pub fn reset_congestion(&mut self) {
        self.congestion_factor = 0.0;
        self.accumulated_cost = if self.is_passable() { 0.0 } else { f64::INFINITY };
    }

    /// Current congestion state as a plain row.
    pub fn congestion(&self, idx: EdgeIdx) -> EdgeCongestion {
        EdgeCongestion {
            idx,
            id:                self.id,
            congestion_class:  self.congestion_class,
            lane_count:        self.lane_count,
            congestion_factor: self.congestion_factor,
            accumulated_cost:  self.accumulated_cost,
            length_km:         self.length_km,
        }
    }
}

// ── Snapshot row ──────────────────────────────────────────────────────────────

/// Congestion state of one edge at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeCongestion {
    pub idx:               EdgeIdx,
    pub id:                i64,
    pub congestion_class:  u8,
    pub lane_count:        u32,
    pub congestion_factor: f64,
    pub accumulated_cost:  f64,
    pub length_km:         f64,
}
