//! Lane closures and the closure-then-reroute workflow.
//!
//! A closure names its edge either directly or by a map point.  Point
//! targets resolve through [`RoadGraph::find_edge_containing_point`]; a point
//! that misses every edge is logged and skipped rather than failing the run.

use log::{info, warn};

use rf_core::{EdgeIdx, GeoPoint, TraversalLimits};
use rf_network::RoadGraph;

use crate::distributor::{FlowReport, TrafficDistributor};
use crate::path::{DfsPathFinder, PathFinder, Route};
use crate::TrafficResult;

// ── Closures ──────────────────────────────────────────────────────────────────

/// How a closure identifies its edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClosureTarget {
    Edge(EdgeIdx),
    /// Input id; resolves to the first edge carrying it.
    Id(i64),
    /// Map point; resolves to the first edge within the proximity tolerance.
    Point(GeoPoint),
}

impl ClosureTarget {
    /// The edge this target names, or `None` for a point that hits nothing.
    ///
    /// # Errors
    ///
    /// Unknown edge handles and ids.
    pub fn resolve(&self, graph: &RoadGraph) -> TrafficResult<Option<EdgeIdx>> {
        match *self {
            ClosureTarget::Edge(idx) => {
                graph.require(idx)?;
                Ok(Some(idx))
            }
            ClosureTarget::Id(id) => Ok(Some(graph.require_id(id)?)),
            ClosureTarget::Point(point) => Ok(graph.find_edge_containing_point(point)),
        }
    }
}

/// A change to one edge's lane count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Closure {
    /// Close a single lane.
    RemoveLane(ClosureTarget),
    /// Close every lane.
    CloseEdge(ClosureTarget),
    /// Set the lane count back to the given value.
    RestoreLanes(ClosureTarget, u32),
}

impl Closure {
    pub fn target(&self) -> ClosureTarget {
        match *self {
            Closure::RemoveLane(t) | Closure::CloseEdge(t) | Closure::RestoreLanes(t, _) => t,
        }
    }
}

/// A closure that found its edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedClosure {
    pub closure:      Closure,
    pub edge:         EdgeIdx,
    pub edge_id:      i64,
    pub lanes_before: u32,
    pub lanes_after:  u32,
}

/// Apply one closure to `graph`.
///
/// Returns `Ok(None)` when a point target misses the network.
pub fn apply_closure(graph: &mut RoadGraph, closure: Closure) -> TrafficResult<Option<AppliedClosure>> {
    let Some(edge) = closure.target().resolve(graph)? else {
        warn!("{closure:?}: no edge at that point, skipped");
        return Ok(None);
    };
    let lanes_before = graph[edge].lane_count();

    let lanes_after = match closure {
        Closure::RemoveLane(_) => graph.remove_lane(edge)?,
        Closure::CloseEdge(_) => {
            graph.set_lane_count(edge, 0)?;
            0
        }
        Closure::RestoreLanes(_, lanes) => {
            graph.set_lane_count(edge, lanes)?;
            lanes
        }
    };

    let edge_id = graph[edge].id();
    info!("Edge {edge_id}: lanes {lanes_before} → {lanes_after}");
    Ok(Some(AppliedClosure { closure, edge, edge_id, lanes_before, lanes_after }))
}

// ── Scenario ──────────────────────────────────────────────────────────────────

/// What one scenario run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    /// Closures that resolved to an edge, in application order.
    pub applied: Vec<AppliedClosure>,
    pub flow:    FlowReport,
    pub route:   Route,
}

/// Distribute, optionally close lanes, then redistribute and reroute.
///
/// Every run starts from a congestion reset, so outcomes reflect the current
/// lane state only.  Closures persist in the graph between runs; restore them
/// with [`Closure::RestoreLanes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosureScenario<P = DfsPathFinder> {
    distributor: TrafficDistributor,
    finder:      P,
}

impl ClosureScenario<DfsPathFinder> {
    pub fn new(limits: TraversalLimits) -> Self {
        Self {
            distributor: TrafficDistributor::new(limits),
            finder:      DfsPathFinder::new(limits),
        }
    }
}

impl<P: PathFinder> ClosureScenario<P> {
    pub fn with_finder(distributor: TrafficDistributor, finder: P) -> Self {
        Self { distributor, finder }
    }

    /// Fresh distribution and route with no closures applied.
    pub fn baseline(
        &self,
        graph:  &mut RoadGraph,
        root:   EdgeIdx,
        target: EdgeIdx,
        flow:   f64,
    ) -> TrafficResult<ScenarioOutcome> {
        self.run(graph, root, target, flow, &[])
    }

    /// Apply `closures` in order, then distribute `flow` from `root` and
    /// search for a route to `target`.
    pub fn run(
        &self,
        graph:    &mut RoadGraph,
        root:     EdgeIdx,
        target:   EdgeIdx,
        flow:     f64,
        closures: &[Closure],
    ) -> TrafficResult<ScenarioOutcome> {
        graph.require(target)?;

        let mut applied = Vec::with_capacity(closures.len());
        for &closure in closures {
            if let Some(a) = apply_closure(graph, closure)? {
                applied.push(a);
            }
        }

        graph.reset_congestion();
        let flow = self.distributor.distribute(graph, root, flow)?;
        let route = self.finder.find_path(graph, root, target)?;
        Ok(ScenarioOutcome { applied, flow, route })
    }
}
