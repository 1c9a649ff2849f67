//! Proportional traffic distribution.
//!
//! # Model
//!
//! Flow enters at a root edge and is pushed downstream.  At every edge the
//! received flow is split across its *passable* successors in proportion to
//! their capacity weight:
//!
//! ```text
//! share_i = weight_i / Σ weight · flow
//! ```
//!
//! Each successor is charged with its share (see [`Edge::apply_flow`]) and
//! the split repeats from there.  An edge without passable successors is
//! terminal and is charged once more with the flow it received.  The root
//! itself is charged with the input flow first; a root with no open lanes
//! carries nothing and the pass ends immediately.
//!
//! # Cycles
//!
//! The graph may contain cycles.  An edge that is still on the current
//! traversal path is never re-entered; its share is dropped and reported as
//! `suppressed_flow`.  The guard is path-local: the same edge can be charged
//! again when reached along a different branch.
//!
//! # Stack depth
//!
//! The traversal keeps an explicit stack of frames rather than recursing, so
//! long chains do not exhaust the call stack.  Visit order is identical to a
//! depth-first recursion over successors in graph order.
//!
//! [`Edge::apply_flow`]: rf_network::Edge::apply_flow

use log::{debug, info, trace, warn};

use rf_core::{EdgeIdx, TraversalLimits};
use rf_network::RoadGraph;

use crate::{TrafficError, TrafficResult};

// ── Report ────────────────────────────────────────────────────────────────────

/// One charge of flow onto one edge during a distribution pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowAssignment {
    pub edge:       EdgeIdx,
    /// The edge this flow came from; `None` for the root.
    pub parent:     Option<EdgeIdx>,
    pub flow:       f64,
    /// Congestion multiplier applied; `None` if the edge was impassable.
    /// Terminal edges are charged twice and report the sum of both.
    pub multiplier: Option<f64>,
    /// Path length at this visit, root = 1.
    pub depth:      usize,
    /// No passable successors, so the flow stopped here.
    pub terminal:   bool,
}

/// Everything a distribution pass did, in visit order.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowReport {
    pub root:            EdgeIdx,
    pub input_flow:      f64,
    /// Flow the root actually carried (0 if it has no open lanes).
    pub root_flow:       f64,
    pub assignments:     Vec<FlowAssignment>,
    /// Total flow that ended on terminal edges.
    pub terminal_flow:   f64,
    /// Shares dropped because their successor was already on the path.
    pub suppressed_flow: f64,
    /// A traversal limit stopped the pass early.
    pub truncated:       bool,
}

impl FlowReport {
    fn new(root: EdgeIdx, input_flow: f64) -> Self {
        Self {
            root,
            input_flow,
            root_flow: 0.0,
            assignments: Vec::new(),
            terminal_flow: 0.0,
            suppressed_flow: 0.0,
            truncated: false,
        }
    }

    /// Total flow charged to `edge` over the whole pass.
    pub fn flow_into(&self, edge: EdgeIdx) -> f64 {
        self.assignments
            .iter()
            .filter(|a| a.edge == edge)
            .map(|a| a.flow)
            .sum()
    }

    /// Assignments made directly from `parent` to its successors.
    pub fn shares_from(&self, parent: EdgeIdx) -> impl Iterator<Item = &FlowAssignment> + '_ {
        self.assignments.iter().filter(move |a| a.parent == Some(parent))
    }

    /// Number of edge visits.
    pub fn visits(&self) -> usize {
        self.assignments.len()
    }
}

// ── Distributor ───────────────────────────────────────────────────────────────

/// Splits an input flow across the graph downstream of a root edge.
///
/// Congestion accumulates across calls; call
/// [`RoadGraph::reset_congestion`] first for a fresh snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrafficDistributor {
    limits: TraversalLimits,
}

struct Frame {
    edge:   EdgeIdx,
    shares: Vec<(EdgeIdx, f64)>,
    cursor: usize,
}

impl Frame {
    fn next_share(&mut self) -> Option<(EdgeIdx, f64)> {
        let share = self.shares.get(self.cursor).copied();
        self.cursor += 1;
        share
    }
}

impl TrafficDistributor {
    pub fn new(limits: TraversalLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> TraversalLimits {
        self.limits
    }

    /// Push `input_flow` through `graph` starting at `root`.
    ///
    /// # Errors
    ///
    /// [`TrafficError::Network`] if `root` is not in the graph,
    /// [`TrafficError::InvalidFlow`] if `input_flow` is negative or not finite.
    pub fn distribute(
        &self,
        graph:      &mut RoadGraph,
        root:       EdgeIdx,
        input_flow: f64,
    ) -> TrafficResult<FlowReport> {
        let root_id = graph.require(root)?.id();
        if !input_flow.is_finite() || input_flow < 0.0 {
            return Err(TrafficError::InvalidFlow(input_flow));
        }

        let mut report = FlowReport::new(root, input_flow);

        if !graph[root].is_passable() {
            info!("Root edge {root_id} has no open lanes: traffic = 0");
            return Ok(report);
        }

        report.root_flow = input_flow;
        let mut on_path = vec![false; graph.edge_count()];
        let mut expansions = 1usize;

        let first = self.charge(graph, &mut report, root, None, input_flow, 1)?;
        on_path[root.index()] = true;
        let mut stack = vec![first];

        loop {
            let Some(frame) = stack.last_mut() else { break };
            let parent = frame.edge;
            let Some((child, share)) = frame.next_share() else {
                on_path[parent.index()] = false;
                stack.pop();
                continue;
            };

            if on_path[child.index()] {
                trace!("Cycle at {child}: dropping share {share:.2} from {parent}");
                report.suppressed_flow += share;
                continue;
            }

            let depth = stack.len() + 1;
            if depth > self.limits.max_depth {
                if !report.truncated {
                    warn!(
                        "Distribution from edge {root_id} cut at depth {} (max_depth)",
                        self.limits.max_depth
                    );
                }
                report.truncated = true;
                continue;
            }

            if expansions >= self.limits.max_expansions {
                warn!(
                    "Distribution from edge {root_id} stopped after {expansions} visits (max_expansions)"
                );
                report.truncated = true;
                break;
            }
            expansions += 1;

            let frame = self.charge(graph, &mut report, child, Some(parent), share, depth)?;
            if !frame.shares.is_empty() {
                on_path[child.index()] = true;
                stack.push(frame);
            }
        }

        info!(
            "Distributed {input_flow:.2} from edge {root_id}: {} visits, {:.2} terminal, {:.2} suppressed{}",
            report.visits(),
            report.terminal_flow,
            report.suppressed_flow,
            if report.truncated { " (truncated)" } else { "" }
        );
        Ok(report)
    }

    /// Apply `flow` to `edge`, record it, and compute the successor split.
    fn charge(
        &self,
        graph:  &mut RoadGraph,
        report: &mut FlowReport,
        edge:   EdgeIdx,
        parent: Option<EdgeIdx>,
        flow:   f64,
        depth:  usize,
    ) -> TrafficResult<Frame> {
        let mut multiplier = graph.apply_flow(edge, flow)?;
        let shares = successor_shares(graph, edge, flow);
        let terminal = shares.is_empty();

        // Flow that stops here settles on the edge a second time.
        if terminal {
            let settled = graph.apply_flow(edge, flow)?;
            multiplier = multiplier.zip(settled).map(|(first, second)| first + second);
            report.terminal_flow += flow;
        }

        let e = &graph[edge];
        debug!(
            "Edge {} (weight {}, lanes {}): traffic {:.2}, congestion factor {:.2}{}",
            e.id(),
            e.capacity_weight(),
            e.lane_count(),
            flow,
            e.congestion_factor(),
            if terminal { " [terminal]" } else { "" }
        );

        report.assignments.push(FlowAssignment { edge, parent, flow, multiplier, depth, terminal });

        Ok(Frame { edge, shares, cursor: 0 })
    }
}

/// Split `flow` across the passable successors of `edge` by capacity weight.
///
/// A zero total weight gives every successor a zero share.
pub fn successor_shares(graph: &RoadGraph, edge: EdgeIdx, flow: f64) -> Vec<(EdgeIdx, f64)> {
    let passable: Vec<EdgeIdx> = graph
        .successors(edge)
        .iter()
        .copied()
        .filter(|&s| graph[s].is_passable())
        .collect();
    let total: f64 = passable.iter().map(|&s| graph[s].capacity_weight()).sum();

    passable
        .into_iter()
        .map(|s| {
            let share = if total > 0.0 {
                graph[s].capacity_weight() / total * flow
            } else {
                0.0
            };
            (s, share)
        })
        .collect()
}
