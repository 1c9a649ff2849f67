//! Congestion-weighted path search between two edges.
//!
//! The cost of a path is the sum of `accumulated_cost` over its edges, root
//! and target included.  Costs come from a prior [`TrafficDistributor`]
//! pass; on a graph with no congestion every cost is zero and the search
//! degenerates to "first simple path found".
//!
//! [`TrafficDistributor`]: crate::TrafficDistributor

use log::{debug, info, warn};

use rf_core::{EdgeIdx, TraversalLimits};
use rf_network::RoadGraph;

use crate::TrafficResult;

// ── Route ─────────────────────────────────────────────────────────────────────

/// Result of a path search.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    /// Edge handles from root to target, inclusive.  Empty if unreachable.
    pub edges:      Vec<EdgeIdx>,
    /// Input ids of `edges`, same order.
    pub edge_ids:   Vec<i64>,
    /// Sum of `accumulated_cost` along the route; 0 when empty.
    pub total_cost: f64,
    /// A traversal limit cut the search short, so a cheaper route may exist.
    pub truncated:  bool,
}

impl Route {
    fn from_edges(graph: &RoadGraph, edges: Vec<EdgeIdx>, total_cost: f64, truncated: bool) -> Self {
        let edge_ids = edges.iter().map(|&e| graph[e].id()).collect();
        Self { edges, edge_ids, total_cost, truncated }
    }

    fn unreachable(truncated: bool) -> Self {
        Self { truncated, ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, edge: EdgeIdx) -> bool {
        self.edges.contains(&edge)
    }
}

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Route search over a congested graph.
pub trait PathFinder {
    /// Cheapest route from `root` to `target`, or an empty [`Route`] when no
    /// passable path exists.
    ///
    /// # Errors
    ///
    /// Only for handles that are not in `graph`.
    fn find_path(&self, graph: &RoadGraph, root: EdgeIdx, target: EdgeIdx) -> TrafficResult<Route>;
}

// ── DfsPathFinder ─────────────────────────────────────────────────────────────

/// Exhaustive depth-first search over simple paths.
///
/// An edge already on the current path is not re-entered, but stays
/// available to sibling branches.  Edges with no open lanes are never
/// entered.  Branches whose running cost already reaches the best complete
/// route are pruned; costs are non-negative, so pruning never changes the
/// result.  On equal cost the route found first wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct DfsPathFinder {
    limits: TraversalLimits,
}

struct Frame {
    edge:   EdgeIdx,
    cost:   f64,
    cursor: usize,
}

impl DfsPathFinder {
    pub fn new(limits: TraversalLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> TraversalLimits {
        self.limits
    }
}

impl PathFinder for DfsPathFinder {
    fn find_path(&self, graph: &RoadGraph, root: EdgeIdx, target: EdgeIdx) -> TrafficResult<Route> {
        let root_edge = graph.require(root)?;
        let target_id = graph.require(target)?.id();

        if !root_edge.is_passable() || !graph[target].is_passable() {
            info!("No route {} → {target_id}: an endpoint has no open lanes", root_edge.id());
            return Ok(Route::unreachable(false));
        }
        let root_cost = root_edge.accumulated_cost();
        if root == target {
            return Ok(Route::from_edges(graph, vec![root], root_cost, false));
        }

        let mut on_path = vec![false; graph.edge_count()];
        on_path[root.index()] = true;
        let mut stack = vec![Frame { edge: root, cost: root_cost, cursor: 0 }];
        let mut best: Option<(Vec<EdgeIdx>, f64)> = None;
        let mut expansions = 1usize;
        let mut truncated = false;

        'search: while let Some(frame) = stack.last_mut() {
            let Some(&child) = graph.successors(frame.edge).get(frame.cursor) else {
                on_path[frame.edge.index()] = false;
                stack.pop();
                continue;
            };
            frame.cursor += 1;
            let cost_so_far = frame.cost;

            let edge = &graph[child];
            if on_path[child.index()] || !edge.is_passable() {
                continue;
            }
            let cost = cost_so_far + edge.accumulated_cost();
            if best.as_ref().is_some_and(|(_, best_cost)| cost >= *best_cost) {
                continue;
            }

            if stack.len() >= self.limits.max_depth {
                if !truncated {
                    warn!("Path search cut at depth {} (max_depth)", self.limits.max_depth);
                }
                truncated = true;
                continue;
            }

            if child == target {
                let mut path: Vec<EdgeIdx> = stack.iter().map(|f| f.edge).collect();
                path.push(child);
                debug!("Route candidate of {} edges, cost {cost:.4}", path.len());
                best = Some((path, cost));
                continue;
            }

            if expansions >= self.limits.max_expansions {
                warn!("Path search stopped after {expansions} expansions (max_expansions)");
                truncated = true;
                break 'search;
            }
            expansions += 1;

            on_path[child.index()] = true;
            stack.push(Frame { edge: child, cost, cursor: 0 });
        }

        let route = match best {
            Some((edges, cost)) => Route::from_edges(graph, edges, cost, truncated),
            None => Route::unreachable(truncated),
        };
        info!(
            "Path search {} → {target_id}: {} ({expansions} expansions{})",
            root_edge.id(),
            if route.is_empty() {
                "unreachable".to_owned()
            } else {
                format!("{} edges, cost {:.4}", route.len(), route.total_cost)
            },
            if truncated { ", truncated" } else { "" }
        );
        Ok(route)
    }
}
