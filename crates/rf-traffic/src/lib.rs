//! `rf-traffic`: flow distribution, route search, and lane closures.
//!
//! Everything here operates on a built [`rf_network::RoadGraph`] and is a
//! single synchronous pass; run passes one after another, never
//! concurrently on the same graph.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`distributor`] | `TrafficDistributor`, `FlowReport`, `FlowAssignment`       |
//! | [`path`]        | `PathFinder` trait, `DfsPathFinder`, `Route`               |
//! | [`closure`]     | `Closure`, `apply_closure`, `ClosureScenario`              |
//! | [`error`]       | `TrafficError`, `TrafficResult<T>`                         |
//!
//! # Typical use
//!
//! ```ignore
//! graph.reset_congestion();
//! TrafficDistributor::default().distribute(&mut graph, root, 5_000.0)?;
//! let route = DfsPathFinder::default().find_path(&graph, root, target)?;
//! ```

pub mod closure;
pub mod distributor;
pub mod error;
pub mod path;


pub use closure::{AppliedClosure, Closure, ClosureScenario, ClosureTarget, ScenarioOutcome, apply_closure};
pub use distributor::{FlowAssignment, FlowReport, TrafficDistributor, successor_shares};
pub use error::{TrafficError, TrafficResult};
pub use path::{DfsPathFinder, PathFinder, Route};
