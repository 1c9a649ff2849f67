//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `congestion_snapshot.csv`, one row per edge per scenario
//! - `routes.csv`, one row per route step per scenario

use std::fs::File;
use std::path::Path;

use csv::Writer;

use rf_network::{EdgeCongestion, RoadGraph};
use rf_traffic::Route;

use crate::OutputResult;

/// Column headers of `congestion_snapshot.csv`.
pub const SNAPSHOT_HEADERS: [&str; 7] = [
    "scenario",
    "edge_id",
    "congestion_class",
    "lane_count",
    "congestion_factor",
    "accumulated_cost",
    "length_km",
];

/// Column headers of `routes.csv`.
pub const ROUTE_HEADERS: [&str; 4] = ["scenario", "step", "edge_id", "accumulated_cost"];

/// Writes congestion snapshots and routes to two CSV files.
///
/// Each call tags its rows with a scenario label so several runs (for
/// example a baseline and a closure) can share one file.
pub struct CsvSnapshotWriter {
    snapshots: Writer<File>,
    routes:    Writer<File>,
    finished:  bool,
}

impl CsvSnapshotWriter {
    /// Create the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut snapshots = Writer::from_path(dir.join("congestion_snapshot.csv"))?;
        snapshots.write_record(SNAPSHOT_HEADERS)?;

        let mut routes = Writer::from_path(dir.join("routes.csv"))?;
        routes.write_record(ROUTE_HEADERS)?;

        Ok(Self { snapshots, routes, finished: false })
    }

    /// Write one row per edge.  Infinite costs are written as `inf`.
    pub fn write_snapshot(&mut self, scenario: &str, rows: &[EdgeCongestion]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record(&[
                scenario.to_owned(),
                row.id.to_string(),
                row.congestion_class.to_string(),
                row.lane_count.to_string(),
                row.congestion_factor.to_string(),
                row.accumulated_cost.to_string(),
                row.length_km.to_string(),
            ])?;
        }
        Ok(())
    }

    /// Write the current congestion state of every edge in `graph`.
    pub fn write_graph(&mut self, scenario: &str, graph: &RoadGraph) -> OutputResult<()> {
        self.write_snapshot(scenario, &graph.congestion_snapshot())
    }

    /// Write the steps of `route`, numbered from 0.  An empty route writes
    /// nothing.
    pub fn write_route(&mut self, scenario: &str, graph: &RoadGraph, route: &Route) -> OutputResult<()> {
        for (step, &edge) in route.edges.iter().enumerate() {
            let e = &graph[edge];
            self.routes.write_record(&[
                scenario.to_owned(),
                step.to_string(),
                e.id().to_string(),
                e.accumulated_cost().to_string(),
            ])?;
        }
        Ok(())
    }

    /// Flush both files.  Idempotent.
    pub fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.snapshots.flush()?;
        self.routes.flush()?;
        Ok(())
    }
}
