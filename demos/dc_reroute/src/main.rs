//! `dc_reroute`: lane-closure rerouting on a road network.
//!
//! Loads road segments from GeoJSON (or the bundled Washington, D.C. sample),
//! distributes the entering traffic from a root edge, finds the cheapest
//! route to a target edge, then closes lanes at the given map points and
//! does both again.  Baseline and closure results go to CSV and GeoJSON.
//!
//! Run with:
//!   cargo run -p dc-reroute
//!   cargo run -p dc-reroute -- --close -77.0275,38.9025 --close -77.0275,38.8999
//!
//! Set `RUST_LOG=debug` to see every per-edge flow assignment.

mod cli;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rf_core::{EngineConfig, GeoPoint};
use rf_network::RoadGraph;
use rf_network::loader::{graph_from_path, graph_from_str};
use rf_output::{CsvSnapshotWriter, congestion_geojson, route_geojson, write_geojson};
use rf_traffic::{Closure, ClosureScenario, ClosureTarget, ScenarioOutcome};

use cli::Args;

const SAMPLE_ROADS: &str = include_str!("../data/sample_roads.geojson");
const SAMPLE_CONFIG: &str = include_str!("../data/roadflow.toml");

/// On sample edge 5, the direct link to the target.
const SAMPLE_CLOSURE: GeoPoint = GeoPoint { lon: -77.0275, lat: 38.8999 };

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let mut graph = load_graph(&args, &config)?;
    println!(
        "Network: {} edges, {} junctions",
        graph.edge_count(),
        graph.junction_count()
    );

    let root = graph.require_id(args.root).context("--root")?;
    let target = graph.require_id(args.target).context("--target")?;

    let closures = closures_for(&args);

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating output directory {}", args.out.display()))?;
    let mut csv = CsvSnapshotWriter::new(&args.out)?;
    let scenario = ClosureScenario::new(config.limits);

    // ── Baseline ──────────────────────────────────────────────────────────
    let baseline = scenario.baseline(&mut graph, root, target, args.flow)?;
    report("baseline", &graph, &baseline);
    export("baseline", &graph, &baseline, &mut csv, &args.out)?;

    // ── Closures ──────────────────────────────────────────────────────────
    let closed = scenario.run(&mut graph, root, target, args.flow, &closures)?;
    if closed.applied.len() < closures.len() {
        warn!(
            "{} of {} closure points matched no edge",
            closures.len() - closed.applied.len(),
            closures.len()
        );
    }
    for a in &closed.applied {
        println!("Closed a lane on edge {}: {} → {}", a.edge_id, a.lanes_before, a.lanes_after);
    }
    report("closed", &graph, &closed);
    export("closed", &graph, &closed, &mut csv, &args.out)?;

    csv.finish()?;
    info!("Output written to {}", args.out.display());

    if baseline.route.edge_ids != closed.route.edge_ids {
        println!("Rerouted: {:?} → {:?}", baseline.route.edge_ids, closed.route.edge_ids);
    }
    Ok(())
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn load_config(args: &Args) -> Result<EngineConfig> {
    let text = match &args.config {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None if args.input.is_none() => SAMPLE_CONFIG.to_owned(),
        None => return Ok(EngineConfig::default()),
    };
    let config: EngineConfig = toml::from_str(&text).context("parsing config")?;
    config.validate()?;
    Ok(config)
}

fn load_graph(args: &Args, config: &EngineConfig) -> Result<RoadGraph> {
    let graph = match &args.input {
        Some(path) => graph_from_path(path, &config.network)
            .with_context(|| format!("loading {}", path.display()))?,
        None => graph_from_str(SAMPLE_ROADS, &config.network)?,
    };
    if graph.is_empty() {
        bail!("network has no edges");
    }
    Ok(graph)
}

/// One lane per `--close` point.  With the sample network and no points,
/// the sample's direct link is closed outright.
fn closures_for(args: &Args) -> Vec<Closure> {
    if args.closures.is_empty() && args.input.is_none() {
        return vec![Closure::CloseEdge(ClosureTarget::Point(SAMPLE_CLOSURE))];
    }
    args.closures
        .iter()
        .map(|&p| Closure::RemoveLane(ClosureTarget::Point(p)))
        .collect()
}

// ── Reporting ─────────────────────────────────────────────────────────────────

fn report(label: &str, graph: &RoadGraph, outcome: &ScenarioOutcome) {
    let flow = &outcome.flow;
    println!();
    println!("── {label} ──");
    println!(
        "  flow {:.0} from edge {}: {} visits, {:.0} reached terminal edges, {:.0} dropped at cycles{}",
        flow.input_flow,
        graph[flow.root].id(),
        flow.visits(),
        flow.terminal_flow,
        flow.suppressed_flow,
        if flow.truncated { " (truncated)" } else { "" }
    );
    println!("  {:>8}  {:>5}  {:>5}  {:>10}  {:>10}", "edge", "class", "lanes", "factor", "cost");
    for row in graph.congestion_snapshot() {
        println!(
            "  {:>8}  {:>5}  {:>5}  {:>10.3}  {:>10.3}",
            row.id, row.congestion_class, row.lane_count, row.congestion_factor, row.accumulated_cost
        );
    }
    let route = &outcome.route;
    if route.is_empty() {
        println!("  route: none");
    } else {
        println!("  route: {:?}  cost {:.3}", route.edge_ids, route.total_cost);
    }
}

fn export(
    label:   &str,
    graph:   &RoadGraph,
    outcome: &ScenarioOutcome,
    csv:     &mut CsvSnapshotWriter,
    out:     &Path,
) -> Result<()> {
    csv.write_graph(label, graph)?;
    csv.write_route(label, graph, &outcome.route)?;
    write_geojson(&out.join(format!("congestion_{label}.geojson")), &congestion_geojson(graph))?;
    write_geojson(&out.join(format!("route_{label}.geojson")), &route_geojson(graph, &outcome.route))?;
    Ok(())
}
