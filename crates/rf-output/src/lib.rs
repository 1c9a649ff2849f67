//! `rf-output`: congestion output writers for the roadflow engine.
//!
//! | Module     | Output                                                        |
//! |------------|---------------------------------------------------------------|
//! | [`csv`]    | `congestion_snapshot.csv`, `routes.csv`                        |
//! | [`export`] | GeoJSON `FeatureCollection`s of congestion state and routes    |
//!
//! # Usage
//!
//! ```rust,ignore
//! use rf_output::{CsvSnapshotWriter, congestion_geojson, write_geojson};
//!
//! let mut csv = CsvSnapshotWriter::new(Path::new("./output"))?;
//! csv.write_graph("baseline", &graph)?;
//! csv.finish()?;
//! write_geojson(Path::new("./output/congestion.geojson"), &congestion_geojson(&graph))?;
//! ```

pub mod csv;
pub mod error;
pub mod export;


pub use crate::csv::{CsvSnapshotWriter, ROUTE_HEADERS, SNAPSHOT_HEADERS};
pub use error::{OutputError, OutputResult};
pub use export::{congestion_geojson, route_geojson, write_geojson};
