//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use rf_core::GeoPoint;

/// Distribute traffic over a road network, close lanes, and reroute.
#[derive(Parser, Debug)]
#[command(name = "dc_reroute", version, about)]
pub struct Args {
    /// GeoJSON FeatureCollection of road segments.  Uses the bundled sample
    /// network when omitted.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// TOML engine configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Input id of the edge where traffic enters.
    #[arg(long, default_value_t = 0)]
    pub root: i64,

    /// Input id of the route destination edge.
    #[arg(long, default_value_t = 6)]
    pub target: i64,

    /// Traffic volume entering at the root edge.
    #[arg(long, default_value_t = 60_000.0)]
    pub flow: f64,

    /// Close one lane on the edge under this point, as `lon,lat`.
    /// Repeatable.
    #[arg(long = "close", value_name = "LON,LAT", value_parser = parse_point)]
    pub closures: Vec<GeoPoint>,

    /// Output directory for CSV and GeoJSON files.
    #[arg(long, default_value = "output")]
    pub out: PathBuf,
}

/// Parse `lon,lat` into a point.
pub fn parse_point(s: &str) -> Result<GeoPoint, String> {
    let (lon, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LON,LAT, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate {v:?}: {e}"))
    };
    let (lon, lat) = (parse(lon)?, parse(lat)?);
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("coordinate out of range: {lon},{lat}"));
    }
    Ok(GeoPoint::new(lon, lat))
}
