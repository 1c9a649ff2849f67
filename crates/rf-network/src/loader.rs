//! GeoJSON loader.
//!
//! # Usage
//!
//! ```ignore
//! use std::path::Path;
//! use rf_core::NetworkConfig;
//! use rf_network::loader::graph_from_path;
//!
//! let graph = graph_from_path(Path::new("dc_roads.geojson"), &NetworkConfig::default())?;
//! ```
//!
//! # What is loaded
//!
//! One edge per feature, in input order.  Geometry is converted through
//! `geo` and flattened to a single ordered point list:
//!
//! | Geometry          | Points used                          | Length   |
//! |-------------------|--------------------------------------|----------|
//! | `LineString`      | as-is                                | measured |
//! | `MultiLineString` | parts concatenated in input order    | measured |
//! | `Point`           | the point                            | 0        |
//! | `Polygon`         | exterior ring                        | measured |
//! | anything else     | every coordinate, for junction keys  | 0, warns |
//! | missing           | none (edge is never linked)          | 0, warns |
//!
//! Attributes are read from feature properties named by [`NetworkConfig`].
//! A missing or non-numeric id or volume becomes 0; nothing here fails on
//! bad feature data.

use std::io::Read;
use std::path::Path;

use geo::CoordsIter;
use geojson::{Feature, FeatureCollection, GeoJson};
use log::{debug, warn};
use serde_json::Value as JsonValue;

use rf_core::{GeoPoint, NetworkConfig};

use crate::network::{RoadGraph, RoadGraphBuilder};
use crate::{NetworkError, NetworkResult};

// ── Public entry points ───────────────────────────────────────────────────────

/// Build a graph from GeoJSON text.
///
/// Accepts a `FeatureCollection` or a single `Feature`.
///
/// # Errors
///
/// [`NetworkError::GeoJson`] if the text is not valid GeoJSON,
/// [`NetworkError::InvalidInput`] for a bare geometry,
/// [`NetworkError::Core`] if `config` fails validation.
pub fn graph_from_str(text: &str, config: &NetworkConfig) -> NetworkResult<RoadGraph> {
    let collection = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(feature) => FeatureCollection {
            bbox:            None,
            features:        vec![feature],
            foreign_members: None,
        },
        GeoJson::Geometry(_) => {
            return Err(NetworkError::InvalidInput(
                "expected a FeatureCollection or Feature, found a bare geometry".to_owned(),
            ));
        }
    };
    graph_from_collection(collection, config)
}

/// Build a graph from a reader yielding GeoJSON text.
pub fn graph_from_reader<R: Read>(reader: R, config: &NetworkConfig) -> NetworkResult<RoadGraph> {
    let text = std::io::read_to_string(reader)?;
    graph_from_str(&text, config)
}

/// Build a graph from a GeoJSON file.
pub fn graph_from_path(path: &Path, config: &NetworkConfig) -> NetworkResult<RoadGraph> {
    let text = std::fs::read_to_string(path)?;
    graph_from_str(&text, config)
}

/// Build a graph from an already-parsed collection.
pub fn graph_from_collection(
    collection: FeatureCollection,
    config:     &NetworkConfig,
) -> NetworkResult<RoadGraph> {
    config.validate()?;

    let mut builder =
        RoadGraphBuilder::from_config(config).with_capacity(collection.features.len());
    for (position, feature) in collection.features.into_iter().enumerate() {
        add_feature(&mut builder, position, feature, config);
    }
    Ok(builder.build())
}

// ── Per-feature conversion ────────────────────────────────────────────────────

fn add_feature(builder: &mut RoadGraphBuilder, position: usize, feature: Feature, config: &NetworkConfig) {
    let id = coerce_id(feature.property(&config.id_property));
    let volume = read_volume(&feature, config, id);
    let lanes = read_lanes(&feature, config);

    match flatten_geometry(feature.geometry) {
        FlatGeometry::Measured(points) => {
            builder.add_edge(id, volume, lanes, points);
        }
        FlatGeometry::Point(points) => {
            builder.add_unmeasured_edge(id, volume, lanes, points);
        }
        FlatGeometry::Unsupported { kind, points } => {
            warn!("Unsupported geometry type {kind} on feature {position} (id {id}); length set to 0");
            builder.add_unmeasured_edge(id, volume, lanes, points);
        }
        FlatGeometry::Missing => {
            warn!("Feature {position} (id {id}) has no geometry; it will not be linked");
            builder.add_unmeasured_edge(id, volume, lanes, Vec::new());
        }
    }
}

fn read_volume(feature: &Feature, config: &NetworkConfig, id: i64) -> f64 {
    let volume = coerce_number(feature.property(&config.volume_property)).unwrap_or(0.0);
    if volume < 0.0 {
        warn!("Negative {} {volume} on edge id {id}; using 0", config.volume_property);
        return 0.0;
    }
    volume
}

fn read_lanes(feature: &Feature, config: &NetworkConfig) -> u32 {
    config
        .lanes_property
        .as_deref()
        .and_then(|key| coerce_number(feature.property(key)))
        .map(|lanes| lanes.clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(config.default_lane_count)
}

// ── Geometry flattening ───────────────────────────────────────────────────────

enum FlatGeometry {
    Measured(Vec<GeoPoint>),
    Point(Vec<GeoPoint>),
    Unsupported { kind: &'static str, points: Vec<GeoPoint> },
    Missing,
}

fn flatten_geometry(geometry: Option<geojson::Geometry>) -> FlatGeometry {
    let Some(geometry) = geometry else {
        return FlatGeometry::Missing;
    };
    let geometry = match geo::Geometry::<f64>::try_from(geometry) {
        Ok(g) => g,
        Err(e) => {
            debug!("Geometry conversion failed: {e}");
            return FlatGeometry::Unsupported { kind: "invalid", points: Vec::new() };
        }
    };

    let to_point = |c: geo::Coord<f64>| GeoPoint::new(c.x, c.y);
    match geometry {
        geo::Geometry::LineString(line) => {
            FlatGeometry::Measured(line.coords().map(|c| to_point(*c)).collect())
        }
        geo::Geometry::MultiLineString(lines) => FlatGeometry::Measured(
            lines
                .iter()
                .flat_map(|line| line.coords())
                .map(|c| to_point(*c))
                .collect(),
        ),
        geo::Geometry::Polygon(polygon) => {
            FlatGeometry::Measured(polygon.exterior().coords().map(|c| to_point(*c)).collect())
        }
        geo::Geometry::Point(point) => FlatGeometry::Point(vec![to_point(point.0)]),
        other => FlatGeometry::Unsupported {
            kind:   geometry_kind(&other),
            points: other.coords_iter().map(to_point).collect(),
        },
    }
}

fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

// ── Attribute coercion ────────────────────────────────────────────────────────

/// Integer id from a JSON number (truncated) or the leading integer of a
/// string (`"12abc"` → 12).  Anything else is 0.
pub(crate) fn coerce_id(value: Option<&JsonValue>) -> i64 {
    match value {
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(JsonValue::String(s)) => leading_integer(s).unwrap_or(0),
        _ => 0,
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let magnitude: i64 = rest[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// A finite number from a JSON number or numeric string.
pub(crate) fn coerce_number(value: Option<&JsonValue>) -> Option<f64> {
    let n = match value? {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
