//! GeoJSON export for map display.
//!
//! Edge geometry becomes a `LineString` (or a `Point` for single-point
//! edges; no geometry for empty ones).  Non-finite numbers, such as the
//! infinite cost of a closed edge, serialize as `null`.

use std::fs;
use std::path::Path;

use geo::{Coord, LineString, Point};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use log::info;
use serde_json::{Map, Value as JsonValue, json};

use rf_core::GeoPoint;
use rf_network::{Edge, RoadGraph};
use rf_traffic::Route;

use crate::OutputResult;

/// Every edge with its congestion state, for a choropleth layer.
///
/// Properties: `id`, `congestion_class`, `congestion_factor`,
/// `accumulated_cost`, `lane_count`, `length_km`.
pub fn congestion_geojson(graph: &RoadGraph) -> FeatureCollection {
    let features = graph
        .iter()
        .map(|(_, e)| {
            edge_feature(
                e,
                json!({
                    "id": e.id(),
                    "congestion_class": e.congestion_class(),
                    "congestion_factor": e.congestion_factor(),
                    "accumulated_cost": e.accumulated_cost(),
                    "lane_count": e.lane_count(),
                    "length_km": e.length_km(),
                }),
            )
        })
        .collect();

    collection(features, None)
}

/// The edges of `route` in order, with an `order` property counting from 0.
///
/// The collection carries `total_cost` and `truncated` as foreign members.
pub fn route_geojson(graph: &RoadGraph, route: &Route) -> FeatureCollection {
    let features = route
        .edges
        .iter()
        .enumerate()
        .map(|(order, &idx)| {
            let e = &graph[idx];
            edge_feature(
                e,
                json!({
                    "id": e.id(),
                    "order": order,
                    "accumulated_cost": e.accumulated_cost(),
                    "lane_count": e.lane_count(),
                }),
            )
        })
        .collect();

    let members = json!({
        "total_cost": route.total_cost,
        "truncated": route.truncated,
    });
    collection(features, as_object(members))
}

/// Serialize `collection` to `path`.
pub fn write_geojson(path: &Path, collection: &FeatureCollection) -> OutputResult<()> {
    let text = serde_json::to_string(collection)?;
    fs::write(path, text)?;
    info!("Wrote {} features to {}", collection.features.len(), path.display());
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn collection(features: Vec<Feature>, foreign_members: Option<Map<String, JsonValue>>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    }
}

fn edge_feature(edge: &Edge, properties: JsonValue) -> Feature {
    Feature {
        bbox:            None,
        geometry:        edge_geometry(edge.geometry()),
        id:              None,
        properties:      as_object(properties),
        foreign_members: None,
    }
}

fn edge_geometry(points: &[GeoPoint]) -> Option<Geometry> {
    let coord = |p: &GeoPoint| Coord { x: p.lon, y: p.lat };
    match points {
        [] => None,
        [p] => Some(Geometry::new(GeoJsonValue::from(&Point::from(coord(p))))),
        _ => {
            let line = LineString::new(points.iter().map(coord).collect());
            Some(Geometry::new(GeoJsonValue::from(&line)))
        }
    }
}

fn as_object(value: JsonValue) -> Option<Map<String, JsonValue>> {
    match value {
        JsonValue::Object(map) => Some(map),
        _ => None,
    }
}
