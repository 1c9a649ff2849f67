//! Unit tests for rf-network.
//!
//! All tests use hand-built edges or inline GeoJSON, so they run without any
//! data files.

#[cfg(test)]
mod helpers {
    use rf_core::GeoPoint;

    use crate::{RoadGraph, RoadGraphBuilder};

    pub fn pt(lon: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lon, lat)
    }

    /// A small junction network (lon, lat):
    ///
    /// ```text
    ///   e0: (0,0) → (0,0.01)
    ///   e1: (0,0.01) → (0.01,0.01)
    ///   e2: (0,0.01) → (-0.01,0.01)
    ///   e3: (0.01,0.01) → (0,0)        closes a cycle e0 → e1 → e3 → e0
    ///   e4: (0.02,0.02) → (0.03,0.03)  isolated
    /// ```
    pub fn junction_network() -> RoadGraph {
        let mut b = RoadGraphBuilder::new();
        b.add_edge(100, 5_000.0, 1, vec![pt(0.0, 0.0), pt(0.0, 0.01)]);
        b.add_edge(101, 12_000.0, 2, vec![pt(0.0, 0.01), pt(0.01, 0.01)]);
        b.add_edge(102, 25_000.0, 1, vec![pt(0.0, 0.01), pt(-0.01, 0.01)]);
        b.add_edge(103, 40_000.0, 3, vec![pt(0.01, 0.01), pt(0.0, 0.0)]);
        b.add_edge(104, 1_000.0, 1, vec![pt(0.02, 0.02), pt(0.03, 0.03)]);
        b.build()
    }

    pub fn feature(properties: &str, geometry: &str) -> String {
        format!(r#"{{"type":"Feature","properties":{properties},"geometry":{geometry}}}"#)
    }

    pub fn collection(features: &[String]) -> String {
        format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, features.join(","))
    }
}

// ── Edge and congestion model ─────────────────────────────────────────────────

#[cfg(test)]
mod edge {
    use super::helpers::pt;
    use crate::{Edge, congestion_class, congestion_multiplier};

    fn one_degree_edge(capacity: f64, lanes: u32) -> Edge {
        Edge::new(1, capacity, lanes, vec![pt(0.0, 0.0), pt(0.0, 1.0)])
    }

    #[test]
    fn congestion_class_boundaries() {
        assert_eq!(congestion_class(0.0), 0);
        assert_eq!(congestion_class(9_999.0), 0);
        assert_eq!(congestion_class(10_000.0), 1);
        assert_eq!(congestion_class(19_999.0), 1);
        assert_eq!(congestion_class(20_000.0), 2);
        assert_eq!(congestion_class(29_999.0), 2);
        assert_eq!(congestion_class(30_000.0), 3);
        assert_eq!(congestion_class(1e9), 3);
    }

    #[test]
    fn class_assigned_at_construction() {
        assert_eq!(one_degree_edge(25_000.0, 1).congestion_class(), 2);
    }

    #[test]
    fn multiplier_branches() {
        assert!((congestion_multiplier(0.5) - 1.25).abs() < 1e-12);
        assert!((congestion_multiplier(1.0) - 2.0).abs() < 1e-12);
        assert!((congestion_multiplier(2.0) - 9.0).abs() < 1e-12);
        assert_eq!(congestion_multiplier(0.0), 1.0);
    }

    #[test]
    fn length_derived_once() {
        let e = one_degree_edge(100.0, 1);
        assert!((e.length_km() - 111.195).abs() < 0.01);
        assert_eq!(e.congestion_factor(), 0.0);
        assert_eq!(e.accumulated_cost(), 0.0);
    }

    #[test]
    fn apply_flow_accumulates() {
        let mut e = one_degree_edge(100.0, 1);
        let len = e.length_km();

        assert_eq!(e.apply_flow(50.0), Some(1.25));
        assert!((e.congestion_factor() - 1.25).abs() < 1e-12);
        assert!((e.accumulated_cost() - len * 1.25).abs() < 1e-9);

        // density 2 → 9
        e.apply_flow(200.0);
        assert!((e.congestion_factor() - 10.25).abs() < 1e-12);
        assert!((e.accumulated_cost() - len * 10.25).abs() < 1e-9);
    }

    #[test]
    fn lanes_scale_capacity() {
        let mut e = one_degree_edge(100.0, 2);
        // 100 / (100 * 2) = 0.5
        assert_eq!(e.apply_flow(100.0), Some(1.25));
    }

    #[test]
    fn zero_capacity_is_guarded() {
        let mut e = one_degree_edge(0.0, 1);
        assert_eq!(e.density_ratio(500.0), 0.0);
        assert_eq!(e.apply_flow(500.0), Some(1.0));
        assert!(e.accumulated_cost().is_finite());
    }

    #[test]
    fn zero_lane_edge_is_impassable() {
        let mut e = one_degree_edge(100.0, 0);
        assert!(!e.is_passable());
        assert!(e.accumulated_cost().is_infinite());
        assert_eq!(e.apply_flow(10.0), None);
        assert_eq!(e.congestion_factor(), 0.0);
        assert!(e.accumulated_cost().is_infinite());
    }

    #[test]
    fn remove_lane_until_closed() {
        let mut e = one_degree_edge(100.0, 1);
        e.apply_flow(50.0);
        e.remove_lane();
        assert_eq!(e.lane_count(), 0);
        assert!(e.accumulated_cost().is_infinite());
        assert_eq!(e.apply_flow(50.0), None);

        // floored at zero
        e.remove_lane();
        assert_eq!(e.lane_count(), 0);
    }

    #[test]
    fn set_lane_count_reopens() {
        let mut e = one_degree_edge(100.0, 1);
        e.remove_lane();
        e.set_lane_count(2);
        assert!(e.is_passable());
        assert_eq!(e.accumulated_cost(), 0.0);
        e.set_lane_count(0);
        assert!(e.accumulated_cost().is_infinite());
    }

    #[test]
    fn reset_clears_accumulators() {
        let mut e = one_degree_edge(100.0, 1);
        e.apply_flow(300.0);
        e.reset_congestion();
        assert_eq!(e.congestion_factor(), 0.0);
        assert_eq!(e.accumulated_cost(), 0.0);
    }

    #[test]
    fn negative_flow_counts_as_zero() {
        let mut e = one_degree_edge(100.0, 1);
        assert_eq!(e.apply_flow(-5.0), Some(1.0));
        assert_eq!(e.apply_flow(f64::NAN), Some(1.0));
    }
}

// ── Builder & junction inference ──────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use rf_core::EdgeIdx;

    use super::helpers::{junction_network, pt};
    use crate::network::arena_handle;
    use crate::{RoadGraph, RoadGraphBuilder};

    fn assert_symmetric(graph: &RoadGraph) {
        for (a, edge) in graph.iter() {
            assert!(!edge.successors().contains(&a), "{a} is its own successor");
            assert!(!edge.predecessors().contains(&a), "{a} is its own predecessor");
            for &b in edge.successors() {
                assert!(graph.predecessors(b).contains(&a), "{b} lacks predecessor {a}");
            }
            for &b in edge.predecessors() {
                assert!(graph.successors(b).contains(&a), "{b} lacks successor {a}");
            }
        }
    }

    #[test]
    fn empty_build() {
        let graph = RoadGraph::empty();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.junction_count(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn links_by_shared_endpoints() {
        let graph = junction_network();
        assert_eq!(graph.successors(EdgeIdx(0)), &[EdgeIdx(1), EdgeIdx(2)]);
        assert_eq!(graph.predecessors(EdgeIdx(0)), &[EdgeIdx(3)]);
        assert_eq!(graph.successors(EdgeIdx(1)), &[EdgeIdx(3)]);
        assert_eq!(graph.predecessors(EdgeIdx(1)), &[EdgeIdx(0)]);
        assert!(graph.successors(EdgeIdx(2)).is_empty());
        assert_eq!(graph.successors(EdgeIdx(3)), &[EdgeIdx(0)]);
        assert!(graph.successors(EdgeIdx(4)).is_empty());
        assert!(graph.predecessors(EdgeIdx(4)).is_empty());
        // (0,0), (0,0.01), (0.01,0.01), (-0.01,0.01), (0.02,0.02), (0.03,0.03)
        assert_eq!(graph.junction_count(), 6);
    }

    #[test]
    fn adjacency_is_symmetric() {
        assert_symmetric(&junction_network());
    }

    #[test]
    fn self_loop_is_not_its_own_neighbour() {
        let mut b = RoadGraphBuilder::new();
        let ring = b.add_edge(1, 100.0, 1, vec![pt(0.0, 0.0), pt(0.0, 0.01), pt(0.0, 0.0)]);
        let spur = b.add_edge(2, 100.0, 1, vec![pt(0.0, 0.0), pt(0.01, 0.0)]);
        let graph = b.build();
        assert_eq!(graph.successors(ring), &[spur]);
        assert!(graph.predecessors(ring).is_empty());
        assert_symmetric(&graph);
    }

    #[test]
    fn rounding_absorbs_jitter() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_edge(1, 100.0, 1, vec![pt(0.0, 0.0), pt(0.0, 0.01)]);
        // 1e-6 off: same key at 5 decimal digits
        let c = b.add_edge(2, 100.0, 1, vec![pt(0.000001, 0.010001), pt(0.01, 0.01)]);
        // 2e-5 off: different key
        let d = b.add_edge(3, 100.0, 1, vec![pt(0.00002, 0.01), pt(-0.01, 0.01)]);
        let graph = b.build();
        assert_eq!(graph.successors(a), &[c]);
        assert!(graph.predecessors(d).is_empty());
    }

    #[test]
    fn precision_is_configurable() {
        let cfg = rf_core::NetworkConfig { junction_precision: 3, ..Default::default() };
        let mut b = RoadGraphBuilder::from_config(&cfg);
        let a = b.add_edge(1, 100.0, 1, vec![pt(0.0, 0.0), pt(0.0, 0.01)]);
        let c = b.add_edge(2, 100.0, 1, vec![pt(0.0002, 0.0101), pt(0.01, 0.01)]);
        let graph = b.build();
        assert_eq!(graph.successors(a), &[c]);
    }

    #[test]
    fn id_lookup_first_wins() {
        let mut b = RoadGraphBuilder::new();
        let first = b.add_edge(7, 100.0, 1, vec![pt(0.0, 0.0), pt(0.0, 0.01)]);
        b.add_edge(7, 200.0, 1, vec![pt(1.0, 1.0), pt(1.0, 1.01)]);
        let graph = b.build();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.index_of(7), Some(first));
        assert_eq!(graph.edge_by_id(7).unwrap().capacity_weight(), 100.0);
        assert!(graph.index_of(8).is_none());
        assert!(graph.require_id(8).is_err());
    }

    #[test]
    fn empty_geometry_is_unlinked() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_edge(1, 100.0, 1, vec![pt(0.0, 0.0), pt(0.0, 0.01)]);
        let ghost = b.add_unmeasured_edge(2, 100.0, 1, Vec::new());
        let graph = b.build();
        assert!(graph.successors(a).is_empty());
        assert!(graph.successors(ghost).is_empty());
        assert_eq!(graph[ghost].length_km(), 0.0);
    }

    #[test]
    fn lane_operations_through_graph() {
        let mut graph = junction_network();
        assert_eq!(graph.remove_lane(EdgeIdx(1)).unwrap(), 1);
        assert_eq!(graph.remove_lane(EdgeIdx(1)).unwrap(), 0);
        assert!(!graph[EdgeIdx(1)].is_passable());
        graph.set_lane_count(EdgeIdx(1), 2).unwrap();
        assert!(graph[EdgeIdx(1)].is_passable());
        assert!(graph.remove_lane(EdgeIdx(99)).is_err());
    }

    #[test]
    fn snapshot_and_reset() {
        let mut graph = junction_network();
        assert_eq!(graph.apply_flow(EdgeIdx(0), 2_500.0).unwrap(), Some(1.25));
        let snap = graph.congestion_snapshot();
        assert_eq!(snap.len(), 5);
        assert_eq!(snap[0].id, 100);
        assert!((snap[0].congestion_factor - 1.25).abs() < 1e-12);

        graph.reset_congestion();
        assert!(graph.congestion_snapshot().iter().all(|c| c.congestion_factor == 0.0));
    }

    #[test]
    fn flow_through_graph() {
        let mut graph = junction_network();
        graph.set_lane_count(EdgeIdx(1), 0).unwrap();
        assert_eq!(graph.apply_flow(EdgeIdx(1), 100.0).unwrap(), None);
        assert_eq!(graph[EdgeIdx(1)].accumulated_cost(), f64::INFINITY);
        assert!(graph.apply_flow(EdgeIdx(99), 100.0).is_err());
    }

    #[test]
    fn arena_handles_stop_before_sentinel() {
        assert_eq!(arena_handle(0), Some(EdgeIdx(0)));
        assert_eq!(arena_handle(u32::MAX as usize - 1), Some(EdgeIdx(u32::MAX - 1)));
        assert_eq!(arena_handle(u32::MAX as usize), None);
    }
}

// ── GeoJSON loading ───────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use rf_core::{EdgeIdx, NetworkConfig};
    use serde_json::json;

    use super::helpers::{collection, feature};
    use crate::loader::{coerce_id, coerce_number, graph_from_reader, graph_from_str};
    use crate::NetworkError;

    fn line(coords: &str) -> String {
        format!(r#"{{"type":"LineString","coordinates":{coords}}}"#)
    }

    fn dc_fixture() -> String {
        collection(&[
            feature(r#"{"ROUTEID":"11000202","AADT":15000}"#, &line("[[-77.03,38.90],[-77.02,38.90]]")),
            feature(r#"{"ROUTEID":11000203,"AADT":32000}"#, &line("[[-77.02,38.90],[-77.01,38.90]]")),
            feature(
                r#"{"ROUTEID":"11000204","AADT":8000}"#,
                r#"{"type":"MultiLineString","coordinates":[[[-77.02,38.90],[-77.02,38.91]],[[-77.02,38.91],[-77.02,38.92]]]}"#,
            ),
        ])
    }

    #[test]
    fn loads_line_features() {
        let graph = graph_from_str(&dc_fixture(), &NetworkConfig::default()).unwrap();
        assert_eq!(graph.edge_count(), 3);

        let e0 = &graph[EdgeIdx(0)];
        assert_eq!(e0.id(), 11_000_202);
        assert_eq!(e0.capacity_weight(), 15_000.0);
        assert_eq!(e0.congestion_class(), 1);
        assert_eq!(e0.lane_count(), 1);
        assert!(e0.length_km() > 0.8 && e0.length_km() < 0.9, "got {}", e0.length_km());

        assert_eq!(graph[EdgeIdx(1)].congestion_class(), 3);
        assert_eq!(graph.successors(EdgeIdx(0)), &[EdgeIdx(1), EdgeIdx(2)]);
    }

    #[test]
    fn multiline_parts_are_concatenated() {
        let graph = graph_from_str(&dc_fixture(), &NetworkConfig::default()).unwrap();
        let e2 = &graph[EdgeIdx(2)];
        assert_eq!(e2.geometry().len(), 4);
        assert_eq!(e2.start().unwrap().lat, 38.90);
        assert_eq!(e2.end().unwrap().lat, 38.92);
        // ~0.02 degrees of latitude
        assert!((e2.length_km() - 2.2239).abs() < 0.001);
    }

    #[test]
    fn building_twice_is_identical() {
        let cfg = NetworkConfig::default();
        let a = graph_from_str(&dc_fixture(), &cfg).unwrap();
        let b = graph_from_str(&dc_fixture(), &cfg).unwrap();
        assert_eq!(a.edge_count(), b.edge_count());
        for ((ia, ea), (_, eb)) in a.iter().zip(b.iter()) {
            assert_eq!(ea.successors(), eb.successors(), "successors of {ia}");
            assert_eq!(ea.predecessors(), eb.predecessors(), "predecessors of {ia}");
            assert_eq!(ea.congestion_class(), eb.congestion_class());
            assert_eq!(ea.length_km(), eb.length_km());
        }
    }

    #[test]
    fn missing_attributes_default_to_zero() {
        let text = collection(&[feature("{}", &line("[[0,0],[0,1]]")), feature("null", &line("[[0,1],[1,1]]"))]);
        let graph = graph_from_str(&text, &NetworkConfig::default()).unwrap();
        for (_, e) in graph.iter() {
            assert_eq!(e.id(), 0);
            assert_eq!(e.capacity_weight(), 0.0);
            assert_eq!(e.congestion_class(), 0);
        }
    }

    #[test]
    fn negative_volume_is_clamped() {
        let text = collection(&[feature(r#"{"ROUTEID":1,"AADT":-50}"#, &line("[[0,0],[0,1]]"))]);
        let graph = graph_from_str(&text, &NetworkConfig::default()).unwrap();
        assert_eq!(graph[EdgeIdx(0)].capacity_weight(), 0.0);
    }

    #[test]
    fn id_coercion() {
        assert_eq!(coerce_id(Some(&json!("12abc"))), 12);
        assert_eq!(coerce_id(Some(&json!("  -3"))), -3);
        assert_eq!(coerce_id(Some(&json!(7.9))), 7);
        assert_eq!(coerce_id(Some(&json!(42))), 42);
        assert_eq!(coerce_id(Some(&json!("abc"))), 0);
        assert_eq!(coerce_id(Some(&json!(true))), 0);
        assert_eq!(coerce_id(None), 0);
    }

    #[test]
    fn number_coercion() {
        assert_eq!(coerce_number(Some(&json!(1.5))), Some(1.5));
        assert_eq!(coerce_number(Some(&json!(" 2500 "))), Some(2500.0));
        assert_eq!(coerce_number(Some(&json!("n/a"))), None);
        assert_eq!(coerce_number(Some(&json!(null))), None);
    }

    #[test]
    fn unsupported_geometry_is_linked_with_zero_length() {
        let text = collection(&[
            feature(r#"{"ROUTEID":1}"#, &line("[[0,0],[0,0.01]]")),
            feature(
                r#"{"ROUTEID":2}"#,
                r#"{"type":"MultiPoint","coordinates":[[0,0.01],[0.005,0.01],[0.01,0.01]]}"#,
            ),
        ]);
        let graph = graph_from_str(&text, &NetworkConfig::default()).unwrap();
        let odd = &graph[EdgeIdx(1)];
        assert_eq!(odd.length_km(), 0.0);
        assert_eq!(odd.geometry().len(), 3);
        assert_eq!(graph.successors(EdgeIdx(0)), &[EdgeIdx(1)]);
    }

    #[test]
    fn point_and_polygon_geometries() {
        let text = collection(&[
            feature(r#"{"ROUTEID":1}"#, r#"{"type":"Point","coordinates":[5.0,5.0]}"#),
            feature(
                r#"{"ROUTEID":2}"#,
                r#"{"type":"Polygon","coordinates":[[[0,0],[0,0.01],[0.01,0.01],[0,0]]]}"#,
            ),
        ]);
        let graph = graph_from_str(&text, &NetworkConfig::default()).unwrap();

        let point = &graph[EdgeIdx(0)];
        assert_eq!(point.geometry().len(), 1);
        assert_eq!(point.length_km(), 0.0);

        let ring = &graph[EdgeIdx(1)];
        assert_eq!(ring.geometry().len(), 4);
        assert!(ring.length_km() > 0.0);
        assert_eq!(ring.start(), ring.end());
    }

    #[test]
    fn null_geometry_yields_unlinked_edge() {
        let text = collection(&[feature(r#"{"ROUTEID":9,"AADT":100}"#, "null")]);
        let graph = graph_from_str(&text, &NetworkConfig::default()).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph[EdgeIdx(0)].geometry().is_empty());
        assert_eq!(graph.junction_count(), 0);
    }

    #[test]
    fn lanes_property() {
        let cfg = NetworkConfig {
            lanes_property: Some("LANES".to_owned()),
            default_lane_count: 2,
            ..NetworkConfig::default()
        };
        let text = collection(&[
            feature(r#"{"ROUTEID":1,"LANES":3}"#, &line("[[0,0],[0,1]]")),
            feature(r#"{"ROUTEID":2}"#, &line("[[0,1],[1,1]]")),
            feature(r#"{"ROUTEID":3,"LANES":0}"#, &line("[[1,1],[2,1]]")),
        ]);
        let graph = graph_from_str(&text, &cfg).unwrap();
        assert_eq!(graph[EdgeIdx(0)].lane_count(), 3);
        assert_eq!(graph[EdgeIdx(1)].lane_count(), 2);
        assert_eq!(graph[EdgeIdx(2)].lane_count(), 0);
        assert!(graph[EdgeIdx(2)].accumulated_cost().is_infinite());
    }

    #[test]
    fn single_feature_is_accepted() {
        let text = feature(r#"{"ROUTEID":5}"#, &line("[[0,0],[0,1]]"));
        let graph = graph_from_reader(text.as_bytes(), &NetworkConfig::default()).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn malformed_text_is_an_error() {
        let err = graph_from_str("{ not json", &NetworkConfig::default());
        assert!(matches!(err, Err(NetworkError::GeoJson(_))));
    }

    #[test]
    fn bare_geometry_is_rejected() {
        let err = graph_from_str(&line("[[0,0],[0,1]]"), &NetworkConfig::default());
        assert!(matches!(err, Err(NetworkError::InvalidInput(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = NetworkConfig { junction_precision: 40, ..NetworkConfig::default() };
        let err = graph_from_str(&dc_fixture(), &cfg);
        assert!(matches!(err, Err(NetworkError::Core(_))));
    }
}

// ── Spatial queries ───────────────────────────────────────────────────────────

#[cfg(test)]
mod spatial {
    use rf_core::EdgeIdx;

    use super::helpers::{junction_network, pt};
    use crate::{RoadGraph, RoadGraphBuilder};

    #[test]
    fn point_on_segment_is_found() {
        let graph = junction_network();
        // midpoint of e1, 5e-5 off the line
        assert_eq!(graph.find_edge_containing_point(pt(0.005, 0.01005)), Some(EdgeIdx(1)));
    }

    #[test]
    fn point_off_network_is_none() {
        let graph = junction_network();
        assert_eq!(graph.find_edge_containing_point(pt(0.005, 0.002)), None);
    }

    #[test]
    fn shared_junction_resolves_to_first_edge() {
        let graph = junction_network();
        // (0, 0.01) is the end of e0 and the start of e1 and e2.
        assert_eq!(graph.find_edge_containing_point(pt(0.0, 0.01)), Some(EdgeIdx(0)));
    }

    #[test]
    fn multi_segment_polyline() {
        let mut b = RoadGraphBuilder::new();
        let bend = b.add_edge(1, 100.0, 1, vec![pt(0.0, 0.0), pt(0.0, 1.0), pt(1.0, 1.0)]);
        let graph = b.build();
        // on the second segment, far from the start→end chord
        assert_eq!(graph.find_edge_containing_point(pt(0.5, 1.0)), Some(bend));
        assert_eq!(graph.find_edge_containing_point(pt(0.5, 0.5)), None);
    }

    #[test]
    fn single_point_geometry() {
        let mut b = RoadGraphBuilder::new();
        let dot = b.add_unmeasured_edge(1, 100.0, 1, vec![pt(3.0, 3.0)]);
        let graph = b.build();
        assert_eq!(graph.find_edge_containing_point(pt(3.00001, 3.0)), Some(dot));
        assert_eq!(graph.find_edge_containing_point(pt(3.001, 3.0)), None);
    }

    #[test]
    fn nearest_edge() {
        let graph = junction_network();
        let (idx, dist) = graph.nearest_edge(pt(0.025, 0.0251)).unwrap();
        assert_eq!(idx, EdgeIdx(4));
        assert!(dist < 0.001);
    }

    #[test]
    fn empty_graph_has_no_matches() {
        let graph = RoadGraph::empty();
        assert!(graph.find_edge_containing_point(pt(0.0, 0.0)).is_none());
        assert!(graph.nearest_edge(pt(0.0, 0.0)).is_none());
    }
}
