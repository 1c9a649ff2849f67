//! `rf-core`: foundational types for the `roadflow` traffic engine.
//!
//! This crate is a dependency of every other `rf-*` crate.  It has no
//! `rf-*` dependencies and a single external one (`thiserror`, plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`ids`]    | `EdgeIdx` arena handle                                       |
//! | [`geo`]    | `GeoPoint`, haversine distance, point-to-segment projection |
//! | [`config`] | `NetworkConfig`, `TraversalLimits`, `EngineConfig`           |
//! | [`error`]  | `CoreError`, `CoreResult`                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{EngineConfig, NetworkConfig, TraversalLimits};
pub use error::{CoreError, CoreResult};
pub use geo::{
    GeoPoint, PROXIMITY_TOLERANCE, SegmentProjection, geodesic_distance, point_to_segment_distance,
    point_to_segment_distance_within, polyline_length,
};
pub use ids::EdgeIdx;
