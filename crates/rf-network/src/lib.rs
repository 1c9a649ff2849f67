//! `rf-network`: road segment graph, junction inference, and loading.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                       |
//! |-------------|----------------------------------------------------------------|
//! | [`edge`]    | `Edge`, congestion class and multiplier, `EdgeCongestion` row  |
//! | [`network`] | `RoadGraph` (edge arena + R-tree), `RoadGraphBuilder`          |
//! | [`loader`]  | GeoJSON `FeatureCollection` → `RoadGraph`                      |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod edge;
pub mod error;
pub mod loader;
pub mod network;

#[cfg(test)]
mod tests;

pub use edge::{CONGESTION_CLASS_BOUNDS, Edge, EdgeCongestion, congestion_class, congestion_multiplier};
pub use error::{NetworkError, NetworkResult};
pub use network::{RoadGraph, RoadGraphBuilder};
