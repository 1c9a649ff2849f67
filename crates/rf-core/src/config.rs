//! Engine configuration.
//!
//! Typically loaded from a TOML file by the application crate (with the
//! `serde` feature) and passed to the graph loader and traversals.  Every
//! field has a default, so a partial file is enough.

use crate::geo::PROXIMITY_TOLERANCE;
use crate::{CoreError, CoreResult};

// ── NetworkConfig ─────────────────────────────────────────────────────────────

/// How input features are turned into edges.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NetworkConfig {
    /// Feature property holding the edge identifier.  Default: `ROUTEID`.
    pub id_property: String,

    /// Feature property holding the traffic volume (capacity weight).
    /// Default: `AADT` (annual average daily traffic).
    pub volume_property: String,

    /// Optional per-feature lane-count property.  When absent, or when a
    /// feature lacks a numeric value for it, `default_lane_count` applies.
    pub lanes_property: Option<String>,

    /// Lane count assigned to features without their own.  Default: 1.
    pub default_lane_count: u32,

    /// Decimal digits kept when keying junction coordinates.  5 digits is
    /// roughly 1.1 m at the equator.
    pub junction_precision: u32,

    /// Point-on-edge tolerance in degrees.
    pub proximity_tolerance: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            id_property:         "ROUTEID".to_owned(),
            volume_property:     "AADT".to_owned(),
            lanes_property:      None,
            default_lane_count:  1,
            junction_precision:  5,
            proximity_tolerance: PROXIMITY_TOLERANCE,
        }
    }
}

impl NetworkConfig {
    /// Largest precision whose scaled coordinates (±180 · 10^p) still fit an
    /// `i64` with plenty of headroom.
    pub const MAX_JUNCTION_PRECISION: u32 = 12;

    pub fn validate(&self) -> CoreResult<()> {
        if self.junction_precision > Self::MAX_JUNCTION_PRECISION {
            return Err(CoreError::Config(format!(
                "junction_precision {} exceeds maximum {}",
                self.junction_precision,
                Self::MAX_JUNCTION_PRECISION
            )));
        }
        if !self.proximity_tolerance.is_finite() || self.proximity_tolerance < 0.0 {
            return Err(CoreError::Config(format!(
                "proximity_tolerance must be a non-negative number, got {}",
                self.proximity_tolerance
            )));
        }
        Ok(())
    }
}

// ── TraversalLimits ───────────────────────────────────────────────────────────

/// Bounds on the flow distributor and path finder.
///
/// Both traversals enumerate simple paths, which is exponential in the worst
/// case.  When a limit is reached the traversal stops descending, marks its
/// result as truncated, and logs a warning.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TraversalLimits {
    /// Maximum number of edges on a single traversal path (root included).
    pub max_depth: usize,

    /// Maximum number of edge entries over the whole traversal.
    pub max_expansions: usize,
}

impl TraversalLimits {
    pub const UNBOUNDED: TraversalLimits = TraversalLimits {
        max_depth:      usize::MAX,
        max_expansions: usize::MAX,
    };
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_depth:      4_096,
            max_expansions: 1_000_000,
        }
    }
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub network: NetworkConfig,
    pub limits:  TraversalLimits,
}

impl EngineConfig {
    pub fn validate(&self) -> CoreResult<()> {
        self.network.validate()?;
        if self.limits.max_depth == 0 {
            return Err(CoreError::Config("max_depth must be at least 1".to_owned()));
        }
        Ok(())
    }
}
