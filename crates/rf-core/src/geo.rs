//! Geographic coordinate type and distance utilities.
//!
//! All coordinates are `(longitude, latitude)` pairs in decimal degrees, in
//! that order everywhere.  Geodesic results are in **kilometres**.
//!
//! Two distance notions coexist:
//!
//! - [`geodesic_distance`] / [`polyline_length`]: haversine great-circle
//!   distance on a sphere of radius 6371 km.  Used for edge lengths.
//! - [`point_to_segment_distance`]: planar distance measured directly in
//!   degrees.  Used for point-on-edge proximity tests.  The tolerance is in
//!   degrees too, so its ground accuracy varies with latitude.

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Default point-on-segment tolerance, in degrees.
pub const PROXIMITY_TOLERANCE: f64 = 0.0001;

/// A WGS-84 coordinate stored as `(lon, lat)` double-precision degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Haversine great-circle distance to `other` in kilometres.
    #[inline]
    pub fn distance_km(self, other: GeoPoint) -> f64 {
        geodesic_distance(self, other)
    }

    /// `[lon, lat]` array form, as used by the R-tree index.
    #[inline]
    pub fn to_array(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

/// Haversine great-circle distance in kilometres.
///
/// Symmetric, and exactly zero when `a == b`.
pub fn geodesic_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Sum of [`geodesic_distance`] over consecutive point pairs.
///
/// Returns `0.0` for fewer than two points.
pub fn polyline_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| geodesic_distance(w[0], w[1]))
        .sum()
}

/// Result of projecting a point onto a segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SegmentProjection {
    /// Planar distance (degrees) from the point to its projection.
    pub distance: f64,
    /// Projection parameter along the segment, clamped to `[0, 1]`.
    pub param: f64,
    /// `distance` is below the proximity tolerance.
    pub on_segment: bool,
}

/// Project `point` onto `start → end` using [`PROXIMITY_TOLERANCE`].
pub fn point_to_segment_distance(point: GeoPoint, start: GeoPoint, end: GeoPoint) -> SegmentProjection {
    point_to_segment_distance_within(point, start, end, PROXIMITY_TOLERANCE)
}

/// Project `point` onto `start → end`, treating it as on the segment when the
/// projected distance is strictly below `tolerance`.
///
/// A zero-length segment degenerates to the distance to `start`.
pub fn point_to_segment_distance_within(
    point:     GeoPoint,
    start:     GeoPoint,
    end:       GeoPoint,
    tolerance: f64,
) -> SegmentProjection {
    let dx = end.lon - start.lon;
    let dy = end.lat - start.lat;
    let len_2 = dx * dx + dy * dy;

    let param = if len_2 == 0.0 {
        0.0
    } else {
        (((point.lon - start.lon) * dx + (point.lat - start.lat) * dy) / len_2).clamp(0.0, 1.0)
    };

    let proj_lon = start.lon + param * dx;
    let proj_lat = start.lat + param * dy;
    let distance = ((point.lon - proj_lon).powi(2) + (point.lat - proj_lat).powi(2)).sqrt();

    SegmentProjection {
        distance,
        param,
        on_segment: distance < tolerance,
    }
}
