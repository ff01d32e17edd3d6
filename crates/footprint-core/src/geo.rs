//! Geographic points and rings.

use serde::{Deserialize, Serialize};

/// A geographic coordinate pair in degrees.
///
/// Serialized as a `[lon, lat]` pair, the way map surfaces and GeoJSON
/// exchange coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl GeoPoint {
    /// Create a new point from longitude and latitude.
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Midpoint between two points (plain coordinate average).
    pub fn midpoint(self, other: GeoPoint) -> GeoPoint {
        GeoPoint::new((self.lon + other.lon) / 2.0, (self.lat + other.lat) / 2.0)
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.lon, point.lat]
    }
}

/// An ordered sequence of points. Rings are stored open while authored.
pub type Ring = Vec<GeoPoint>;

/// Minimum number of points a ring needs before it can be persisted.
pub const MIN_RING_POINTS: usize = 3;

/// Check whether a ring has enough points to be persisted.
pub fn is_persistable(ring: &[GeoPoint]) -> bool {
    ring.len() >= MIN_RING_POINTS
}

/// Remove the duplicated closing vertex from a persisted ring.
///
/// Rings that are not explicitly closed are returned unchanged.
pub fn strip_closing_vertex(mut ring: Ring) -> Ring {
    if ring.len() >= 2 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Return a copy of an open ring with its first point repeated at the end.
pub fn closed(ring: &[GeoPoint]) -> Ring {
    let mut out = ring.to_vec();
    if let Some(&first) = ring.first() {
        if ring.last() != Some(&first) || ring.len() == 1 {
            out.push(first);
        }
    }
    out
}

/// Iterate over the edges of a ring, including the wrap-around edge from the
/// last point back to the first.
///
/// Yields `(index, start, end)` where `index` is the position of `start`.
/// Rings with fewer than two points have no edges.
pub fn edges(ring: &[GeoPoint]) -> impl Iterator<Item = (usize, GeoPoint, GeoPoint)> + '_ {
    let n = ring.len();
    let count = if n < 2 { 0 } else { n };
    (0..count).map(move |i| (i, ring[i], ring[(i + 1) % n]))
}

/// Nearest point to `p` on segment `a..b`, computed in coordinate space.
///
/// The segment parameter is clamped to `[0, 1]` so the result never leaves
/// the segment. Degenerate segments return `a`.
pub fn nearest_on_segment(p: GeoPoint, a: GeoPoint, b: GeoPoint) -> GeoPoint {
    let dx = b.lon - a.lon;
    let dy = b.lat - a.lat;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a;
    }
    let t = (((p.lon - a.lon) * dx + (p.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0);
    GeoPoint::new(a.lon + t * dx, a.lat + t * dy)
}
