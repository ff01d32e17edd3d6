//! Snap functionality for aligning new points to existing geometry.
//!
//! Distances are measured in screen pixels through a [`Projector`], so the
//! threshold feels the same at every zoom level. Snapped points reuse the
//! exact coordinates of the geometry they snap to, which lets neighbouring
//! shapes share vertices and edges.

use crate::geo::{self, GeoPoint};
use crate::projector::Projector;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Default snap distance in screen pixels.
pub const DEFAULT_SNAP_THRESHOLD_PX: f64 = 12.0;

/// How the vertex pass picks between several vertices within the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapPolicy {
    /// Take the first vertex found in ring order.
    FirstMatch,
    /// Take the closest vertex.
    #[default]
    Nearest,
}

/// What a point was snapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapKind {
    /// Not snapped.
    None,
    /// An existing vertex, reused verbatim.
    Vertex,
    /// The nearest point on an existing edge.
    Edge,
}

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The resolved point.
    pub point: GeoPoint,
    /// What the point was snapped to.
    pub kind: SnapKind,
    /// Pixel distance between the candidate and the resolved point.
    pub distance_px: f64,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: GeoPoint) -> Self {
        Self {
            point,
            kind: SnapKind::None,
            distance_px: 0.0,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.kind != SnapKind::None
    }
}

/// Resolves candidate points against reference rings.
///
/// Holds no state besides its settings; every call is a pure function of its
/// inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResolver {
    /// Maximum snap distance in pixels.
    pub threshold_px: f64,
    /// Vertex selection policy.
    pub policy: SnapPolicy,
}

impl Default for SnapResolver {
    fn default() -> Self {
        Self {
            threshold_px: DEFAULT_SNAP_THRESHOLD_PX,
            policy: SnapPolicy::default(),
        }
    }
}

impl SnapResolver {
    pub fn new(threshold_px: f64, policy: SnapPolicy) -> Self {
        Self { threshold_px, policy }
    }

    /// Snap `candidate` to the reference rings.
    ///
    /// Vertices win over edges. Each ring is treated as closed for the edge
    /// pass, even though authored rings are stored open.
    pub fn resolve<'a, P>(
        &self,
        candidate: GeoPoint,
        rings: impl IntoIterator<Item = &'a [GeoPoint]>,
        projector: &P,
    ) -> SnapResult
    where
        P: Projector + ?Sized,
    {
        let rings: Vec<&[GeoPoint]> = rings.into_iter().collect();
        let pixel = projector.project(candidate);

        let result = snap_to_vertex(pixel, &rings, projector, self.threshold_px, self.policy)
            .or_else(|| snap_to_edge(candidate, pixel, &rings, projector, self.threshold_px))
            .unwrap_or_else(|| SnapResult::none(candidate));

        log::trace!(
            "Snap {:?} -> {:?} ({:?}, {:.2}px)",
            candidate,
            result.point,
            result.kind,
            result.distance_px
        );
        result
    }

    /// Check whether two points are within the snap threshold of each other.
    pub fn within_threshold<P>(&self, a: GeoPoint, b: GeoPoint, projector: &P) -> bool
    where
        P: Projector + ?Sized,
    {
        projector.pixel_distance(a, b) <= self.threshold_px
    }
}

/// Snap to an existing vertex within `threshold` pixels of `pixel`.
pub fn snap_to_vertex<P>(
    pixel: Point,
    rings: &[&[GeoPoint]],
    projector: &P,
    threshold: f64,
    policy: SnapPolicy,
) -> Option<SnapResult>
where
    P: Projector + ?Sized,
{
    let mut best: Option<SnapResult> = None;

    for vertex in rings.iter().flat_map(|ring| ring.iter().copied()) {
        let dist = projector.project(vertex).distance(pixel);
        if dist > threshold {
            continue;
        }
        let hit = SnapResult {
            point: vertex,
            kind: SnapKind::Vertex,
            distance_px: dist,
        };
        match policy {
            SnapPolicy::FirstMatch => return Some(hit),
            SnapPolicy::Nearest => {
                if best.is_none_or(|b| dist < b.distance_px) {
                    best = Some(hit);
                }
            }
        }
    }

    best
}

/// Snap to the nearest point on any ring edge closer than `threshold` pixels.
///
/// The nearest point is found with a clamped projection in coordinate space,
/// then measured in pixel space.
pub fn snap_to_edge<P>(
    candidate: GeoPoint,
    pixel: Point,
    rings: &[&[GeoPoint]],
    projector: &P,
    threshold: f64,
) -> Option<SnapResult>
where
    P: Projector + ?Sized,
{
    let mut best: Option<SnapResult> = None;
    let mut best_dist = threshold;

    for ring in rings {
        for (_, a, b) in geo::edges(ring) {
            let on_edge = geo::nearest_on_segment(candidate, a, b);
            let dist = projector.project(on_edge).distance(pixel);
            if dist < best_dist {
                best_dist = dist;
                best = Some(SnapResult {
                    point: on_edge,
                    kind: SnapKind::Edge,
                    distance_px: dist,
                });
            }
        }
    }

    best
}
