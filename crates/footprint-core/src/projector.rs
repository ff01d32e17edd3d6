//! Projection between geographic coordinates and screen pixels.

use crate::geo::GeoPoint;
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Converts between geographic coordinates and screen pixels.
///
/// Supplied by the hosting map surface. All snapping distances are measured
/// in pixel space, so the same threshold behaves the same at every zoom level.
pub trait Projector {
    /// Convert a geographic point to screen pixels.
    fn project(&self, point: GeoPoint) -> Point;

    /// Convert a screen pixel position to a geographic point.
    fn unproject(&self, pixel: Point) -> GeoPoint;

    /// Whether the surface has finished loading and projections are valid.
    fn is_ready(&self) -> bool {
        true
    }

    /// Pixel distance between two geographic points.
    fn pixel_distance(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        self.project(a).distance(self.project(b))
    }
}

/// Size of one map tile in pixels at zoom level 0.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web-Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Web-Mercator view with pan and zoom.
///
/// Geographic points are first mapped to normalized Mercator coordinates in
/// `[0, 1]`, then scaled by `TILE_SIZE * 2^zoom` and translated by `offset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MercatorView {
    /// Current translation offset (pan) in pixels.
    pub offset: Vec2,
    /// Current map zoom level.
    pub zoom: f64,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
    /// Whether style and tiles are loaded.
    pub ready: bool,
}

impl Default for MercatorView {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 0.0,
            min_zoom: 0.0,
            max_zoom: 22.0,
            ready: true,
        }
    }
}

impl MercatorView {
    /// Create a new view at zoom 0 with no pan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a view centered on `center` at `zoom` for a viewport of `viewport` pixels.
    pub fn centered_on(center: GeoPoint, zoom: f64, viewport: Size) -> Self {
        let mut view = Self {
            zoom,
            ..Self::default()
        };
        view.zoom = view.zoom.clamp(view.min_zoom, view.max_zoom);
        view.center_on(center, viewport);
        view
    }

    /// Pixels spanned by the whole world at the current zoom.
    pub fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    /// Get the affine transform from normalized Mercator space to pixels.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.world_size())
    }

    /// Get the inverse transform from pixels to normalized Mercator space.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.world_size()) * Affine::translate(-self.offset)
    }

    /// Pan the view by a delta in screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `delta` levels, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, delta: f64) {
        let new_zoom = (self.zoom + delta).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let anchor = self.inverse_transform() * screen_point;
        self.zoom = new_zoom;

        let moved = self.transform() * anchor;
        self.offset += Vec2::new(screen_point.x - moved.x, screen_point.y - moved.y);
    }

    /// Pan so that `center` sits in the middle of the viewport.
    pub fn center_on(&mut self, center: GeoPoint, viewport: Size) {
        let world = to_mercator(center);
        let scale = self.world_size();
        self.offset = Vec2::new(
            viewport.width / 2.0 - world.x * scale,
            viewport.height / 2.0 - world.y * scale,
        );
    }

    /// Fit the view to show every point of the given rings.
    pub fn fit_to_rings<'a>(
        &mut self,
        rings: impl IntoIterator<Item = &'a [GeoPoint]>,
        viewport: Size,
        padding: f64,
    ) {
        let mut bounds: Option<kurbo::Rect> = None;
        for point in rings.into_iter().flatten() {
            let p = to_mercator(*point);
            bounds = Some(match bounds {
                Some(b) => b.union_pt(p),
                None => kurbo::Rect::from_points(p, p),
            });
        }
        let Some(bounds) = bounds else {
            return;
        };

        if bounds.is_zero_area() {
            self.center_on(from_mercator(bounds.center()), viewport);
            return;
        }

        let padded = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale = (padded.width / bounds.width()).min(padded.height / bounds.height());
        self.zoom = (scale / TILE_SIZE).log2().clamp(self.min_zoom, self.max_zoom);
        self.center_on(from_mercator(bounds.center()), viewport);
    }
}

impl Projector for MercatorView {
    fn project(&self, point: GeoPoint) -> Point {
        self.transform() * to_mercator(point)
    }

    fn unproject(&self, pixel: Point) -> GeoPoint {
        from_mercator(self.inverse_transform() * pixel)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Map a geographic point to normalized Mercator coordinates.
fn to_mercator(point: GeoPoint) -> Point {
    let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (point.lon + 180.0) / 360.0;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    Point::new(x, y)
}

/// Map normalized Mercator coordinates back to a geographic point.
fn from_mercator(world: Point) -> GeoPoint {
    let lon = world.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * world.y)).sinh().atan().to_degrees();
    GeoPoint::new(lon, lat)
}
