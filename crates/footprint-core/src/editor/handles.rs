//! Handle definitions for outer-ring editing.

use crate::geo::GeoPoint;
use crate::projector::Projector;
use kurbo::Point;

/// The kind of handle - determines what manipulation it performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Drag handle for the vertex at this index.
    Vertex(usize),
    /// Insert handle at the middle of the edge starting at this index.
    Midpoint(usize),
}

/// Visual shape of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleShape {
    /// Filled circle for vertices.
    #[default]
    Circle,
    /// Small hollow circle for edge midpoints.
    Ring,
}

/// A manipulation handle on the outer ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// The kind of handle (determines behavior).
    pub kind: HandleKind,
    /// Position in geographic coordinates.
    pub position: GeoPoint,
    /// Visual shape of the handle.
    pub shape: HandleShape,
    /// Whether the handle can be dragged. Midpoint handles are click-only.
    pub draggable: bool,
}

impl Handle {
    /// Create a vertex drag handle.
    pub fn vertex(index: usize, position: GeoPoint) -> Self {
        Self {
            kind: HandleKind::Vertex(index),
            position,
            shape: HandleShape::Circle,
            draggable: true,
        }
    }

    /// Create an edge midpoint handle.
    pub fn midpoint(edge: usize, position: GeoPoint) -> Self {
        Self {
            kind: HandleKind::Midpoint(edge),
            position,
            shape: HandleShape::Ring,
            draggable: false,
        }
    }

    /// Pixel distance from `pixel` to this handle.
    pub fn pixel_distance<P>(&self, projector: &P, pixel: Point) -> f64
    where
        P: Projector + ?Sized,
    {
        projector.project(self.position).distance(pixel)
    }

    /// Check if a pixel position hits this handle.
    pub fn hit_test<P>(&self, projector: &P, pixel: Point, tolerance: f64) -> bool
    where
        P: Projector + ?Sized,
    {
        self.pixel_distance(projector, pixel) <= tolerance
    }
}
