//! Vertex editor for the outer ring of a drawn or loaded shape.
//!
//! Each vertex gets a drag handle and each edge a midpoint handle. Drags are
//! previewed on a scratch copy of the ring and only committed on release.
//! Hole rings are never edited here.

mod handles;

pub use handles::{Handle, HandleKind, HandleShape};

use crate::config::EngineConfig;
use crate::drawing::{DrawingError, DrawingResult, DrawingSession};
use crate::geo::{self, GeoPoint, Ring};
use crate::projector::Projector;
use crate::snap::SnapResolver;
use kurbo::Point;

const OUTER: usize = 0;

/// An in-progress vertex drag.
#[derive(Debug, Clone)]
struct VertexDrag {
    index: usize,
    /// Outer ring with the dragged vertex replaced.
    preview: Ring,
    /// Session revision when the drag started.
    revision: u64,
}

/// Drag and insert handles for the outer ring.
#[derive(Debug, Clone)]
pub struct VertexEditor {
    /// Resolver for edits, when edit snapping is enabled.
    snapping: Option<SnapResolver>,
    /// Handle hit tolerance in pixels.
    tolerance: f64,
    drag: Option<VertexDrag>,
}

impl Default for VertexEditor {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl VertexEditor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            snapping: config.snap_vertex_edits.then(|| config.resolver()),
            tolerance: config.handle_tolerance_px,
            drag: None,
        }
    }

    /// Check if the session has an outer ring to edit.
    pub fn is_available(session: &DrawingSession) -> bool {
        !session.outer_ring().is_empty()
    }

    /// Check if a vertex is being dragged.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The outer ring as it should be rendered, including any drag preview.
    pub fn display_ring<'a>(&'a self, session: &'a DrawingSession) -> &'a [GeoPoint] {
        match &self.drag {
            Some(drag) => drag.preview.as_slice(),
            None => session.outer_ring(),
        }
    }

    /// Vertex handles followed by midpoint handles for the displayed ring.
    pub fn handles(&self, session: &DrawingSession) -> Vec<Handle> {
        let ring = self.display_ring(session);
        let mut handles: Vec<Handle> = ring
            .iter()
            .enumerate()
            .map(|(i, &p)| Handle::vertex(i, p))
            .collect();
        handles.extend(geo::edges(ring).map(|(i, a, b)| Handle::midpoint(i, a.midpoint(b))));
        handles
    }

    /// Find the handle under a pixel position. Vertex handles win over midpoints.
    pub fn hit_test<P>(&self, session: &DrawingSession, projector: &P, pixel: Point) -> Option<HandleKind>
    where
        P: Projector + ?Sized,
    {
        let handles = self.handles(session);
        let nearest = |vertex: bool| {
            handles
                .iter()
                .filter(|h| matches!(h.kind, HandleKind::Vertex(_)) == vertex)
                .filter(|h| h.hit_test(projector, pixel, self.tolerance))
                .map(|h| (h.kind, h.pixel_distance(projector, pixel)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(kind, _)| kind)
        };
        nearest(true).or_else(|| nearest(false))
    }

    /// Start dragging the vertex at `index`.
    pub fn begin_drag(&mut self, session: &DrawingSession, index: usize) -> DrawingResult<()> {
        let ring = session.outer_ring();
        if index >= ring.len() {
            return Err(DrawingError::IndexOutOfRange {
                ring: OUTER,
                vertex: index,
            });
        }
        log::debug!("Dragging vertex {index}");
        self.drag = Some(VertexDrag {
            index,
            preview: ring.to_vec(),
            revision: session.revision(),
        });
        Ok(())
    }

    /// Move the dragged vertex in the preview. Nothing is committed.
    pub fn drag_to(&mut self, point: GeoPoint) {
        if let Some(drag) = &mut self.drag {
            drag.preview[drag.index] = point;
        }
    }

    /// Commit the drag to the session and return the committed point.
    ///
    /// Returns `Ok(None)` when no drag is active, or when the session changed
    /// since the drag started; the stale drag is discarded in that case.
    pub fn end_drag<P>(&mut self, session: &mut DrawingSession, projector: &P) -> DrawingResult<Option<GeoPoint>>
    where
        P: Projector + ?Sized,
    {
        let Some(drag) = self.drag.take() else {
            return Ok(None);
        };
        if drag.revision != session.revision() {
            log::debug!("Session changed during drag, discarding");
            return Ok(None);
        }

        let point = self.snap_edit(session, drag.preview[drag.index], projector);
        session.update_point(OUTER, drag.index, point)?;
        Ok(Some(point))
    }

    /// Drop the drag preview without committing.
    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Insert a vertex at the middle of edge `edge` and return it.
    ///
    /// Edge `i` runs from vertex `i` to vertex `(i + 1) % len`; the new vertex
    /// lands at position `i + 1`.
    pub fn click_midpoint<P>(&mut self, session: &mut DrawingSession, edge: usize, projector: &P) -> DrawingResult<GeoPoint>
    where
        P: Projector + ?Sized,
    {
        let ring = session.outer_ring();
        let n = ring.len();
        if n < 2 || edge >= n {
            return Err(DrawingError::IndexOutOfRange {
                ring: OUTER,
                vertex: edge,
            });
        }
        let midpoint = ring[edge].midpoint(ring[(edge + 1) % n]);
        let point = self.snap_edit(session, midpoint, projector);

        self.drag = None;
        session.insert_point(OUTER, edge + 1, point)?;
        log::debug!("Inserted vertex at {}", edge + 1);
        Ok(point)
    }

    /// Resolve an edited point against snap targets and hole rings.
    ///
    /// The outer ring itself is not a reference.
    fn snap_edit<P>(&self, session: &DrawingSession, point: GeoPoint, projector: &P) -> GeoPoint
    where
        P: Projector + ?Sized,
    {
        let Some(resolver) = self.snapping else {
            return point;
        };
        let references = session
            .snap_targets()
            .iter()
            .chain(session.rings().iter().skip(1))
            .map(Vec::as_slice);
        resolver.resolve(point, references, projector).point
    }
}
