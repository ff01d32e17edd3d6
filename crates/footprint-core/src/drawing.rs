//! Drawing session state machine.
//!
//! A [`DrawingSession`] owns the rings being authored, the shape metadata and
//! the snap targets supplied by the caller. Renderers, the vertex editor and
//! the interaction controller all read from the same session; only the
//! transition methods below mutate it.

use crate::geo::{self, GeoPoint, Ring};
use crate::shape::{FootprintSubmission, ShapeKind, TargetId};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Drawing session errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawingError {
    #[error("Vertex {vertex} is out of range for ring {ring}")]
    IndexOutOfRange { ring: usize, vertex: usize },
    #[error("Shape has no building or room metadata")]
    MissingMetadata,
    #[error("Outer ring needs at least {min} points", min = geo::MIN_RING_POINTS)]
    OuterRingTooShort,
}

/// Result type for drawing operations.
pub type DrawingResult<T> = Result<T, DrawingError>;

/// Input mode of a drawing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingMode {
    /// No shape is being authored.
    #[default]
    Idle,
    /// Pointer and keyboard input add points to the shape.
    Drawing,
    /// The shape is finished and waiting for the caller to save it.
    /// Ring data is kept, input is no longer handled.
    ReadyToSave,
}

/// Resources tied to one stay in drawing mode.
///
/// The release callback runs when the scope is dropped. A session drops its
/// scope on every transition out of [`DrawingMode::Drawing`] and when the
/// session itself goes away.
pub struct DrawingScope {
    release: Option<Box<dyn FnOnce()>>,
}

impl DrawingScope {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for DrawingScope {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for DrawingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawingScope")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// Transient authoring state for one shape.
#[derive(Debug)]
pub struct DrawingSession {
    /// Identity of this session, regenerated whenever the rings are replaced.
    id: Uuid,
    mode: DrawingMode,
    /// Outer ring followed by holes. Never empty.
    rings: Vec<Ring>,
    kind: Option<ShapeKind>,
    editing_target: Option<TargetId>,
    /// Reference geometry used only for snapping.
    snap_targets: Vec<Ring>,
    /// Bumped by every ring mutation.
    revision: u64,
    /// Released on leaving drawing mode.
    scope: Option<DrawingScope>,
}

impl Default for DrawingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingSession {
    /// Create an idle session with a single empty ring.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: DrawingMode::Idle,
            rings: vec![Ring::new()],
            kind: None,
            editing_target: None,
            snap_targets: Vec::new(),
            revision: 0,
            scope: None,
        }
    }

    /// Start authoring a new shape.
    ///
    /// Snap targets supplied before this call are kept.
    pub fn start_drawing(&mut self, kind: ShapeKind) {
        log::debug!("Start drawing {:?}", kind);
        self.renew();
        self.kind = Some(kind);
        self.editing_target = None;
        self.mode = DrawingMode::Drawing;
    }

    /// Load existing rings for editing and enter drawing mode.
    ///
    /// Rings are taken verbatim; closing vertices must already be stripped.
    pub fn set_rings(&mut self, rings: Vec<Ring>) {
        log::debug!("Loading {} ring(s) for editing", rings.len());
        self.id = Uuid::new_v4();
        self.rings = if rings.is_empty() { vec![Ring::new()] } else { rings };
        self.revision += 1;
        self.mode = DrawingMode::Drawing;
    }

    /// Load a persisted shape for editing.
    ///
    /// Persisted rings are closed; the closing vertex of each ring is removed
    /// before loading.
    pub fn begin_edit(&mut self, target: TargetId, kind: ShapeKind, persisted: Vec<Ring>) {
        log::debug!("Editing {} ({})", target, kind.name());
        let rings = persisted.into_iter().map(geo::strip_closing_vertex).collect();
        self.set_rings(rings);
        self.kind = Some(kind);
        self.editing_target = Some(target);
    }

    /// Append a point to the ring currently being authored.
    pub fn add_point(&mut self, point: GeoPoint) {
        if self.mode != DrawingMode::Drawing {
            log::debug!("Ignoring point outside drawing mode");
            return;
        }
        self.current_ring_mut().push(point);
        self.revision += 1;
    }

    /// Remove the last authored point.
    ///
    /// When the current ring is an empty hole, the hole is dropped and the
    /// previous ring becomes current again.
    pub fn remove_last_point(&mut self) -> Option<GeoPoint> {
        if self.mode != DrawingMode::Drawing {
            return None;
        }
        if self.rings.len() > 1 && self.current_ring().is_empty() {
            self.rings.pop();
        }
        let removed = self.current_ring_mut().pop();
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// Close the current ring and begin authoring a hole.
    ///
    /// Does nothing while the current ring is still empty, so repeated
    /// closing gestures never stack empty holes.
    pub fn complete_ring(&mut self) {
        if self.mode != DrawingMode::Drawing {
            return;
        }
        if self.current_ring().is_empty() {
            log::debug!("Current ring is empty, not starting another");
            return;
        }
        self.rings.push(Ring::new());
        self.revision += 1;
        log::debug!("Ring completed, {} ring(s) now", self.rings.len());
    }

    /// Stop accepting input. Rings and metadata stay available for saving.
    pub fn complete_shape(&mut self) {
        if self.mode == DrawingMode::Drawing {
            log::debug!("Shape completed with {} ring(s)", self.rings.len());
            self.mode = DrawingMode::ReadyToSave;
            self.scope = None;
        }
    }

    /// Replace one vertex in place.
    pub fn update_point(&mut self, ring: usize, vertex: usize, point: GeoPoint) -> DrawingResult<()> {
        let slot = self
            .rings
            .get_mut(ring)
            .and_then(|r| r.get_mut(vertex))
            .ok_or_else(|| out_of_range(ring, vertex))?;
        *slot = point;
        self.revision += 1;
        Ok(())
    }

    /// Insert a vertex before position `vertex`. `vertex` may equal the ring length.
    pub fn insert_point(&mut self, ring: usize, vertex: usize, point: GeoPoint) -> DrawingResult<()> {
        let target = self
            .rings
            .get_mut(ring)
            .filter(|r| vertex <= r.len())
            .ok_or_else(|| out_of_range(ring, vertex))?;
        target.insert(vertex, point);
        self.revision += 1;
        Ok(())
    }

    /// Clear everything and return to idle.
    pub fn exit_drawing(&mut self) {
        log::debug!("Exit drawing");
        self.clear();
        self.mode = DrawingMode::Idle;
        self.scope = None;
    }

    /// Clear everything but stay in drawing mode.
    pub fn reset_drawing(&mut self) {
        log::debug!("Reset drawing");
        self.clear();
        self.mode = DrawingMode::Drawing;
    }

    /// Replace the reference geometry used for snapping.
    pub fn set_snap_targets(&mut self, targets: Vec<Ring>) {
        self.snap_targets = targets;
    }

    /// Tie `scope` to the current stay in drawing mode.
    ///
    /// Replaces (and releases) any previously bound scope. Outside drawing
    /// mode the scope is released immediately.
    pub fn bind_scope(&mut self, scope: DrawingScope) {
        if self.is_drawing() {
            self.scope = Some(scope);
        } else {
            drop(scope);
        }
    }

    /// Check if a scope is bound to this stay in drawing mode.
    pub fn has_scope(&self) -> bool {
        self.scope.is_some()
    }

    /// Snapshot the session into a persistence payload.
    pub fn submission(&self) -> DrawingResult<FootprintSubmission> {
        FootprintSubmission::from_session(self)
    }

    /// Whether a submission still reflects this session's current rings.
    pub fn is_current(&self, submission: &FootprintSubmission) -> bool {
        submission.session_id == self.id && submission.revision == self.revision
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> DrawingMode {
        self.mode
    }

    /// Check if the session accepts pointer and keyboard input.
    pub fn is_drawing(&self) -> bool {
        self.mode == DrawingMode::Drawing
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// All rings, outer boundary first.
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// The outer boundary ring.
    pub fn outer_ring(&self) -> &[GeoPoint] {
        &self.rings[0]
    }

    /// The ring new points are appended to.
    pub fn current_ring(&self) -> &[GeoPoint] {
        self.rings.last().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn kind(&self) -> Option<&ShapeKind> {
        self.kind.as_ref()
    }

    pub fn editing_target(&self) -> Option<&TargetId> {
        self.editing_target.as_ref()
    }

    pub fn snap_targets(&self) -> &[Ring] {
        &self.snap_targets
    }

    /// Check if any ring has at least one point.
    pub fn has_points(&self) -> bool {
        self.rings.iter().any(|r| !r.is_empty())
    }

    /// Every ring to snap against: the session's own rings, then snap targets.
    pub fn reference_rings(&self) -> impl Iterator<Item = &[GeoPoint]> {
        self.rings
            .iter()
            .chain(self.snap_targets.iter())
            .map(Vec::as_slice)
    }

    fn current_ring_mut(&mut self) -> &mut Ring {
        if self.rings.is_empty() {
            self.rings.push(Ring::new());
        }
        let last = self.rings.len() - 1;
        &mut self.rings[last]
    }

    fn renew(&mut self) {
        self.id = Uuid::new_v4();
        self.rings = vec![Ring::new()];
        self.revision += 1;
    }

    fn clear(&mut self) {
        self.renew();
        self.kind = None;
        self.editing_target = None;
        self.snap_targets.clear();
    }
}

fn out_of_range(ring: usize, vertex: usize) -> DrawingError {
    log::warn!("Rejected edit at ring {ring}, vertex {vertex}: out of range");
    DrawingError::IndexOutOfRange { ring, vertex }
}
