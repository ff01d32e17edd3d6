//! Interaction controller: turns map-surface input into drawing transitions.
//!
//! The controller listens to the surface only while the session is in
//! drawing mode and the surface reports ready. Listener registrations live in
//! an `Attachment` guard that is shared with the session through a
//! [`DrawingScope`], so every exit path (mode change, surface swap, surface
//! losing readiness, controller or session drop) releases them.

use crate::config::EngineConfig;
use crate::drawing::{DrawingScope, DrawingSession};
use crate::geo::GeoPoint;
use crate::input::{InputKind, KeyEvent, PointerEvent};
use crate::projector::Projector;
use crate::snap::{SnapResolver, SnapResult};
use std::cell::RefCell;
use std::rc::Rc;

/// Handle for one registered listener on a map surface.
pub type ListenerId = u64;

/// Identity of a map surface instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// The hosting map surface.
///
/// Methods take `&self`; surfaces wrap a host object that manages its own
/// listener table.
pub trait MapSurface: Projector {
    /// Identity of this surface instance.
    fn surface_id(&self) -> SurfaceId;

    /// Register a listener for one kind of input.
    fn subscribe(&self, kind: InputKind) -> ListenerId;

    /// Remove a previously registered listener.
    fn unsubscribe(&self, listener: ListenerId);

    /// Show or move the cursor preview marker.
    fn show_preview(&self, snap: &SnapResult);

    /// Remove the cursor preview marker.
    fn clear_preview(&self);
}

/// Listener registrations on one surface, released on drop.
struct Attachment<S: MapSurface> {
    surface: Rc<S>,
    listeners: Vec<ListenerId>,
}

impl<S: MapSurface> Attachment<S> {
    fn acquire(surface: Rc<S>) -> Self {
        let listeners = InputKind::ALL
            .iter()
            .map(|&kind| surface.subscribe(kind))
            .collect();
        log::debug!("Attached to surface {:?}", surface.surface_id());
        Self { surface, listeners }
    }
}

impl<S: MapSurface> Drop for Attachment<S> {
    fn drop(&mut self) {
        for listener in self.listeners.drain(..) {
            self.surface.unsubscribe(listener);
        }
        self.surface.clear_preview();
        log::debug!("Detached from surface {:?}", self.surface.surface_id());
    }
}

/// Attachment slot shared between the controller and the session's scope.
type SharedAttachment<S> = Rc<RefCell<Option<Attachment<S>>>>;

fn release<S: MapSurface>(slot: &SharedAttachment<S>) {
    let attachment = slot.borrow_mut().take();
    drop(attachment);
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerOutcome {
    /// The controller is not listening.
    Ignored,
    /// The cursor preview moved.
    PreviewMoved(SnapResult),
    /// A point was appended to the current ring.
    PointAdded(SnapResult),
    /// The current ring was closed and a hole started.
    RingClosed,
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyOutcome {
    Ignored,
    /// The shape is complete and ready to be saved.
    Finished,
    /// The session was abandoned.
    Cancelled,
    /// The last point was removed.
    PointRemoved(Option<GeoPoint>),
}

/// Drives a [`DrawingSession`] from map-surface input.
pub struct InteractionController<S: MapSurface + 'static> {
    config: EngineConfig,
    resolver: SnapResolver,
    surface: Option<Rc<S>>,
    attachment: Option<SharedAttachment<S>>,
    preview: Option<SnapResult>,
}

impl<S: MapSurface + 'static> InteractionController<S> {
    pub fn new(config: EngineConfig) -> Self {
        let resolver = config.resolver();
        Self {
            config,
            resolver,
            surface: None,
            attachment: None,
            preview: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the map surface. Listeners on a different previous surface
    /// are released before attaching to the new one.
    pub fn set_surface(&mut self, surface: Option<Rc<S>>, session: &mut DrawingSession) {
        let old = self.surface.as_ref().map(|s| s.surface_id());
        let new = surface.as_ref().map(|s| s.surface_id());
        if old != new {
            self.detach();
        }
        self.surface = surface;
        self.sync(session);
    }

    /// Attach when the session enters drawing mode on a ready surface.
    ///
    /// Leaving drawing mode needs no call here: the session releases the
    /// listeners itself. Events arriving while the surface is not ready
    /// detach as well.
    pub fn sync(&mut self, session: &mut DrawingSession) {
        let ready = self.surface.as_ref().is_some_and(|s| s.is_ready());
        if !(session.is_drawing() && ready) {
            self.detach();
            return;
        }
        if self.is_attached() && session.has_scope() {
            return;
        }
        self.detach();

        let Some(surface) = &self.surface else {
            return;
        };
        let attachment = Attachment::acquire(Rc::clone(surface));
        let slot: SharedAttachment<S> = Rc::new(RefCell::new(Some(attachment)));
        let scoped = Rc::clone(&slot);
        session.bind_scope(DrawingScope::new(move || release(&scoped)));
        self.attachment = Some(slot);
    }

    /// Release all listeners and the preview marker.
    pub fn detach(&mut self) {
        self.preview = None;
        if let Some(slot) = self.attachment.take() {
            release(&slot);
        }
    }

    /// Check if the controller is currently listening.
    pub fn is_attached(&self) -> bool {
        self.attachment
            .as_ref()
            .is_some_and(|slot| slot.borrow().is_some())
    }

    /// Current cursor preview, if any.
    pub fn preview(&self) -> Option<SnapResult> {
        self.preview.filter(|_| self.is_attached())
    }

    /// Handle a pointer event from the surface.
    pub fn handle_pointer(
        &mut self,
        session: &mut DrawingSession,
        event: PointerEvent,
    ) -> PointerOutcome {
        let Some(surface) = self.listening_surface(session) else {
            return PointerOutcome::Ignored;
        };

        let candidate = surface.unproject(event.position());
        let snap = self
            .resolver
            .resolve(candidate, session.reference_rings(), &*surface);

        match event {
            PointerEvent::Move { .. } => {
                surface.show_preview(&snap);
                self.preview = Some(snap);
                PointerOutcome::PreviewMoved(snap)
            }
            PointerEvent::Click { modifiers, .. } => {
                let ring = session.current_ring();
                let closes = ring.len() >= 3
                    && modifiers.is_held(self.config.closing_modifier)
                    && self
                        .resolver
                        .within_threshold(snap.point, ring[0], &*surface);

                if closes {
                    session.complete_ring();
                    PointerOutcome::RingClosed
                } else {
                    session.add_point(snap.point);
                    PointerOutcome::PointAdded(snap)
                }
            }
        }
    }

    /// Handle a key event from the surface.
    pub fn handle_key(&mut self, session: &mut DrawingSession, event: &KeyEvent) -> KeyOutcome {
        if self.listening_surface(session).is_none() {
            return KeyOutcome::Ignored;
        }
        let KeyEvent::Pressed(key) = event else {
            return KeyOutcome::Ignored;
        };

        if *key == self.config.finish_key {
            session.complete_shape();
            self.sync(session);
            KeyOutcome::Finished
        } else if *key == self.config.cancel_key {
            session.exit_drawing();
            self.sync(session);
            KeyOutcome::Cancelled
        } else if *key == self.config.undo_key {
            KeyOutcome::PointRemoved(session.remove_last_point())
        } else {
            KeyOutcome::Ignored
        }
    }

    /// The attached surface, if events should be handled. Detaches when the
    /// session left drawing mode or the surface stopped being ready.
    fn listening_surface(&mut self, session: &DrawingSession) -> Option<Rc<S>> {
        let attached = self.attachment.as_ref().and_then(|slot| {
            slot.borrow()
                .as_ref()
                .map(|attachment| Rc::clone(&attachment.surface))
        });
        let live = attached.filter(|surface| session.is_drawing() && surface.is_ready());
        if live.is_none() {
            self.detach();
        }
        live
    }
}

impl<S: MapSurface + 'static> Drop for InteractionController<S> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ModifierKey, Modifiers};
    use crate::projector::MercatorView;
    use crate::shape::ShapeKind;
    use crate::snap::SnapKind;
    use kurbo::{Point, Size};
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;

    struct FakeSurface {
        id: u64,
        view: MercatorView,
        ready: Cell<bool>,
        next_listener: Cell<ListenerId>,
        listeners: RefCell<HashSet<ListenerId>>,
        preview: RefCell<Option<SnapResult>>,
    }

    impl FakeSurface {
        fn new(id: u64) -> Rc<Self> {
            Rc::new(Self {
                id,
                view: MercatorView::centered_on(GeoPoint::new(5.0, 5.0), 4.0, Size::new(800.0, 600.0)),
                ready: Cell::new(true),
                next_listener: Cell::new(1),
                listeners: RefCell::new(HashSet::new()),
                preview: RefCell::new(None),
            })
        }

        fn listener_count(&self) -> usize {
            self.listeners.borrow().len()
        }

        fn pixel(&self, lon: f64, lat: f64) -> Point {
            self.view.project(GeoPoint::new(lon, lat))
        }
    }

    impl Projector for FakeSurface {
        fn project(&self, point: GeoPoint) -> Point {
            self.view.project(point)
        }

        fn unproject(&self, pixel: Point) -> GeoPoint {
            self.view.unproject(pixel)
        }

        fn is_ready(&self) -> bool {
            self.ready.get()
        }
    }

    impl MapSurface for FakeSurface {
        fn surface_id(&self) -> SurfaceId {
            SurfaceId(self.id)
        }

        fn subscribe(&self, _kind: InputKind) -> ListenerId {
            let id = self.next_listener.get();
            self.next_listener.set(id + 1);
            self.listeners.borrow_mut().insert(id);
            id
        }

        fn unsubscribe(&self, listener: ListenerId) {
            self.listeners.borrow_mut().remove(&listener);
        }

        fn show_preview(&self, snap: &SnapResult) {
            *self.preview.borrow_mut() = Some(*snap);
        }

        fn clear_preview(&self) {
            *self.preview.borrow_mut() = None;
        }
    }

    fn setup() -> (Rc<FakeSurface>, InteractionController<FakeSurface>, DrawingSession) {
        let surface = FakeSurface::new(1);
        let mut session = DrawingSession::new();
        session.start_drawing(ShapeKind::building("Library"));
        let mut controller = InteractionController::new(EngineConfig::default());
        controller.set_surface(Some(Rc::clone(&surface)), &mut session);
        (surface, controller, session)
    }

    fn shift_click(position: Point) -> PointerEvent {
        PointerEvent::Click {
            position,
            modifiers: Modifiers::only(ModifierKey::Shift),
        }
    }

    fn draw_square(surface: &FakeSurface, controller: &mut InteractionController<FakeSurface>, session: &mut DrawingSession) {
        for (lon, lat) in [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)] {
            let outcome = controller.handle_pointer(session, PointerEvent::click(surface.pixel(lon, lat)));
            assert!(matches!(outcome, PointerOutcome::PointAdded(_)));
        }
    }

    #[test]
    fn test_attaches_while_drawing() {
        let (surface, controller, _session) = setup();
        assert!(controller.is_attached());
        assert_eq!(surface.listener_count(), 3);
    }

    #[test]
    fn test_does_not_attach_until_ready() {
        let surface = FakeSurface::new(1);
        surface.ready.set(false);
        let mut session = DrawingSession::new();
        session.start_drawing(ShapeKind::building("Library"));
        let mut controller = InteractionController::new(EngineConfig::default());
        controller.set_surface(Some(Rc::clone(&surface)), &mut session);

        assert!(!controller.is_attached());
        assert_eq!(surface.listener_count(), 0);
        let outcome = controller.handle_pointer(&mut session, PointerEvent::click(Point::new(1.0, 1.0)));
        assert_eq!(outcome, PointerOutcome::Ignored);
        assert!(!session.has_points());

        surface.ready.set(true);
        controller.sync(&mut session);
        assert!(controller.is_attached());
    }

    #[test]
    fn test_does_not_attach_when_idle() {
        let surface = FakeSurface::new(1);
        let mut session = DrawingSession::new();
        let mut controller = InteractionController::new(EngineConfig::default());
        controller.set_surface(Some(Rc::clone(&surface)), &mut session);
        assert!(!controller.is_attached());
    }

    #[test]
    fn test_closing_click_completes_ring() {
        let (surface, mut controller, mut session) = setup();
        draw_square(&surface, &mut controller, &mut session);

        let outcome = controller.handle_pointer(&mut session, shift_click(surface.pixel(0.1, 0.1)));
        assert_eq!(outcome, PointerOutcome::RingClosed);
        assert_eq!(session.rings().len(), 2);
        assert_eq!(session.outer_ring().len(), 4);
    }

    #[test]
    fn test_click_near_start_without_modifier_adds_snapped_point() {
        let (surface, mut controller, mut session) = setup();
        draw_square(&surface, &mut controller, &mut session);

        let outcome = controller.handle_pointer(&mut session, PointerEvent::click(surface.pixel(0.1, 0.1)));
        let PointerOutcome::PointAdded(snap) = outcome else {
            panic!("expected a point, got {outcome:?}");
        };
        assert_eq!(snap.kind, SnapKind::Vertex);
        assert_eq!(session.outer_ring().len(), 5);
        assert_eq!(session.outer_ring()[4], session.outer_ring()[0]);
    }

    #[test]
    fn test_closing_click_needs_three_points() {
        let (surface, mut controller, mut session) = setup();
        controller.handle_pointer(&mut session, PointerEvent::click(surface.pixel(0.0, 0.0)));
        controller.handle_pointer(&mut session, PointerEvent::click(surface.pixel(0.0, 10.0)));

        let outcome = controller.handle_pointer(&mut session, shift_click(surface.pixel(0.0, 0.0)));
        assert!(matches!(outcome, PointerOutcome::PointAdded(_)));
        assert_eq!(session.rings().len(), 1);
    }

    #[test]
    fn test_click_snaps_to_snap_target() {
        let (surface, mut controller, mut session) = setup();
        let neighbour = vec![GeoPoint::new(3.0, 3.0), GeoPoint::new(3.0, 6.0), GeoPoint::new(6.0, 6.0)];
        session.set_snap_targets(vec![neighbour.clone()]);

        controller.handle_pointer(&mut session, PointerEvent::click(surface.pixel(3.05, 6.05)));
        assert_eq!(session.outer_ring(), &[neighbour[1]]);
        assert_eq!(session.snap_targets(), &[neighbour]);
    }

    #[test]
    fn test_move_updates_preview_without_adding() {
        let (surface, mut controller, mut session) = setup();
        let outcome = controller.handle_pointer(
            &mut session,
            PointerEvent::Move {
                position: surface.pixel(2.0, 2.0),
            },
        );
        assert!(matches!(outcome, PointerOutcome::PreviewMoved(_)));
        assert!(controller.preview().is_some());
        assert!(surface.preview.borrow().is_some());
        assert!(!session.has_points());
    }

    #[test]
    fn test_finish_key_detaches_and_keeps_rings() {
        let (surface, mut controller, mut session) = setup();
        draw_square(&surface, &mut controller, &mut session);
        controller.handle_pointer(&mut session, PointerEvent::Move { position: surface.pixel(1.0, 1.0) });

        let outcome = controller.handle_key(&mut session, &KeyEvent::Pressed("Enter".into()));
        assert_eq!(outcome, KeyOutcome::Finished);
        assert!(!controller.is_attached());
        assert_eq!(surface.listener_count(), 0);
        assert!(surface.preview.borrow().is_none());
        assert!(controller.preview().is_none());
        assert_eq!(session.outer_ring().len(), 4);

        let after = controller.handle_pointer(&mut session, PointerEvent::click(surface.pixel(1.0, 1.0)));
        assert_eq!(after, PointerOutcome::Ignored);
    }

    #[test]
    fn test_cancel_key_exits_drawing() {
        let (surface, mut controller, mut session) = setup();
        draw_square(&surface, &mut controller, &mut session);

        let outcome = controller.handle_key(&mut session, &KeyEvent::Pressed("Escape".into()));
        assert_eq!(outcome, KeyOutcome::Cancelled);
        assert!(!session.has_points());
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn test_undo_key_removes_last_point() {
        let (surface, mut controller, mut session) = setup();
        controller.handle_pointer(&mut session, PointerEvent::click(surface.pixel(1.0, 1.0)));
        controller.handle_pointer(&mut session, PointerEvent::click(surface.pixel(2.0, 2.0)));

        let outcome = controller.handle_key(&mut session, &KeyEvent::Pressed("Backspace".into()));
        assert!(matches!(outcome, KeyOutcome::PointRemoved(Some(_))));
        assert_eq!(session.outer_ring().len(), 1);
    }

    #[test]
    fn test_released_and_unknown_keys_ignored() {
        let (_surface, mut controller, mut session) = setup();
        assert_eq!(
            controller.handle_key(&mut session, &KeyEvent::Released("Enter".into())),
            KeyOutcome::Ignored
        );
        assert_eq!(
            controller.handle_key(&mut session, &KeyEvent::Pressed("q".into())),
            KeyOutcome::Ignored
        );
        assert!(session.is_drawing());
    }

    #[test]
    fn test_surface_swap_moves_listeners() {
        let (first, mut controller, mut session) = setup();
        let second = FakeSurface::new(2);
        controller.set_surface(Some(Rc::clone(&second)), &mut session);

        assert_eq!(first.listener_count(), 0);
        assert_eq!(second.listener_count(), 3);
    }

    #[test]
    fn test_surface_removal_detaches() {
        let (surface, mut controller, mut session) = setup();
        controller.set_surface(None, &mut session);
        assert!(!controller.is_attached());
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn test_exit_drawing_releases_listeners_immediately() {
        let (surface, mut controller, mut session) = setup();
        controller.handle_pointer(&mut session, PointerEvent::Move { position: surface.pixel(1.0, 1.0) });
        assert!(surface.preview.borrow().is_some());

        session.exit_drawing();
        assert_eq!(surface.listener_count(), 0);
        assert!(surface.preview.borrow().is_none());
        assert!(!controller.is_attached());
        assert!(controller.preview().is_none());
    }

    #[test]
    fn test_complete_shape_releases_listeners_immediately() {
        let (surface, controller, mut session) = setup();
        session.complete_shape();
        assert_eq!(surface.listener_count(), 0);
        assert!(!controller.is_attached());
    }

    #[test]
    fn test_reset_drawing_keeps_listeners() {
        let (surface, mut controller, mut session) = setup();
        controller.handle_pointer(&mut session, PointerEvent::click(surface.pixel(1.0, 1.0)));
        session.reset_drawing();
        assert_eq!(surface.listener_count(), 3);
        assert!(controller.is_attached());
    }

    #[test]
    fn test_reattaches_after_new_session_starts() {
        let (surface, mut controller, mut session) = setup();
        session.exit_drawing();
        session.start_drawing(ShapeKind::building("Depot"));
        controller.sync(&mut session);
        assert_eq!(surface.listener_count(), 3);

        session.exit_drawing();
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn test_surface_losing_readiness_detaches_on_next_event() {
        let (surface, mut controller, mut session) = setup();
        surface.ready.set(false);

        let outcome = controller.handle_pointer(&mut session, PointerEvent::click(surface.pixel(1.0, 1.0)));
        assert_eq!(outcome, PointerOutcome::Ignored);
        assert_eq!(surface.listener_count(), 0);
        assert!(!session.has_points());
    }

    #[test]
    fn test_drop_releases_listeners() {
        let (surface, controller, session) = setup();
        drop(controller);
        assert_eq!(surface.listener_count(), 0);
        assert!(session.is_drawing());
    }

    #[test]
    fn test_dropping_session_releases_listeners() {
        let (surface, controller, session) = setup();
        drop(session);
        assert_eq!(surface.listener_count(), 0);
        assert!(!controller.is_attached());
    }
}
