//! Footprint Core Library
//!
//! Interactive polygon authoring for tracing building and room footprints on
//! a map: a drawing state machine, a pixel-space snap resolver, an
//! interaction controller driven by map-surface input, and a vertex editor.

pub mod config;
pub mod controller;
pub mod drawing;
pub mod editor;
pub mod geo;
pub mod input;
pub mod projector;
pub mod shape;
pub mod snap;

pub use config::{ConfigError, EngineConfig};
pub use controller::{InteractionController, KeyOutcome, MapSurface, PointerOutcome, SurfaceId};
pub use drawing::{DrawingError, DrawingMode, DrawingResult, DrawingScope, DrawingSession};
pub use editor::{Handle, HandleKind, HandleShape, VertexEditor};
pub use geo::{GeoPoint, Ring};
pub use input::{InputKind, KeyEvent, ModifierKey, Modifiers, PointerEvent};
pub use projector::{MercatorView, Projector};
pub use shape::{FootprintSubmission, ShapeKind, TargetId};
pub use snap::{SnapKind, SnapPolicy, SnapResolver, SnapResult, DEFAULT_SNAP_THRESHOLD_PX};
