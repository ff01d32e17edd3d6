//! Shape metadata and the payload handed to persistence.

use crate::drawing::{DrawingError, DrawingResult, DrawingSession};
use crate::geo::{self, Ring};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What kind of footprint is being traced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeKind {
    /// A building outline.
    Building { name: String },
    /// A room on one floor of a building.
    Room {
        name: String,
        floor: String,
        building_id: String,
    },
}

impl ShapeKind {
    /// Create a building descriptor.
    pub fn building(name: impl Into<String>) -> Self {
        Self::Building { name: name.into() }
    }

    /// Create a room descriptor.
    pub fn room(
        name: impl Into<String>,
        floor: impl Into<String>,
        building_id: impl Into<String>,
    ) -> Self {
        Self::Room {
            name: name.into(),
            floor: floor.into(),
            building_id: building_id.into(),
        }
    }

    /// Display name of the shape.
    pub fn name(&self) -> &str {
        match self {
            Self::Building { name } | Self::Room { name, .. } => name,
        }
    }

    /// Check if this is a room.
    pub fn is_room(&self) -> bool {
        matches!(self, Self::Room { .. })
    }
}

/// Identity of a persisted building or room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A finished shape ready to be created or updated by the persistence layer.
///
/// Rings are closed (first point repeated at the end) and rings with fewer
/// than three points have been dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintSubmission {
    /// Building or room metadata.
    pub kind: ShapeKind,
    /// Object being updated, or `None` to create a new one.
    pub editing_target: Option<TargetId>,
    /// Outer ring followed by holes, each closed.
    pub rings: Vec<Ring>,
    /// Session the snapshot was taken from.
    pub session_id: Uuid,
    /// Session revision at snapshot time.
    pub revision: u64,
}

impl FootprintSubmission {
    /// Snapshot a session into a persistence payload.
    ///
    /// Fails when the session carries no metadata or when the outer ring has
    /// fewer than three points. Short hole rings are dropped silently.
    pub fn from_session(session: &DrawingSession) -> DrawingResult<Self> {
        let kind = session.kind().cloned().ok_or(DrawingError::MissingMetadata)?;

        let mut rings = session.rings().iter();
        let outer = rings
            .next()
            .filter(|ring| geo::is_persistable(ring))
            .ok_or(DrawingError::OuterRingTooShort)?;

        let mut closed = vec![geo::closed(outer)];
        closed.extend(
            rings
                .filter(|ring| geo::is_persistable(ring))
                .map(|ring| geo::closed(ring)),
        );

        Ok(Self {
            kind,
            editing_target: session.editing_target().cloned(),
            rings: closed,
            session_id: session.id(),
            revision: session.revision(),
        })
    }

    /// Whether this submission updates an existing object.
    pub fn is_update(&self) -> bool {
        self.editing_target.is_some()
    }

    /// Serialize to JSON for the persistence layer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn ring(points: &[[f64; 2]]) -> Ring {
        points.iter().copied().map(GeoPoint::from).collect()
    }

    #[test]
    fn test_kind_name() {
        assert_eq!(ShapeKind::building("Main Hall").name(), "Main Hall");
        let room = ShapeKind::room("Lab 2", "1", "b-17");
        assert_eq!(room.name(), "Lab 2");
        assert!(room.is_room());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ShapeKind::room("Lab", "2", "b1")).unwrap();
        assert_eq!(
            json,
            r#"{"type":"room","name":"Lab","floor":"2","building_id":"b1"}"#
        );
    }

    #[test]
    fn test_submission_closes_rings_and_drops_short_holes() {
        let mut session = DrawingSession::new();
        session.start_drawing(ShapeKind::building("Depot"));
        session.set_rings(vec![
            ring(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]]),
            ring(&[[0.2, 0.2], [0.3, 0.3]]),
            ring(&[[0.4, 0.4], [0.4, 0.5], [0.5, 0.5]]),
        ]);

        let submission = FootprintSubmission::from_session(&session).unwrap();
        assert_eq!(submission.rings.len(), 2);
        assert_eq!(submission.rings[0].len(), 4);
        assert_eq!(submission.rings[0].first(), submission.rings[0].last());
        assert_eq!(submission.rings[1][0], GeoPoint::new(0.4, 0.4));
        assert!(!submission.is_update());
    }

    #[test]
    fn test_submission_requires_outer_ring() {
        let mut session = DrawingSession::new();
        session.start_drawing(ShapeKind::building("Depot"));
        session.add_point(GeoPoint::new(0.0, 0.0));
        session.add_point(GeoPoint::new(1.0, 0.0));

        assert!(matches!(
            FootprintSubmission::from_session(&session),
            Err(DrawingError::OuterRingTooShort)
        ));
    }

    #[test]
    fn test_submission_requires_metadata() {
        let mut session = DrawingSession::new();
        session.set_rings(vec![ring(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]])]);

        assert!(matches!(
            FootprintSubmission::from_session(&session),
            Err(DrawingError::MissingMetadata)
        ));
    }

    #[test]
    fn test_submission_json_uses_coordinate_pairs() {
        let mut session = DrawingSession::new();
        session.begin_edit(
            TargetId::new("42"),
            ShapeKind::building("Depot"),
            vec![ring(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]])],
        );
        let submission = FootprintSubmission::from_session(&session).unwrap();
        assert!(submission.is_update());

        let json = submission.to_json().unwrap();
        assert!(json.contains(r#""editing_target":"42""#));
        assert!(json.contains("[[[0.0,0.0],[0.0,1.0],[1.0,1.0],[0.0,0.0]]]"));
    }
}
