//! Engine settings.

use crate::input::ModifierKey;
use crate::snap::{DEFAULT_SNAP_THRESHOLD_PX, SnapPolicy, SnapResolver};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default hit tolerance for vertex editor handles, in screen pixels.
pub const DEFAULT_HANDLE_TOLERANCE_PX: f64 = 10.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be a positive finite number, got {value}")]
    InvalidDistance { field: &'static str, value: f64 },
}

/// Settings shared by the interaction controller and vertex editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Snap distance in screen pixels.
    pub snap_threshold_px: f64,
    /// Vertex pass policy.
    pub snap_policy: SnapPolicy,
    /// Key that finishes the shape.
    pub finish_key: String,
    /// Key that abandons the session.
    pub cancel_key: String,
    /// Key that removes the last authored point.
    pub undo_key: String,
    /// Modifier that turns a click near the first point into a ring close.
    pub closing_modifier: ModifierKey,
    /// Hit tolerance for editor handles in screen pixels.
    pub handle_tolerance_px: f64,
    /// Snap vertex editor drags and midpoint inserts like new points.
    pub snap_vertex_edits: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_threshold_px: DEFAULT_SNAP_THRESHOLD_PX,
            snap_policy: SnapPolicy::default(),
            finish_key: "Enter".to_string(),
            cancel_key: "Escape".to_string(),
            undo_key: "Backspace".to_string(),
            closing_modifier: ModifierKey::Shift,
            handle_tolerance_px: DEFAULT_HANDLE_TOLERANCE_PX,
            snap_vertex_edits: false,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that distances are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_distance("snap_threshold_px", self.snap_threshold_px)?;
        check_distance("handle_tolerance_px", self.handle_tolerance_px)
    }

    /// Snap resolver built from these settings.
    pub fn resolver(&self) -> SnapResolver {
        SnapResolver::new(self.snap_threshold_px, self.snap_policy)
    }
}

fn check_distance(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDistance { field, value })
    }
}
