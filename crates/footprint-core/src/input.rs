//! Input events delivered by the map surface.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// A single modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKey {
    #[default]
    Shift,
    Ctrl,
    Alt,
    Meta,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Modifiers with only `key` held.
    pub fn only(key: ModifierKey) -> Self {
        let mut modifiers = Self::NONE;
        match key {
            ModifierKey::Shift => modifiers.shift = true,
            ModifierKey::Ctrl => modifiers.ctrl = true,
            ModifierKey::Alt => modifiers.alt = true,
            ModifierKey::Meta => modifiers.meta = true,
        }
        modifiers
    }

    /// Check if a modifier key is held.
    pub fn is_held(&self, key: ModifierKey) -> bool {
        match key {
            ModifierKey::Shift => self.shift,
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Alt => self.alt,
            ModifierKey::Meta => self.meta,
        }
    }
}

/// Pointer event in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Click { position: Point, modifiers: Modifiers },
    Move { position: Point },
}

impl PointerEvent {
    /// Plain click without modifiers.
    pub fn click(position: Point) -> Self {
        Self::Click {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    /// Pointer position in screen pixels.
    pub fn position(&self) -> Point {
        match self {
            Self::Click { position, .. } | Self::Move { position } => *position,
        }
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// The kinds of input the controller subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    PointerMove,
    PointerClick,
    KeyPress,
}

impl InputKind {
    /// Every kind the controller listens for while drawing.
    pub const ALL: [InputKind; 3] = [Self::PointerMove, Self::PointerClick, Self::KeyPress];
}
