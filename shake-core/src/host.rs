//! Host collaborator contract.
//!
//! The video-composition host owns the scene graph. The controller only
//! borrows item handles for the lifetime of an effect session and talks to
//! the host through [`SceneHost`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors reported by the host when touching a single scene item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("Scene item is no longer valid: {0}")]
    StaleItem(String),

    #[error("Failed to read item transform: {0}")]
    Read(String),

    #[error("Failed to write item transform: {0}")]
    Write(String),

    #[error("Failed to release item reference: {0}")]
    Release(String),
}

/// A 2D position in scene coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset this position by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Scene access provided by the host application.
///
/// Item handles may be reference counted on the host side. Every handle
/// returned by [`active_scene_items`](SceneHost::active_scene_items) is handed
/// back through [`release_item`](SceneHost::release_item) exactly once.
pub trait SceneHost {
    /// Opaque handle to a host-owned scene item.
    type Item;

    /// Enumerate the items of the currently active scene.
    ///
    /// Returns an empty list when there is no active scene.
    fn active_scene_items(&mut self) -> Vec<Self::Item>;

    /// Read the current position of an item.
    fn item_position(&mut self, item: &Self::Item) -> Result<Position, HostError>;

    /// Move an item.
    fn set_item_position(&mut self, item: &Self::Item, position: Position)
        -> Result<(), HostError>;

    /// Release a handle acquired from `active_scene_items`.
    fn release_item(&mut self, item: Self::Item) -> Result<(), HostError>;
}

impl<H: SceneHost + ?Sized> SceneHost for &mut H {
    type Item = H::Item;

    fn active_scene_items(&mut self) -> Vec<Self::Item> {
        (**self).active_scene_items()
    }

    fn item_position(&mut self, item: &Self::Item) -> Result<Position, HostError> {
        (**self).item_position(item)
    }

    fn set_item_position(
        &mut self,
        item: &Self::Item,
        position: Position,
    ) -> Result<(), HostError> {
        (**self).set_item_position(item, position)
    }

    fn release_item(&mut self, item: Self::Item) -> Result<(), HostError> {
        (**self).release_item(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        let p = Position::new(10.0, -4.0).offset(2.5, 4.0);
        assert_eq!(p, Position::new(12.5, 0.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::new(1.0, 2.5).to_string(), "(1.00, 2.50)");
    }

    #[test]
    fn test_error_messages() {
        let err = HostError::StaleItem("Camera".to_string());
        assert_eq!(err.to_string(), "Scene item is no longer valid: Camera");
    }
}
