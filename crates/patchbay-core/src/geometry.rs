//! Canvas geometry: positions and node footprints.

use serde::{Deserialize, Serialize};

/// A point on the editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width and height of a node on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Dimensions {
    /// Creates a footprint.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Merges a partial update field-wise.
    pub fn merged(self, update: DimensionsUpdate) -> Self {
        Self {
            width: update.width.unwrap_or(self.width),
            height: update.height.unwrap_or(self.height),
        }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(120.0, 60.0)
    }
}

/// Field-wise dimension update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DimensionsUpdate {
    /// New width, if any.
    pub width: Option<f32>,
    /// New height, if any.
    pub height: Option<f32>,
}
