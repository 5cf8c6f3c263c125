//! Vector path domain models.

use serde::{Deserialize, Serialize};

/// Brush kinds available on the drawing canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushKind {
    Pen,
    Pencil,
    Eraser,
    Marker,
    Highlighter,
    Airbrush,
    Calligraphy,
}

/// Shape-tool kinds for geometric strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Line,
    Circle,
    Rectangle,
}

/// One sampled point of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_pressure")]
    pub pressure: f32,
    /// Capture time in epoch milliseconds.
    #[serde(default)]
    pub timestamp: i64,
}

fn default_pressure() -> f32 {
    1.0
}

fn default_opacity() -> f32 {
    1.0
}

/// One stroke: an ordered point list plus styling. Immutable once appended
/// to a sketch's path list; serialized only as part of the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingPath {
    pub points: Vec<PathPoint>,
    pub brush: BrushKind,
    /// 32-bit ARGB.
    pub color: u32,
    pub stroke_width: f32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled: Option<bool>,
}
