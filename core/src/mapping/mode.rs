use serde::{Deserialize, Serialize};

use super::colormap::ColorMap;

/// Profile drawn as a sideways perturbation of the drill path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveStyle {
    /// Offset, in plane units, of a reading at the top of the value span.
    pub amplitude: f64,
    pub color: [u8; 4],
    /// Opacity of the fill between curve and path; 0 disables it.
    pub fill_alpha: f32,
    pub stride: usize,
}

impl Default for CurveStyle {
    fn default() -> Self {
        Self {
            amplitude: 20.0,
            color: [31, 119, 180, 255],
            fill_alpha: 0.4,
            stride: 1,
        }
    }
}

/// Drill path drawn as a band whose color encodes the reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScaleStyle {
    pub colormap: ColorMap,
    /// Band width in canvas pixels.
    pub line_width: f32,
    pub stride: usize,
}

impl Default for ColorScaleStyle {
    fn default() -> Self {
        Self {
            colormap: ColorMap::Gray,
            line_width: 8.0,
            stride: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderMode {
    Curve(CurveStyle),
    ColorScale(ColorScaleStyle),
}

impl RenderMode {
    pub fn curve() -> Self {
        RenderMode::Curve(CurveStyle::default())
    }

    pub fn color_scale() -> Self {
        RenderMode::ColorScale(ColorScaleStyle::default())
    }

    pub fn is_color_scale(&self) -> bool {
        matches!(self, RenderMode::ColorScale(_))
    }

    pub fn stride(&self) -> usize {
        match self {
            RenderMode::Curve(style) => style.stride.max(1),
            RenderMode::ColorScale(style) => style.stride.max(1),
        }
    }
}
