use serde::{Deserialize, Serialize};

use crate::math::{Affine2, ValueSpan};
use crate::prelude::{OverlayError, OverlayResult, Point2, StemGeometry};

/// Horizontal room kept free for the colorbar strip.
pub(crate) const COLORBAR_RESERVE: u32 = 40;

/// How readings are normalized for colors and curve amplitudes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueRange {
    /// One span over the color-scale layers of the render call; curve-only
    /// calls span their curves.
    #[default]
    Global,
    /// A caller-fixed span; readings outside it are clipped.
    Fixed { min: f64, max: f64 },
    /// Each layer normalized by its own extremes.
    PerScan,
}

/// Corner scale of two alternating red/black segments, `segment` plane
/// units each, in the lower-left corner of the view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleBar {
    pub segment: f64,
    /// Stroke width in pixels.
    pub width: f32,
}

impl Default for ScaleBar {
    fn default() -> Self {
        Self {
            segment: 50.0,
            width: 8.0,
        }
    }
}

/// Plane window shown on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub min: Point2,
    pub max: Point2,
}

impl ViewBox {
    pub fn around(geometry: &StemGeometry, margin: f64) -> Self {
        let reach = geometry.radius * (1.0 + margin.max(0.0));
        let c = geometry.center;
        Self {
            min: Point2::new(c.x - reach, c.y - reach),
            max: Point2::new(c.x + reach, c.y + reach),
        }
    }

    fn size(&self) -> (f64, f64) {
        (self.max.x - self.min.x, self.max.y - self.min.y)
    }
}

/// Everything one render call needs besides its data. Nothing here is
/// process-wide; two contexts never influence each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    /// Explicit plane window; `None` frames the stem plus `margin`.
    pub view: Option<ViewBox>,
    pub margin: f64,
    pub canvas_color: [u8; 4],
    pub outline_color: Option<[u8; 4]>,
    pub value_range: ValueRange,
    pub colorbar: bool,
    pub scale_bar: Option<ScaleBar>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            view: None,
            margin: 0.1,
            canvas_color: [255, 255, 255, 255],
            outline_color: Some([90, 90, 90, 255]),
            value_range: ValueRange::Global,
            colorbar: true,
            scale_bar: None,
        }
    }
}

impl RenderContext {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> OverlayResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(OverlayError::InvalidConfig(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if let ValueRange::Fixed { min, max } = self.value_range {
            if !(min.is_finite() && max.is_finite() && max > min) {
                return Err(OverlayError::InvalidConfig(format!(
                    "value range max ({}) must exceed min ({})",
                    max, min
                )));
            }
        }
        if let Some(view) = &self.view {
            let (w, h) = view.size();
            if !(w > 0.0 && h > 0.0) {
                return Err(OverlayError::InvalidConfig("view box has no area".into()));
            }
        }
        if let Some(bar) = &self.scale_bar {
            if !(bar.segment > 0.0 && bar.segment.is_finite() && bar.width > 0.0) {
                return Err(OverlayError::InvalidConfig(
                    "scale bar segment and width must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn fixed_span(&self) -> Option<ValueSpan> {
        match self.value_range {
            ValueRange::Fixed { min, max } => Some(ValueSpan::new(min, max)),
            _ => None,
        }
    }

    /// Width of the canvas area used for the plot itself.
    pub(crate) fn plot_width(&self) -> u32 {
        if self.colorbar && self.width > COLORBAR_RESERVE * 2 {
            self.width - COLORBAR_RESERVE
        } else {
            self.width
        }
    }

    pub(crate) fn view_box(&self, geometry: &StemGeometry) -> ViewBox {
        self.view.unwrap_or_else(|| ViewBox::around(geometry, self.margin))
    }

    pub(crate) fn view_transform(&self, geometry: &StemGeometry) -> ViewTransform {
        ViewTransform::fit(
            self.view_box(geometry),
            f64::from(self.plot_width()),
            f64::from(self.height),
        )
    }
}

/// Uniform-scale map from plane coordinates to canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub plane_to_canvas: Affine2,
    /// Canvas pixels per plane unit.
    pub scale: f64,
}

impl ViewTransform {
    pub fn fit(view: ViewBox, plot_width: f64, plot_height: f64) -> Self {
        let (vw, vh) = view.size();
        let scale = (plot_width / vw).min(plot_height / vh);
        let ox = (plot_width - vw * scale) / 2.0;
        let oy = (plot_height - vh * scale) / 2.0;
        Self {
            plane_to_canvas: Affine2::new(
                scale,
                0.0,
                0.0,
                -scale,
                ox - view.min.x * scale,
                oy + view.max.y * scale,
            ),
            scale,
        }
    }

    pub fn to_canvas(&self, point: Point2) -> Point2 {
        self.plane_to_canvas.apply(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_is_centered_on_square_canvas() {
        let ctx = RenderContext {
            colorbar: false,
            margin: 0.0,
            ..RenderContext::with_size(300, 300)
        };
        let view = ctx.view_transform(&StemGeometry::new(150.0));
        assert_eq!(view.to_canvas(Point2::ORIGIN), Point2::new(150.0, 150.0));
        assert_eq!(view.to_canvas(Point2::new(0.0, 150.0)), Point2::new(150.0, 0.0));
        assert_eq!(view.scale, 1.0);
    }

    #[test]
    fn fixed_range_must_be_increasing() {
        let ctx = RenderContext {
            value_range: ValueRange::Fixed { min: 5.0, max: 5.0 },
            ..Default::default()
        };
        assert!(ctx.validate().is_err());
        assert!(RenderContext::with_size(0, 10).validate().is_err());
    }
}
