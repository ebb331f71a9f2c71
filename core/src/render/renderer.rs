use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use serde::{Deserialize, Serialize};

use crate::mapping::{ColorMap, GeometryMapper, MappedScan, RenderMode};
use crate::math::{StatsHelper, ValueSpan};
use crate::prelude::{OverlayError, OverlayResult, Point2, Scan, StemGeometry};
use crate::registration::BackgroundImage;
use crate::render::context::{
    RenderContext, ScaleBar, ValueRange, ViewBox, ViewTransform, COLORBAR_RESERVE,
};
use crate::render::draw;
use crate::telemetry::DiagnosticLog;

const TICK_RED: Rgba<u8> = Rgba([214, 39, 40, 255]);
const TICK_BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const MARKER_COLOR: Rgba<u8> = Rgba([255, 127, 14, 255]);
const CURVE_STROKE: f32 = 2.0;
const TICK_WIDTH: f32 = 4.0;

/// Depth scale drawn along every drill path, alternating red and black.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthTicks {
    pub step: f64,
    pub length: f64,
}

impl Default for DepthTicks {
    fn default() -> Self {
        Self {
            step: 50.0,
            length: 250.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanLayer {
    pub mapped: MappedScan,
    pub mode: RenderMode,
}

impl ScanLayer {
    pub fn new(mapped: MappedScan, mode: RenderMode) -> Self {
        Self { mapped, mode }
    }
}

/// Data of one render call. Layers are drawn in order, the last on top.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub geometry: StemGeometry,
    pub background: Option<BackgroundImage>,
    pub layers: Vec<ScanLayer>,
    /// Sensor positions drawn as dots above the scans.
    pub markers: Vec<Point2>,
    pub depth_ticks: Option<DepthTicks>,
}

impl RenderRequest {
    pub fn new(geometry: StemGeometry) -> Self {
        Self {
            geometry,
            background: None,
            layers: Vec::new(),
            markers: Vec::new(),
            depth_ticks: None,
        }
    }

    pub fn with_background(mut self, background: BackgroundImage) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_layer(mut self, mapped: MappedScan, mode: RenderMode) -> Self {
        self.layers.push(ScanLayer::new(mapped, mode));
        self
    }
}

/// Result of a render call, handed to the caller for display or export.
#[derive(Debug, Clone)]
pub struct RenderArtifact {
    pub image: RgbaImage,
    /// Shared normalization span; `None` for per-scan normalization or when
    /// no finite reading exists.
    pub value_range: Option<ValueSpan>,
    pub draw_order: Vec<String>,
    pub layers: Vec<MappedScan>,
    pub warnings: Vec<OverlayError>,
}

/// Serializable digest of an artifact for reports.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSummary {
    pub width: u32,
    pub height: u32,
    pub value_range: Option<ValueSpan>,
    pub draw_order: Vec<String>,
    pub warnings: Vec<String>,
}

impl RenderArtifact {
    pub fn save_png(&self, path: impl AsRef<Path>) -> OverlayResult<()> {
        self.image.save_with_format(path.as_ref(), ImageFormat::Png)?;
        Ok(())
    }

    pub fn summary(&self) -> RenderSummary {
        RenderSummary {
            width: self.image.width(),
            height: self.image.height(),
            value_range: self.value_range,
            draw_order: self.draw_order.clone(),
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Composites mapped scans over an optional background.
pub struct OverlayRenderer<'a> {
    context: &'a RenderContext,
}

impl<'a> OverlayRenderer<'a> {
    pub fn new(context: &'a RenderContext) -> Self {
        Self { context }
    }

    /// Maps `scans` under `geometry` and renders the ones that map. Mapping
    /// issues land in the artifact's warnings.
    pub fn render_scans(
        &self,
        geometry: &StemGeometry,
        background: Option<BackgroundImage>,
        scans: &[(Scan, RenderMode)],
    ) -> OverlayResult<RenderArtifact> {
        geometry.validate()?;
        let mapper = GeometryMapper::new(geometry);
        let mut issues = Vec::new();
        let mut request = RenderRequest::new(*geometry);
        request.background = background;

        for (scan, mode) in scans {
            match mapper.map(scan) {
                Ok(outcome) => {
                    issues.extend(outcome.warnings);
                    request.layers.push(ScanLayer::new(outcome.mapped, *mode));
                }
                Err(err) => issues.push(err),
            }
        }

        let mut artifact = self.render(&request)?;
        issues.append(&mut artifact.warnings);
        artifact.warnings = issues;
        Ok(artifact)
    }

    pub fn render(&self, request: &RenderRequest) -> OverlayResult<RenderArtifact> {
        let ctx = self.context;
        ctx.validate()?;
        request.geometry.validate()?;

        let mut log = DiagnosticLog::new("renderer");
        let view = ctx.view_transform(&request.geometry);

        let background = request.background.as_ref().and_then(|bg| {
            match bg.placement().and_then(|placement| {
                let combined = placement.affine().then(&view.plane_to_canvas);
                Projection::from_matrix(combined.to_matrix_f32()).ok_or_else(|| {
                    OverlayError::InvalidExtent("background placement is not invertible".into())
                })
            }) {
                Ok(projection) => Some((bg, projection)),
                Err(err) => {
                    log.record_issue(err);
                    None
                }
            }
        });

        if request.layers.is_empty() && background.is_none() {
            return Err(OverlayError::EmptyRender);
        }

        let mut canvas = RgbaImage::from_pixel(ctx.width, ctx.height, Rgba(ctx.canvas_color));

        if let Some((bg, projection)) = background {
            let mut warped = RgbaImage::new(ctx.width, ctx.height);
            warp_into(
                &bg.image,
                &projection,
                Interpolation::Nearest,
                Rgba([0, 0, 0, 0]),
                &mut warped,
            );
            draw::composite(&mut canvas, &warped, bg.opacity);
            log.record("background composited");
        }

        if let Some(color) = ctx.outline_color {
            draw::ring(
                &mut canvas,
                view.to_canvas(request.geometry.center),
                request.geometry.radius * view.scale,
                Rgba(color),
            );
        }

        let shared_span = match ctx.value_range {
            ValueRange::Fixed { .. } => ctx.fixed_span(),
            ValueRange::Global => {
                let any_color = request.layers.iter().any(|layer| layer.mode.is_color_scale());
                StatsHelper::finite_span(
                    request
                        .layers
                        .iter()
                        .filter(|layer| !any_color || layer.mode.is_color_scale())
                        .flat_map(|layer| layer.mapped.values()),
                )
            }
            ValueRange::PerScan => None,
        };

        for layer in &request.layers {
            let span = match ctx.value_range {
                ValueRange::PerScan => StatsHelper::finite_span(layer.mapped.values()),
                _ => shared_span,
            };
            match span {
                Some(span) => draw_layer(&mut canvas, &view, layer, span),
                None => log.record(&format!("scan {} has no finite readings", layer.mapped.label)),
            }
            log.record_processed();
        }

        if let Some(ticks) = request.depth_ticks {
            for layer in &request.layers {
                draw_depth_ticks(&mut canvas, &view, &layer.mapped, ticks);
            }
        }

        for marker in &request.markers {
            draw::dot(&mut canvas, view.to_canvas(*marker), 4, MARKER_COLOR);
        }

        if let Some(bar) = ctx.scale_bar {
            draw_scale_bar(&mut canvas, &view, ctx.view_box(&request.geometry), bar);
        }

        if ctx.colorbar && ctx.plot_width() < ctx.width {
            let colormap = request.layers.iter().find_map(|layer| match layer.mode {
                RenderMode::ColorScale(style) => Some(style.colormap),
                RenderMode::Curve(_) => None,
            });
            if let (Some(colormap), Some(_)) = (colormap, shared_span) {
                draw_colorbar(&mut canvas, colormap);
            }
        }

        let (processed, issues) = log.snapshot();
        log.record(&format!("rendered {} layer(s), {} issue(s)", processed, issues));

        Ok(RenderArtifact {
            image: canvas,
            value_range: shared_span,
            draw_order: request
                .layers
                .iter()
                .map(|layer| layer.mapped.label.clone())
                .collect(),
            layers: request.layers.iter().map(|layer| layer.mapped.clone()).collect(),
            warnings: log.into_issues(),
        })
    }
}

fn draw_layer(canvas: &mut RgbaImage, view: &ViewTransform, layer: &ScanLayer, span: ValueSpan) {
    let stride = layer.mode.stride();
    let points: Vec<_> = layer.mapped.points.iter().step_by(stride).collect();

    match layer.mode {
        RenderMode::ColorScale(style) => {
            for pair in points.windows(2) {
                let (start, end) = (pair[0], pair[1]);
                if !start.value.is_finite() || !end.value.is_finite() {
                    continue;
                }
                let color = style.colormap.color(span.normalize(start.value));
                draw::band(
                    canvas,
                    view.to_canvas(start.position),
                    view.to_canvas(end.position),
                    style.line_width,
                    color,
                );
            }
        }
        RenderMode::Curve(style) => {
            let side = layer.mapped.direction.perpendicular();
            let offset = |value: f64| style.amplitude * span.normalize(value);
            let color = Rgba(style.color);

            if style.fill_alpha > 0.0 {
                let mut fill = RgbaImage::new(canvas.width(), canvas.height());
                for pair in points.windows(2) {
                    let (start, end) = (pair[0], pair[1]);
                    if !start.value.is_finite() || !end.value.is_finite() {
                        continue;
                    }
                    draw::quad(
                        &mut fill,
                        [
                            view.to_canvas(start.position),
                            view.to_canvas(end.position),
                            view.to_canvas(end.position.offset(side, offset(end.value))),
                            view.to_canvas(start.position.offset(side, offset(start.value))),
                        ],
                        color,
                    );
                }
                draw::composite(canvas, &fill, style.fill_alpha);
            }

            for pair in points.windows(2) {
                let (start, end) = (pair[0], pair[1]);
                if !start.value.is_finite() || !end.value.is_finite() {
                    continue;
                }
                draw::band(
                    canvas,
                    view.to_canvas(start.position.offset(side, offset(start.value))),
                    view.to_canvas(end.position.offset(side, offset(end.value))),
                    CURVE_STROKE,
                    color,
                );
            }
        }
    }
}

fn draw_depth_ticks(canvas: &mut RgbaImage, view: &ViewTransform, mapped: &MappedScan, ticks: DepthTicks) {
    if !(ticks.step > 0.0) || !(ticks.length > 0.0) {
        return;
    }
    let inward = Point2::new(-mapped.direction.x, -mapped.direction.y);
    let count = (ticks.length / ticks.step).floor() as usize;
    for idx in 0..count {
        let near = mapped.insertion.offset(inward, idx as f64 * ticks.step);
        let far = mapped.insertion.offset(inward, (idx + 1) as f64 * ticks.step);
        let color = if idx % 2 == 0 { TICK_RED } else { TICK_BLACK };
        draw::band(canvas, view.to_canvas(near), view.to_canvas(far), TICK_WIDTH, color);
    }
}

fn draw_scale_bar(canvas: &mut RgbaImage, view: &ViewTransform, view_box: ViewBox, bar: ScaleBar) {
    // Lift the stroke by half its width so it sits fully inside the view.
    let lift = f64::from(bar.width) / 2.0 / view.scale;
    let start = Point2::new(view_box.min.x, view_box.min.y + lift);
    let east = Point2::new(1.0, 0.0);
    let middle = start.offset(east, bar.segment);
    let end = middle.offset(east, bar.segment);
    draw::band(canvas, view.to_canvas(start), view.to_canvas(middle), bar.width, TICK_RED);
    draw::band(canvas, view.to_canvas(middle), view.to_canvas(end), bar.width, TICK_BLACK);
}

fn draw_colorbar(canvas: &mut RgbaImage, colormap: ColorMap) {
    let (width, height) = canvas.dimensions();
    let margin = 8u32;
    if height <= margin * 2 + 1 {
        return;
    }
    let left = width - COLORBAR_RESERVE + margin * 2;
    let right = width - margin;
    let top = margin;
    let bottom = height - margin - 1;
    for row in top..=bottom {
        let t = f64::from(bottom - row) / f64::from(bottom - top);
        draw::line(
            canvas,
            Point2::new(f64::from(left), f64::from(row)),
            Point2::new(f64::from(right), f64::from(row)),
            colormap.color(t),
        );
    }
}
