use anyhow::{bail, Context};
use resicore::loader::LoaderOptions;
use resicore::mapping::{ColorMap, ColorScaleStyle, CurveStyle, RenderMode};
use resicore::model::{Point2, StemGeometry};
use resicore::registration::Extent;
use resicore::render::{DepthTicks, RenderContext, ScaleBar, ValueRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackgroundConfig {
    pub path: PathBuf,
    pub extent: Extent,
    #[serde(default = "full_opacity")]
    pub opacity: f32,
}

fn full_opacity() -> f32 {
    1.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Mode for every scan without an override.
    pub mode: RenderMode,
    /// Per-label mode overrides.
    pub overrides: BTreeMap<String, RenderMode>,
    /// Labels drawn last, in this order; the final one ends up on top.
    pub on_top: Vec<String>,
    pub depth_ticks: Option<DepthTicks>,
    pub show_nodes: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::color_scale(),
            overrides: BTreeMap::new(),
            on_top: Vec::new(),
            depth_ticks: None,
            show_nodes: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub data_dir: PathBuf,
    pub geometry: StemGeometry,
    #[serde(default)]
    pub loader: LoaderOptions,
    #[serde(default)]
    pub canvas: RenderContext,
    #[serde(default)]
    pub layers: LayerConfig,
    #[serde(default)]
    pub background: Option<BackgroundConfig>,
}

/// Render settings taken from the command line when no YAML file is given.
#[derive(Clone, Debug)]
pub struct ArgSettings {
    pub data_dir: PathBuf,
    pub radius: f64,
    pub tolerance: f64,
    pub width: u32,
    pub height: u32,
    pub curve: bool,
    pub cmap: ColorMap,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub line_width: f32,
    pub amplitude: f64,
    pub max_depth: Option<f64>,
    pub smoothing: Option<(usize, usize)>,
    pub ticks: bool,
    pub scale_bar: bool,
    pub background: Option<PathBuf>,
    pub extent_bbox: Option<[f64; 4]>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading render config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing render config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_args(args: ArgSettings) -> anyhow::Result<Self> {
        let value_range = match (args.min, args.max) {
            (Some(min), Some(max)) => ValueRange::Fixed { min, max },
            (None, None) => ValueRange::Global,
            _ => bail!("--min and --max must be given together"),
        };

        let mode = if args.curve {
            RenderMode::Curve(CurveStyle {
                amplitude: args.amplitude,
                ..CurveStyle::default()
            })
        } else {
            RenderMode::ColorScale(ColorScaleStyle {
                colormap: args.cmap,
                line_width: args.line_width,
                ..ColorScaleStyle::default()
            })
        };

        let background = match (args.background, args.extent_bbox) {
            (Some(path), Some([min_x, min_y, max_x, max_y])) => Some(BackgroundConfig {
                path,
                extent: Extent::BoundingBox {
                    min: Point2::new(min_x, min_y),
                    max: Point2::new(max_x, max_y),
                },
                opacity: 1.0,
            }),
            (Some(_), None) => bail!("--background needs --extent-bbox"),
            (None, _) => None,
        };

        let loader = LoaderOptions {
            max_depth: args.max_depth,
            smoothing: args.smoothing.map(|(window_length, polyorder)| {
                resicore::math::SmoothingSettings {
                    window_length,
                    polyorder,
                }
            }),
            ..LoaderOptions::default()
        };

        let config = Self {
            data_dir: args.data_dir,
            geometry: StemGeometry::new(args.radius).with_tolerance(args.tolerance),
            loader,
            canvas: RenderContext {
                value_range,
                scale_bar: args.scale_bar.then(ScaleBar::default),
                ..RenderContext::with_size(args.width, args.height)
            },
            layers: LayerConfig {
                mode,
                depth_ticks: args.ticks.then(DepthTicks::default),
                ..LayerConfig::default()
            },
            background,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.geometry.validate().context("validating stem geometry")?;
        self.canvas.validate().context("validating canvas")?;
        Ok(())
    }

    pub fn mode_for(&self, label: &str) -> RenderMode {
        self.layers
            .overrides
            .get(label)
            .copied()
            .unwrap_or(self.layers.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args() -> ArgSettings {
        ArgSettings {
            data_dir: PathBuf::from("data"),
            radius: 150.0,
            tolerance: 0.0,
            width: 400,
            height: 300,
            curve: false,
            cmap: ColorMap::Gray,
            min: Some(100.0),
            max: Some(200.0),
            line_width: 10.0,
            amplitude: 20.0,
            max_depth: Some(250.0),
            smoothing: Some((201, 3)),
            ticks: true,
            scale_bar: true,
            background: None,
            extent_bbox: None,
        }
    }

    #[test]
    fn config_from_args_builds_render_settings() {
        let cfg = WorkflowConfig::from_args(args()).unwrap();
        assert_eq!(cfg.geometry.radius, 150.0);
        assert_eq!(cfg.canvas.value_range, ValueRange::Fixed { min: 100.0, max: 200.0 });
        assert!(cfg.layers.depth_ticks.is_some());
        assert_eq!(cfg.canvas.scale_bar, Some(ScaleBar::default()));
        assert_eq!(cfg.loader.smoothing.unwrap().window_length, 201);
    }

    #[test]
    fn half_specified_range_is_rejected() {
        let mut settings = args();
        settings.max = None;
        assert!(WorkflowConfig::from_args(settings).is_err());
    }

    #[test]
    fn background_without_extent_is_rejected() {
        let mut settings = args();
        settings.background = Some(PathBuf::from("tomo.png"));
        assert!(WorkflowConfig::from_args(settings).is_err());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"data_dir: data\n\
geometry:\n  center: {x: 0.0, y: 0.0}\n  radius: 120.0\n  overflow_tolerance: 2.0\n\
canvas:\n  width: 320\n  height: 240\n  value_range: {kind: fixed, min: 90.0, max: 210.0}\n\
layers:\n  mode: {kind: curve, amplitude: 15.0}\n  overrides:\n    north: {kind: color_scale, colormap: viridis}\n  on_top: [north]\n\
background:\n  path: tomo.png\n  extent: {kind: center_scale, center: {x: 0.0, y: 0.0}, units_per_pixel: 0.5}\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.geometry.radius, 120.0);
        assert_eq!(cfg.canvas.width, 320);
        assert!(matches!(cfg.mode_for("south"), RenderMode::Curve(style) if style.amplitude == 15.0));
        assert!(matches!(
            cfg.mode_for("north"),
            RenderMode::ColorScale(style) if style.colormap == ColorMap::Viridis
        ));
        assert_eq!(cfg.layers.on_top, vec!["north".to_string()]);
        assert_eq!(cfg.background.unwrap().opacity, 1.0);
    }

    #[test]
    fn config_load_rejects_bad_geometry() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"data_dir: data\ngeometry:\n  center: {x: 0.0, y: 0.0}\n  radius: -1.0\n")
            .unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
