use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::{info, warn};
use resicore::loader::load_collection;
use resicore::mapping::GeometryMapper;
use resicore::prelude::{OverlayError, Scan};
use resicore::registration::BackgroundImage;
use resicore::render::{OverlayRenderer, RenderArtifact, RenderRequest, ScanLayer};

pub struct WorkflowResult {
    pub artifact: RenderArtifact,
    /// Loader, mapping and render issues, in pipeline order.
    pub issues: Vec<OverlayError>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

/// Scans not named in `on_top` keep load order; named ones follow in the
/// listed order.
fn layering_order<'a>(scans: &'a [Scan], on_top: &[String]) -> Vec<&'a Scan> {
    let mut ordered: Vec<&Scan> = scans
        .iter()
        .filter(|scan| !on_top.contains(&scan.label))
        .collect();
    for label in on_top {
        ordered.extend(scans.iter().filter(|scan| &scan.label == label));
    }
    ordered
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let config = &self.config;
        let collection = load_collection(&config.data_dir, &config.loader)
            .with_context(|| format!("loading scans from {}", config.data_dir.display()))?;
        info!(
            "loaded {} scan(s) with {} file error(s)",
            collection.scans.len(),
            collection.errors.len()
        );
        let mut issues = collection.errors.clone();

        let ordered = layering_order(&collection.scans, &config.layers.on_top);
        let report = GeometryMapper::new(&config.geometry).map_all(ordered.iter().copied());
        issues.extend(report.issues);

        let mut request = RenderRequest::new(config.geometry);
        request.layers = report
            .mapped
            .into_iter()
            .map(|mapped| {
                let mode = config.mode_for(&mapped.label);
                ScanLayer::new(mapped, mode)
            })
            .collect();
        request.depth_ticks = config.layers.depth_ticks;
        if config.layers.show_nodes {
            request.markers = collection
                .nodes
                .iter()
                .map(|node| config.geometry.center.offset(*node, 1.0))
                .collect();
        }

        if let Some(background) = &config.background {
            match BackgroundImage::open(&background.path, Some(background.extent)) {
                Ok(image) => request.background = Some(image.with_opacity(background.opacity)),
                Err(err) => {
                    warn!("background {} skipped: {}", background.path.display(), err);
                    issues.push(err);
                }
            }
        }

        let artifact = OverlayRenderer::new(&config.canvas)
            .render(&request)
            .context("rendering overlay")?;
        issues.extend(artifact.warnings.iter().cloned());

        Ok(WorkflowResult { artifact, issues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{write_synthetic_scans, GeneratorConfig};
    use crate::workflow::config::{ArgSettings, LayerConfig};
    use resicore::mapping::ColorMap;
    use std::fs;
    use tempfile::tempdir;

    fn settings(dir: &std::path::Path) -> ArgSettings {
        ArgSettings {
            data_dir: dir.to_path_buf(),
            radius: 150.0,
            tolerance: 0.0,
            width: 160,
            height: 120,
            curve: false,
            cmap: ColorMap::Viridis,
            min: None,
            max: None,
            line_width: 6.0,
            amplitude: 20.0,
            max_depth: None,
            smoothing: None,
            ticks: true,
            scale_bar: false,
            background: None,
            extent_bbox: None,
        }
    }

    #[test]
    fn runner_renders_generated_scans() {
        let dir = tempdir().unwrap();
        let generator = GeneratorConfig {
            count: 4,
            ..GeneratorConfig::default()
        };
        write_synthetic_scans(dir.path(), &generator).unwrap();
        fs::write(dir.path().join("broken.dpa"), "[DATA]\n0,1\n1;2;3\n").unwrap();

        let runner = Runner::new(WorkflowConfig::from_args(settings(dir.path())).unwrap());
        let result = runner.execute().unwrap();
        assert_eq!(result.artifact.draw_order.len(), 4);
        assert_eq!(
            result
                .issues
                .iter()
                .filter(|issue| matches!(issue, OverlayError::ScanParse { .. }))
                .count(),
            1
        );
        assert_eq!(result.artifact.image.width(), 160);
    }

    #[test]
    fn on_top_labels_are_drawn_last() {
        let scans = vec![
            Scan::from_columns("a", 0.0, &[0.0, 1.0], &[1.0, 2.0]),
            Scan::from_columns("b", 90.0, &[0.0, 1.0], &[1.0, 2.0]),
            Scan::from_columns("c", 180.0, &[0.0, 1.0], &[1.0, 2.0]),
        ];
        let order: Vec<&str> = layering_order(&scans, &["a".to_string()])
            .iter()
            .map(|scan| scan.label.as_str())
            .collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn missing_background_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        write_synthetic_scans(dir.path(), &GeneratorConfig::default()).unwrap();
        let mut args = settings(dir.path());
        args.background = Some(dir.path().join("missing.png"));
        args.extent_bbox = Some([-150.0, -150.0, 150.0, 150.0]);
        let mut config = WorkflowConfig::from_args(args).unwrap();
        config.layers = LayerConfig::default();

        let result = Runner::new(config).execute().unwrap();
        assert!(result
            .issues
            .iter()
            .any(|issue| matches!(issue, OverlayError::Image(_))));
    }
}
