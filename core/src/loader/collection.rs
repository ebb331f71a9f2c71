use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::loader::format::{angle_from_file_name, label_from_file_name, parse_scan_text};
use crate::loader::nodes::{drill_start, read_nodes};
use crate::math::{SavitzkyGolay, SmoothingSettings};
use crate::model::AngularConvention;
use crate::prelude::{OverlayError, OverlayResult, Point2, Scan};
use crate::telemetry::DiagnosticLog;

/// How a scan directory is discovered and post-processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// File extensions (without dot, case-insensitive) treated as scans.
    pub extensions: Vec<String>,
    /// Samples deeper than this are dropped.
    pub max_depth: Option<f64>,
    pub smoothing: Option<SmoothingSettings>,
    /// Sensor node file inside the directory, used for scans without angles.
    pub node_file: Option<String>,
    pub convention: AngularConvention,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["dpa".into(), "txt".into()],
            max_depth: None,
            smoothing: None,
            node_file: Some("nodes.csv".into()),
            convention: AngularConvention::default(),
        }
    }
}

/// Scans that loaded, plus one recorded error per file that did not.
#[derive(Debug, Clone, Default)]
pub struct ScanCollection {
    pub scans: Vec<Scan>,
    pub errors: Vec<OverlayError>,
    /// Centered sensor nodes, empty when no node file was found.
    pub nodes: Vec<Point2>,
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Scan files in `dir` in name order.
pub fn discover(dir: &Path, options: &LoaderOptions) -> OverlayResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|err| OverlayError::io(dir, err))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| OverlayError::io(dir, err))?.path();
        if path.is_file() && has_extension(&path, &options.extensions) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Loads every scan in `dir`. Only an unreadable directory or invalid
/// options abort; bad files are recorded and skipped.
pub fn load_collection(dir: impl AsRef<Path>, options: &LoaderOptions) -> OverlayResult<ScanCollection> {
    let dir = dir.as_ref();
    let filter = options
        .smoothing
        .as_ref()
        .map(SavitzkyGolay::from_settings)
        .transpose()?;
    let paths = discover(dir, options)?;

    let mut log = DiagnosticLog::new("loader");
    log.record(&format!("{} candidate file(s) in {}", paths.len(), dir.display()));

    let nodes = match &options.node_file {
        Some(name) if dir.join(name).is_file() => match read_nodes(dir.join(name)) {
            Ok(nodes) => nodes,
            Err(err) => {
                log.record_issue(err);
                Vec::new()
            }
        },
        _ => Vec::new(),
    };

    let mut scans = Vec::new();
    for (index, path) in paths.iter().enumerate() {
        match load_one(path, index, &nodes, options, filter.as_ref()) {
            Ok(scan) => {
                log.record_processed();
                scans.push(scan);
            }
            Err(reason) => log.record_issue(OverlayError::ScanParse {
                path: path.clone(),
                reason,
            }),
        }
    }

    let (processed, issues) = log.snapshot();
    log.record(&format!("loaded {} scan(s), {} issue(s)", processed, issues));

    Ok(ScanCollection {
        scans,
        errors: log.into_issues(),
        nodes,
    })
}

fn load_one(
    path: &Path,
    index: usize,
    nodes: &[Point2],
    options: &LoaderOptions,
    filter: Option<&SavitzkyGolay>,
) -> Result<Scan, String> {
    let text = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let file = parse_scan_text(&text)?;

    let node_start = if file.header.angle_deg.is_none() && angle_from_file_name(path).is_none() {
        drill_start(index, nodes, &options.convention)
    } else {
        None
    };
    let fallback_angle = angle_from_file_name(path).or(node_start.map(|start| start.angle_deg));

    let mut scan = file.into_scan(&label_from_file_name(path), fallback_angle)?;
    if scan.insertion_offset.is_none() {
        scan.insertion_offset = node_start.map(|start| start.offset);
    }

    if let Some(limit) = options.max_depth {
        scan.samples.retain(|sample| sample.depth <= limit);
        if scan.samples.is_empty() {
            return Err(format!("no samples within max depth {}", limit));
        }
    }

    if let Some(filter) = filter {
        let smoothed = filter.apply(&scan.resistances());
        for (sample, value) in scan.samples.iter_mut().zip(smoothed) {
            sample.resistance = value;
        }
    }

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::format::write_scan;
    use crate::mapping::{GeometryMapper, RenderMode};
    use crate::model::StemGeometry;
    use crate::render::{OverlayRenderer, RenderContext};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn noisy_scan(label: &str, angle: f64, seed: u64) -> Scan {
        let mut rng = StdRng::seed_from_u64(seed);
        let depths: Vec<f64> = (0..=30).map(|i| i as f64 * 5.0).collect();
        let values: Vec<f64> = depths.iter().map(|_| 150.0 + rng.gen_range(-20.0..20.0)).collect();
        Scan::from_columns(label, angle, &depths, &values)
    }

    fn write(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn one_malformed_file_out_of_five_is_isolated() {
        let dir = tempdir().unwrap();
        for (i, angle) in [0.0, 90.0, 180.0, 270.0].iter().enumerate() {
            let scan = noisy_scan(&format!("s{i}"), *angle, i as u64);
            write(dir.path(), &format!("s{i}.dpa"), &write_scan(&scan));
        }
        write(dir.path(), "s9.dpa", "angle=45\n[DATA]\n0,12\nbroken row here,,\n");
        write(dir.path(), "notes.md", "not a scan");

        let collection = load_collection(dir.path(), &LoaderOptions::default()).unwrap();
        assert_eq!(collection.scans.len(), 4);
        assert_eq!(collection.errors.len(), 1);
        assert!(matches!(
            &collection.errors[0],
            OverlayError::ScanParse { path, .. } if path.ends_with("s9.dpa")
        ));

        let geometry = StemGeometry::new(150.0);
        let report = GeometryMapper::new(&geometry).map_all(&collection.scans);
        assert_eq!(report.mapped.len(), 4);

        let ctx = RenderContext::with_size(64, 64);
        let scans: Vec<(Scan, RenderMode)> = collection
            .scans
            .iter()
            .cloned()
            .map(|scan| (scan, RenderMode::color_scale()))
            .collect();
        let artifact = OverlayRenderer::new(&ctx).render_scans(&geometry, None, &scans).unwrap();
        assert_eq!(artifact.draw_order, vec!["s0", "s1", "s2", "s3"]);
    }

    #[test]
    fn empty_file_is_recorded_not_fatal() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a@0.dpa", "");
        write(dir.path(), "b@90.dpa", "[DATA]\n0,1\n1,2\n");
        let collection = load_collection(dir.path(), &LoaderOptions::default()).unwrap();
        assert_eq!(collection.scans.len(), 1);
        assert_eq!(collection.scans[0].label, "b");
        assert_eq!(collection.errors.len(), 1);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            load_collection(&missing, &LoaderOptions::default()),
            Err(OverlayError::Io { .. })
        ));
    }

    #[test]
    fn nodes_supply_angle_and_insertion() {
        let dir = tempdir().unwrap();
        write(dir.path(), "nodes.csv", "100,0\n0,100\n-100,0\n0,-100\n");
        write(dir.path(), "p1.dpa", "[DATA]\n5\n6\n7\n");
        write(dir.path(), "p2.dpa", "angle=10\n[DATA]\n5\n6\n7\n");
        let collection = load_collection(dir.path(), &LoaderOptions::default()).unwrap();
        assert!(collection.errors.is_empty());
        assert_eq!(collection.nodes.len(), 4);

        let first = &collection.scans[0];
        assert!((first.angle_deg - 45.0).abs() < 1e-9);
        assert!((first.insertion_offset.unwrap() - 50f64.sqrt() * 10.0).abs() < 1e-9);
        let second = &collection.scans[1];
        assert_eq!(second.angle_deg, 10.0);
        assert_eq!(second.insertion_offset, None);
    }

    #[test]
    fn max_depth_and_smoothing_are_applied() {
        let dir = tempdir().unwrap();
        let depths: Vec<f64> = (0..40).map(f64::from).collect();
        let values: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 110.0 } else { 90.0 }).collect();
        let scan = Scan::from_columns("zigzag", 0.0, &depths, &values);
        write(dir.path(), "zigzag.dpa", &write_scan(&scan));

        let options = LoaderOptions {
            max_depth: Some(29.0),
            smoothing: Some(SmoothingSettings {
                window_length: 5,
                polyorder: 1,
            }),
            ..LoaderOptions::default()
        };
        let collection = load_collection(dir.path(), &options).unwrap();
        let loaded = &collection.scans[0];
        assert_eq!(loaded.len(), 30);
        assert!(loaded.samples[2..28]
            .iter()
            .all(|s| (s.resistance - 100.0).abs() < 5.0));
    }

    #[test]
    fn invalid_smoothing_is_rejected_up_front() {
        let dir = tempdir().unwrap();
        let options = LoaderOptions {
            smoothing: Some(SmoothingSettings {
                window_length: 4,
                polyorder: 1,
            }),
            ..LoaderOptions::default()
        };
        assert!(matches!(
            load_collection(dir.path(), &options),
            Err(OverlayError::InvalidConfig(_))
        ));
    }
}
