//! Tomograph sensor positions and the drill starts derived from them.
//!
//! Drilling usually happens halfway between two neighbouring sensors, so scan
//! `i` enters at the midpoint of sensors `i` and `i + 1` (the last one pairs
//! with the first).

use std::path::Path;

use crate::model::AngularConvention;
use crate::prelude::{OverlayError, OverlayResult, Point2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrillStart {
    /// Entry point relative to the stem center.
    pub point: Point2,
    pub angle_deg: f64,
    /// Radial distance of the entry point from the center.
    pub offset: f64,
}

/// Parses `x,y` rows and re-centers them on their mean.
pub fn parse_nodes(text: &str) -> Result<Vec<Point2>, String> {
    let mut nodes = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split([',', ';']).map(str::trim).collect();
        let [x, y] = fields.as_slice() else {
            return Err(format!("line {}: expected x,y", idx + 1));
        };
        let parse = |field: &str| {
            field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("line {}: invalid coordinate '{}'", idx + 1, field))
        };
        nodes.push(Point2::new(parse(*x)?, parse(*y)?));
    }
    if nodes.len() < 2 {
        return Err(format!("need at least 2 sensor nodes, found {}", nodes.len()));
    }

    let n = nodes.len() as f64;
    let mean = Point2::new(
        nodes.iter().map(|p| p.x).sum::<f64>() / n,
        nodes.iter().map(|p| p.y).sum::<f64>() / n,
    );
    Ok(nodes.into_iter().map(|p| p.sub(mean)).collect())
}

pub fn read_nodes(path: impl AsRef<Path>) -> OverlayResult<Vec<Point2>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|err| OverlayError::io(path, err))?;
    parse_nodes(&text).map_err(|reason| OverlayError::ScanParse {
        path: path.to_path_buf(),
        reason,
    })
}

/// Entry of scan `index` (0-based); `None` when the nodes are too few or the
/// midpoint sits on the center.
pub fn drill_start(index: usize, nodes: &[Point2], convention: &AngularConvention) -> Option<DrillStart> {
    if nodes.len() < 2 {
        return None;
    }
    let a = nodes[index % nodes.len()];
    let b = nodes[(index + 1) % nodes.len()];
    let point = Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    let offset = point.norm();
    if offset == 0.0 {
        return None;
    }
    Some(DrillStart {
        point,
        angle_deg: convention.angle_of(point),
        offset,
    })
}
