use serde::Serialize;

use crate::prelude::{OverlayError, OverlayResult, Point2, Scan, StemGeometry};
use crate::telemetry::DiagnosticLog;

/// Cartesian projection of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MappedPoint {
    pub depth: f64,
    pub radial_distance: f64,
    pub position: Point2,
    /// Raw resistance; NaN for gaps.
    pub value: f64,
    /// The sample lies past the insertion radius and was pinned to the center.
    pub clamped: bool,
}

/// Mapped points of one scan, in sample order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedScan {
    pub label: String,
    pub angle_deg: f64,
    /// Unit vector from the stem center towards the insertion point.
    pub direction: Point2,
    pub insertion: Point2,
    pub points: Vec<MappedPoint>,
}

impl MappedScan {
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|point| point.value)
    }
}

#[derive(Debug, Clone)]
pub struct MappingOutcome {
    pub mapped: MappedScan,
    pub warnings: Vec<OverlayError>,
}

/// Successful mappings (input order) alongside every per-scan issue.
#[derive(Debug, Clone, Default)]
pub struct MappingReport {
    pub mapped: Vec<MappedScan>,
    pub issues: Vec<OverlayError>,
}

/// Places scans inside one stem cross section.
pub struct GeometryMapper<'a> {
    geometry: &'a StemGeometry,
}

impl<'a> GeometryMapper<'a> {
    pub fn new(geometry: &'a StemGeometry) -> Self {
        Self { geometry }
    }

    pub fn map(&self, scan: &Scan) -> OverlayResult<MappingOutcome> {
        if scan.len() < 2 {
            return Err(OverlayError::InsufficientData {
                label: scan.label.clone(),
                samples: scan.len(),
            });
        }

        if let Some(index) = scan.first_depth_regression() {
            return Err(OverlayError::DepthOrder {
                label: scan.label.clone(),
                index,
            });
        }

        let geometry = self.geometry;
        let direction = geometry.convention.unit_vector(scan.angle_deg);
        let insertion_radius = scan.insertion_offset.unwrap_or(geometry.radius);

        let points: Vec<MappedPoint> = scan
            .samples
            .iter()
            .map(|sample| {
                let raw = insertion_radius - sample.depth;
                let clamped = raw < 0.0;
                let radial_distance = if clamped { 0.0 } else { raw };
                MappedPoint {
                    depth: sample.depth,
                    radial_distance,
                    position: geometry.center.offset(direction, radial_distance),
                    value: sample.resistance,
                    clamped,
                }
            })
            .collect();

        let mut warnings = Vec::new();
        if let Some(deepest) = scan.max_depth() {
            if deepest - insertion_radius > geometry.overflow_tolerance {
                warnings.push(OverlayError::GeometryOverflow {
                    label: scan.label.clone(),
                    depth: deepest,
                    radius: insertion_radius,
                    tolerance: geometry.overflow_tolerance,
                });
            }
        }

        Ok(MappingOutcome {
            mapped: MappedScan {
                label: scan.label.clone(),
                angle_deg: scan.angle_deg,
                direction,
                insertion: geometry.center.offset(direction, insertion_radius),
                points,
            },
            warnings,
        })
    }

    /// Maps every scan, isolating failures so one bad scan never hides the rest.
    pub fn map_all<'s, I>(&self, scans: I) -> MappingReport
    where
        I: IntoIterator<Item = &'s Scan>,
    {
        let mut log = DiagnosticLog::new("mapper");
        let mut mapped = Vec::new();
        for scan in scans {
            match self.map(scan) {
                Ok(outcome) => {
                    log.record_processed();
                    log.extend(outcome.warnings);
                    mapped.push(outcome.mapped);
                }
                Err(err) => log.record_issue(err),
            }
        }
        let (processed, issues) = log.snapshot();
        log.record(&format!("mapped {} scan(s), {} issue(s)", processed, issues));

        MappingReport {
            mapped,
            issues: log.into_issues(),
        }
    }
}
