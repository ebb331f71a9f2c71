//! Text format of a single scan file.
//!
//! ```text
//! # comments start with '#'
//! label=north
//! angle=0
//! insertion=150
//! spacing=0.01
//! [DATA]
//! 0.00,112.5
//! 0.01,nan
//! ```
//!
//! Header lines are `key=value`; unknown keys and free-form vendor lines above
//! `[DATA]` are ignored. Rows hold `depth,resistance` or a lone resistance
//! whose depth is `row index × spacing`. Fields may be separated by commas,
//! semicolons, tabs or spaces. `nan`, `na`, `-` and empty fields mark gaps.

use std::fmt::Write as _;
use std::path::Path;

use crate::prelude::{OverlayError, OverlayResult, Sample, Scan};

pub const DATA_MARKER: &str = "[DATA]";
pub const DEFAULT_SPACING: f64 = 0.01;

/// Header values found in a scan file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanHeader {
    pub label: Option<String>,
    pub angle_deg: Option<f64>,
    pub insertion_offset: Option<f64>,
    pub spacing: Option<f64>,
}

/// A parsed file whose angle may still need to be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFile {
    pub header: ScanHeader,
    pub samples: Vec<Sample>,
}

impl ScanFile {
    /// Builds the scan, preferring header values over the fallbacks.
    pub fn into_scan(self, fallback_label: &str, fallback_angle: Option<f64>) -> Result<Scan, String> {
        let angle = self
            .header
            .angle_deg
            .or(fallback_angle)
            .ok_or_else(|| "no angle in header or file name".to_string())?;
        let label = self
            .header
            .label
            .unwrap_or_else(|| fallback_label.to_string());
        Ok(Scan {
            label,
            angle_deg: angle,
            insertion_offset: self.header.insertion_offset,
            samples: self.samples,
        })
    }
}

fn parse_number(field: &str, what: &str, line_no: usize) -> Result<f64, String> {
    field
        .parse::<f64>()
        .map_err(|_| format!("line {}: invalid {} '{}'", line_no, what, field))
}

fn parse_reading(field: &str, line_no: usize) -> Result<f64, String> {
    match field.to_ascii_lowercase().as_str() {
        "" | "nan" | "na" | "-" => Ok(f64::NAN),
        _ => parse_number(field, "resistance", line_no),
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    if line.contains([',', ';', '\t']) {
        line.split([',', ';', '\t']).map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    }
}

fn apply_header(header: &mut ScanHeader, key: &str, value: &str, line_no: usize) -> Result<(), String> {
    match key.trim().to_ascii_lowercase().as_str() {
        "label" => header.label = Some(value.trim().to_string()),
        "angle" => {
            let angle = parse_number(value.trim(), "angle", line_no)?;
            if !angle.is_finite() {
                return Err(format!("line {}: angle must be finite", line_no));
            }
            header.angle_deg = Some(angle);
        }
        "insertion" => {
            let insertion = parse_number(value.trim(), "insertion", line_no)?;
            if !(insertion > 0.0) || !insertion.is_finite() {
                return Err(format!("line {}: insertion must be positive", line_no));
            }
            header.insertion_offset = Some(insertion);
        }
        "spacing" => {
            let spacing = parse_number(value.trim(), "spacing", line_no)?;
            if !(spacing > 0.0) || !spacing.is_finite() {
                return Err(format!("line {}: spacing must be positive", line_no));
            }
            header.spacing = Some(spacing);
        }
        _ => {}
    }
    Ok(())
}

/// Parses the text of one scan file.
pub fn parse_scan_text(text: &str) -> Result<ScanFile, String> {
    let has_marker = text.lines().any(|line| line.trim() == DATA_MARKER);
    let mut header = ScanHeader::default();
    let mut in_data = !has_marker;
    let mut columns: Option<usize> = None;
    let mut rows: Vec<(Option<f64>, f64)> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == DATA_MARKER {
            in_data = true;
            continue;
        }
        if !in_data || (rows.is_empty() && line.contains('=')) {
            if let Some((key, value)) = line.split_once('=') {
                apply_header(&mut header, key, value, line_no)?;
            }
            continue;
        }

        let fields = split_fields(line);
        match (fields.len(), columns) {
            (n @ (1 | 2), None) => columns = Some(n),
            (n, Some(expected)) if n == expected => {}
            (n, _) => {
                return Err(format!(
                    "line {}: expected {} column(s), found {}",
                    line_no,
                    columns.map_or("1 or 2".to_string(), |c| c.to_string()),
                    n
                ))
            }
        }
        let row = if fields.len() == 2 {
            let depth = parse_number(fields[0], "depth", line_no)?;
            if !depth.is_finite() {
                return Err(format!("line {}: depth must be finite", line_no));
            }
            (Some(depth), parse_reading(fields[1], line_no)?)
        } else {
            (None, parse_reading(fields[0], line_no)?)
        };
        rows.push(row);
    }

    if rows.is_empty() {
        return Err("no samples found".into());
    }

    let spacing = header.spacing.unwrap_or(DEFAULT_SPACING);
    let samples: Vec<Sample> = rows
        .into_iter()
        .enumerate()
        .map(|(idx, (depth, resistance))| {
            Sample::new(depth.unwrap_or(idx as f64 * spacing), resistance)
        })
        .collect();

    if let Some(idx) = samples
        .windows(2)
        .position(|pair| pair[1].depth < pair[0].depth)
    {
        return Err(format!("depth decreases at sample {}", idx + 2));
    }

    Ok(ScanFile { header, samples })
}

/// Angle encoded as a `@<degrees>` file stem suffix, e.g. `oak-3@135.dpa`.
pub fn angle_from_file_name(path: &Path) -> Option<f64> {
    let stem = path.file_stem()?.to_str()?;
    let (_, angle) = stem.rsplit_once('@')?;
    angle.parse::<f64>().ok().filter(|a| a.is_finite())
}

/// File stem without the angle suffix.
pub fn label_from_file_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scan");
    match stem.rsplit_once('@') {
        Some((label, angle)) if angle.parse::<f64>().is_ok() && !label.is_empty() => label.to_string(),
        _ => stem.to_string(),
    }
}

/// Parses `text` as the content of `path`, resolving label and angle from the
/// file name when the header lacks them.
pub fn parse_scan(text: &str, path: &Path) -> OverlayResult<Scan> {
    parse_scan_text(text)
        .and_then(|file| file.into_scan(&label_from_file_name(path), angle_from_file_name(path)))
        .map_err(|reason| OverlayError::ScanParse {
            path: path.to_path_buf(),
            reason,
        })
}

pub fn read_scan(path: impl AsRef<Path>) -> OverlayResult<Scan> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|err| OverlayError::ScanParse {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    parse_scan(&text, path)
}

/// Serializes a scan so that [`parse_scan_text`] reproduces its samples and angle.
pub fn write_scan(scan: &Scan) -> String {
    let mut out = String::new();
    let label = scan.label.replace(['\n', '\r'], " ");
    let _ = writeln!(out, "label={}", label);
    let _ = writeln!(out, "angle={}", scan.angle_deg);
    if let Some(offset) = scan.insertion_offset {
        let _ = writeln!(out, "insertion={}", offset);
    }
    let _ = writeln!(out, "{}", DATA_MARKER);
    for sample in &scan.samples {
        if sample.resistance.is_finite() {
            let _ = writeln!(out, "{},{}", sample.depth, sample.resistance);
        } else {
            let _ = writeln!(out, "{},nan", sample.depth);
        }
    }
    out
}

pub fn save_scan(scan: &Scan, path: impl AsRef<Path>) -> OverlayResult<()> {
    let path = path.as_ref();
    std::fs::write(path, write_scan(scan)).map_err(|err| OverlayError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_two_column_file_with_vendor_header() {
        let text = "Device: PD400\nlabel=north\nangle=90\n[DATA]\n0,110\n0.5,-\n1.0,121.5\n";
        let file = parse_scan_text(text).unwrap();
        assert_eq!(file.header.angle_deg, Some(90.0));
        assert_eq!(file.samples.len(), 3);
        assert!(file.samples[1].is_gap());
        assert_eq!(file.samples[2], Sample::new(1.0, 121.5));
    }

    #[test]
    fn single_column_uses_spacing() {
        let text = "spacing=0.5\n[DATA]\n10\n11\nnan\n13\n";
        let file = parse_scan_text(text).unwrap();
        assert_eq!(file.samples.iter().map(|s| s.depth).collect::<Vec<_>>(), vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn rejects_empty_and_malformed_files() {
        assert!(parse_scan_text("").is_err());
        assert!(parse_scan_text("angle=3\n[DATA]\n").is_err());
        assert!(parse_scan_text("[DATA]\n0,1\n1,abc\n").is_err());
        assert!(parse_scan_text("[DATA]\n0,1\n1\n").is_err());
        assert!(parse_scan_text("[DATA]\n0,1\n2,1\n1,1\n").is_err());
        assert!(parse_scan_text("angle=north\n[DATA]\n0,1\n").is_err());
    }

    #[test]
    fn non_finite_angle_is_rejected() {
        for text in ["angle=nan\n[DATA]\n0,1\n1,2\n", "angle=inf\n[DATA]\n0,1\n1,2\n"] {
            let err = parse_scan_text(text).unwrap_err();
            assert!(err.starts_with("line 1:"), "{err}");
        }
    }

    #[test]
    fn insertion_must_be_positive_and_finite() {
        for bad in ["-5", "0", "nan", "inf"] {
            let text = format!("angle=10\ninsertion={bad}\n[DATA]\n0,1\n1,2\n");
            let err = parse_scan_text(&text).unwrap_err();
            assert!(err.starts_with("line 2:"), "{bad}: {err}");
        }
        assert!(matches!(
            parse_scan("angle=nan\ninsertion=-5\n[DATA]\n0,1\n", Path::new("bad.dpa")),
            Err(OverlayError::ScanParse { .. })
        ));
    }

    #[test]
    fn labels_resembling_markup_round_trip() {
        for label in ["[DATA]", "#hash", "a=b"] {
            let scan = Scan::from_columns(label, 15.0, &[0.0, 1.0], &[3.0, 4.0]);
            let back = parse_scan(&write_scan(&scan), Path::new("x.dpa")).unwrap();
            assert_eq!(back.label, label);
            assert_eq!(back.depths(), vec![0.0, 1.0]);
        }
    }

    #[test]
    fn file_name_supplies_label_and_angle() {
        let path = PathBuf::from("/data/oak-3@135.dpa");
        assert_eq!(angle_from_file_name(&path), Some(135.0));
        assert_eq!(label_from_file_name(&path), "oak-3");
        let scan = parse_scan("[DATA]\n0,1\n1,2\n", &path).unwrap();
        assert_eq!(scan.angle_deg, 135.0);
        assert_eq!(scan.label, "oak-3");

        let plain = PathBuf::from("north.dpa");
        assert_eq!(angle_from_file_name(&plain), None);
        assert!(matches!(
            parse_scan("[DATA]\n0,1\n", &plain),
            Err(OverlayError::ScanParse { .. })
        ));
    }

    #[test]
    fn write_then_parse_reproduces_scan() {
        let scan = Scan::from_columns("west", 270.0, &[0.0, 0.01, 0.02, 7.125], &[101.25, f64::NAN, 99.0, 1e-3])
            .with_insertion_offset(142.5);
        let back = parse_scan(&write_scan(&scan), Path::new("ignored.dpa")).unwrap();
        assert_eq!(back.label, scan.label);
        assert_eq!(back.angle_deg, scan.angle_deg);
        assert_eq!(back.insertion_offset, scan.insertion_offset);
        assert_eq!(back.depths(), scan.depths());
        let (a, b) = (back.resistances(), scan.resistances());
        for (x, y) in a.iter().zip(&b) {
            assert!(x == y || (x.is_nan() && y.is_nan()));
        }
    }
}
