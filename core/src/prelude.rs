use std::path::PathBuf;

pub use crate::model::{Point2, Sample, Scan, StemGeometry};

/// Error taxonomy shared by every stage of the overlay pipeline.
///
/// Most variants are not fatal: the mapper, loader and renderer collect them
/// into per-call issue lists and keep going.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    #[error("scan {label}: {samples} sample(s), at least 2 are needed for mapping")]
    InsufficientData { label: String, samples: usize },
    #[error(
        "scan {label}: depth {depth:.3} exceeds insertion radius {radius:.3} \
         beyond tolerance {tolerance:.3}; clamped to the stem center"
    )]
    GeometryOverflow {
        label: String,
        depth: f64,
        radius: f64,
        tolerance: f64,
    },
    #[error("scan {label}: depth decreases at sample {index}")]
    DepthOrder { label: String, index: usize },
    #[error("invalid background extent: {0}")]
    InvalidExtent(String),
    #[error("failed to parse scan file {}: {reason}", .path.display())]
    ScanParse { path: PathBuf, reason: String },
    #[error("nothing to render: no scan layers and no usable background")]
    EmptyRender,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("image failure: {0}")]
    Image(String),
    #[error("io failure on {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
}

impl OverlayError {
    /// Whether the issue is a warning that still left a usable result behind.
    pub fn is_warning(&self) -> bool {
        matches!(self, OverlayError::GeometryOverflow { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        OverlayError::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

impl From<image::ImageError> for OverlayError {
    fn from(err: image::ImageError) -> Self {
        OverlayError::Image(err.to_string())
    }
}

pub type OverlayResult<T> = Result<T, OverlayError>;
