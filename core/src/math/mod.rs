pub mod affine;
pub mod matrix;
pub mod smoothing;
pub mod stats;

pub use affine::Affine2;
pub use matrix::MatrixHelper;
pub use smoothing::{SavitzkyGolay, SmoothingSettings};
pub use stats::{StatsHelper, ValueSpan};
