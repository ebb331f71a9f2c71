//! Geometry and overlay core for comparing resistograph scans with tomograms.
//!
//! Scans are placed in the stem cross section by the [`mapping`] stage, the
//! tomogram is positioned by [`registration`], and [`render`] composites both
//! into one raster. Every call takes its configuration explicitly.

pub mod loader;
pub mod mapping;
pub mod math;
pub mod model;
pub mod prelude;
pub mod registration;
pub mod render;
pub mod telemetry;

pub use prelude::{OverlayError, OverlayResult};
