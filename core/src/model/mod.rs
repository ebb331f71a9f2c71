pub mod geometry;
pub mod scan;

pub use geometry::{AngularConvention, Heading, Point2, Rotation, StemGeometry};
pub use scan::{Sample, Scan};
