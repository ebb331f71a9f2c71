pub mod colormap;
pub mod mapper;
pub mod mode;

pub use colormap::ColorMap;
pub use mapper::{GeometryMapper, MappedPoint, MappedScan, MappingOutcome, MappingReport};
pub use mode::{ColorScaleStyle, CurveStyle, RenderMode};
