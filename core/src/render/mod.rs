pub mod context;
pub mod draw;
pub mod renderer;

pub use context::{RenderContext, ScaleBar, ValueRange, ViewBox, ViewTransform};
pub use renderer::{
    DepthTicks, OverlayRenderer, RenderArtifact, RenderRequest, RenderSummary, ScanLayer,
};
