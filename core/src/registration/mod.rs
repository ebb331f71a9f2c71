pub mod registrar;

pub use registrar::{register, BackgroundImage, Extent, Placement};
