//! Placement of a raster (usually a tomogram) in the stem's plane.
//!
//! Only the affine pixel-to-plane map is computed here; pixels are not touched
//! until the renderer composites them.

use std::path::Path;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::math::Affine2;
use crate::prelude::{OverlayError, OverlayResult, Point2};

/// Caller-supplied physical placement of an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extent {
    /// The image exactly covers the box; its top row lies at `max.y`.
    BoundingBox { min: Point2, max: Point2 },
    /// The image center sits on `center`; every pixel spans `units_per_pixel`.
    CenterScale { center: Point2, units_per_pixel: f64 },
    /// Two image pixels (column, row) pinned to two plane points. Resolves
    /// rotation, uniform scale and translation.
    Anchors {
        image_a: Point2,
        image_b: Point2,
        plane_a: Point2,
        plane_b: Point2,
    },
}

/// Affine map from pixel coordinates `(column, row)` to plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    to_plane: Affine2,
    to_pixel: Affine2,
}

impl Placement {
    fn from_affine(to_plane: Affine2) -> OverlayResult<Self> {
        let to_pixel = to_plane
            .invert()
            .ok_or_else(|| OverlayError::InvalidExtent("placement collapses the image".into()))?;
        Ok(Self { to_plane, to_pixel })
    }

    pub fn affine(&self) -> Affine2 {
        self.to_plane
    }

    pub fn to_plane(&self, column: f64, row: f64) -> Point2 {
        self.to_plane.apply(Point2::new(column, row))
    }

    pub fn to_pixel(&self, point: Point2) -> Point2 {
        self.to_pixel.apply(point)
    }
}

fn finite(p: Point2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Computes the placement of a `width` x `height` image under `extent`.
pub fn register(width: u32, height: u32, extent: &Extent) -> OverlayResult<Placement> {
    if width == 0 || height == 0 {
        return Err(OverlayError::InvalidExtent(format!(
            "image has zero size ({}x{})",
            width, height
        )));
    }
    let (w, h) = (f64::from(width), f64::from(height));

    let to_plane = match *extent {
        Extent::BoundingBox { min, max } => {
            if !finite(min) || !finite(max) {
                return Err(OverlayError::InvalidExtent("bounding box is not finite".into()));
            }
            let span_x = max.x - min.x;
            let span_y = max.y - min.y;
            if span_x <= 0.0 || span_y <= 0.0 {
                return Err(OverlayError::InvalidExtent(format!(
                    "bounding box has no area ({:.3} x {:.3})",
                    span_x, span_y
                )));
            }
            Affine2::new(span_x / w, 0.0, 0.0, -span_y / h, min.x, max.y)
        }
        Extent::CenterScale {
            center,
            units_per_pixel,
        } => {
            if !finite(center) || !units_per_pixel.is_finite() || units_per_pixel <= 0.0 {
                return Err(OverlayError::InvalidExtent(format!(
                    "scale must be positive and finite, got {}",
                    units_per_pixel
                )));
            }
            Affine2::translate(-w / 2.0, -h / 2.0)
                .then(&Affine2::scale(units_per_pixel, -units_per_pixel))
                .then(&Affine2::translate(center.x, center.y))
        }
        Extent::Anchors {
            image_a,
            image_b,
            plane_a,
            plane_b,
        } => {
            if ![image_a, image_b, plane_a, plane_b].into_iter().all(finite) {
                return Err(OverlayError::InvalidExtent("anchor is not finite".into()));
            }
            // Rows grow downwards, so image vectors are flipped into y-up first.
            let image_vec = Point2::new(image_b.x - image_a.x, image_a.y - image_b.y);
            let plane_vec = plane_b.sub(plane_a);
            if image_vec.norm() == 0.0 || plane_vec.norm() == 0.0 {
                return Err(OverlayError::InvalidExtent("anchor points coincide".into()));
            }
            let rotation = plane_vec.y.atan2(plane_vec.x) - image_vec.y.atan2(image_vec.x);
            let scale = plane_vec.norm() / image_vec.norm();
            Affine2::translate(-image_a.x, -image_a.y)
                .then(&Affine2::scale(1.0, -1.0))
                .then(&Affine2::rotate(rotation))
                .then(&Affine2::scale(scale, scale))
                .then(&Affine2::translate(plane_a.x, plane_a.y))
        }
    };

    Placement::from_affine(to_plane)
}

/// A raster together with its declared extent.
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    pub image: RgbaImage,
    pub extent: Option<Extent>,
    /// Overall opacity in `[0, 1]` applied while compositing.
    pub opacity: f32,
}

impl BackgroundImage {
    pub fn new(image: RgbaImage, extent: Extent) -> Self {
        Self {
            image,
            extent: Some(extent),
            opacity: 1.0,
        }
    }

    pub fn open(path: impl AsRef<Path>, extent: Option<Extent>) -> OverlayResult<Self> {
        let image = image::open(path.as_ref())?.to_rgba8();
        Ok(Self {
            image,
            extent,
            opacity: 1.0,
        })
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn placement(&self) -> OverlayResult<Placement> {
        let extent = self
            .extent
            .as_ref()
            .ok_or_else(|| OverlayError::InvalidExtent("no extent supplied".into()))?;
        register(self.image.width(), self.image.height(), extent)
    }
}
