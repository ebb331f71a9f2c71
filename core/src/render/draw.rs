use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut, draw_polygon_mut,
};
use imageproc::point::Point;

use crate::prelude::Point2;

/// Canvas coordinates far outside the image are pinned here before the
/// integer conversion so rasterization stays bounded.
const COORD_LIMIT: f64 = 1.0e6;

fn pixel(p: Point2) -> Point<i32> {
    Point::new(
        p.x.clamp(-COORD_LIMIT, COORD_LIMIT).round() as i32,
        p.y.clamp(-COORD_LIMIT, COORD_LIMIT).round() as i32,
    )
}

fn finite(p: Point2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

pub fn line(canvas: &mut RgbaImage, a: Point2, b: Point2, color: Rgba<u8>) {
    if !finite(a) || !finite(b) {
        return;
    }
    let clip = |v: f64| v.clamp(-COORD_LIMIT, COORD_LIMIT) as f32;
    draw_line_segment_mut(canvas, (clip(a.x), clip(a.y)), (clip(b.x), clip(b.y)), color);
}

/// Segment of `width` pixels drawn as a filled quad; thin or degenerate
/// bands fall back to a one-pixel line.
pub fn band(canvas: &mut RgbaImage, a: Point2, b: Point2, width: f32, color: Rgba<u8>) {
    if !finite(a) || !finite(b) {
        return;
    }
    let along = b.sub(a);
    let length = along.norm();
    let half = f64::from(width) / 2.0;
    if length == 0.0 || half < 1.0 {
        line(canvas, a, b, color);
        return;
    }
    let normal = Point2::new(-along.y / length * half, along.x / length * half);
    let quad = [
        pixel(a.offset(normal, 1.0)),
        pixel(b.offset(normal, 1.0)),
        pixel(b.offset(normal, -1.0)),
        pixel(a.offset(normal, -1.0)),
    ];
    polygon(canvas, &quad, color);
    if quad[0] == quad[3] {
        line(canvas, a, b, color);
    }
}

/// Filled polygon; input whose first and last vertices coincide is
/// closed implicitly.
pub fn polygon(canvas: &mut RgbaImage, vertices: &[Point<i32>], color: Rgba<u8>) {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(vertices.len());
    for &vertex in vertices {
        if poly.last() != Some(&vertex) {
            poly.push(vertex);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        return;
    }
    let (width, height) = canvas.dimensions();
    let outside = poly.iter().all(|p| p.x < 0)
        || poly.iter().all(|p| p.y < 0)
        || poly.iter().all(|p| p.x >= width as i32)
        || poly.iter().all(|p| p.y >= height as i32);
    if outside {
        return;
    }
    draw_polygon_mut(canvas, &poly, color);
}

pub fn quad(canvas: &mut RgbaImage, corners: [Point2; 4], color: Rgba<u8>) {
    if !corners.iter().copied().all(finite) {
        return;
    }
    polygon(canvas, &corners.map(pixel), color);
}

pub fn dot(canvas: &mut RgbaImage, center: Point2, radius: i32, color: Rgba<u8>) {
    if !finite(center) {
        return;
    }
    let c = pixel(center);
    draw_filled_circle_mut(canvas, (c.x, c.y), radius, color);
}

pub fn ring(canvas: &mut RgbaImage, center: Point2, radius: f64, color: Rgba<u8>) {
    if !finite(center) || !radius.is_finite() || radius <= 0.0 {
        return;
    }
    let c = pixel(center);
    let r = radius.min(COORD_LIMIT).round() as i32;
    draw_hollow_circle_mut(canvas, (c.x, c.y), r, color);
}

/// Alpha-composites `layer` over `canvas`, scaling the layer's alpha by
/// `opacity`. Both images must have the same size.
pub fn composite(canvas: &mut RgbaImage, layer: &RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    for (dst, src) in canvas.pixels_mut().zip(layer.pixels()) {
        let alpha = (f32::from(src[3]) * opacity).round() as u8;
        if alpha == 0 {
            continue;
        }
        let mut top = *src;
        top[3] = alpha;
        dst.blend(&top);
    }
}
