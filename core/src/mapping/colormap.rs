use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::prelude::OverlayError;

const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 44, 122),
    (59, 81, 139),
    (44, 113, 142),
    (33, 144, 141),
    (39, 173, 129),
    (92, 200, 99),
    (170, 220, 50),
    (253, 231, 37),
];

const INFERNO: [(u8, u8, u8); 9] = [
    (0, 0, 4),
    (31, 12, 72),
    (85, 15, 109),
    (136, 34, 106),
    (186, 54, 85),
    (227, 89, 51),
    (249, 140, 10),
    (249, 201, 50),
    (252, 255, 164),
];

/// Fixed color ramps available to color-scale layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMap {
    #[default]
    Gray,
    Viridis,
    Inferno,
}

impl ColorMap {
    /// Color at `t` in `[0, 1]` (clipped).
    pub fn color(&self, t: f64) -> Rgba<u8> {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            ColorMap::Gray => {
                let level = (t * 255.0).round() as u8;
                Rgba([level, level, level, 255])
            }
            ColorMap::Viridis => ramp(&VIRIDIS, t),
            ColorMap::Inferno => ramp(&INFERNO, t),
        }
    }
}

impl std::str::FromStr for ColorMap {
    type Err = OverlayError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "gray" | "grey" => Ok(ColorMap::Gray),
            "viridis" => Ok(ColorMap::Viridis),
            "inferno" => Ok(ColorMap::Inferno),
            other => Err(OverlayError::InvalidConfig(format!(
                "unknown color map '{}'",
                other
            ))),
        }
    }
}

fn ramp(stops: &[(u8, u8, u8)], t: f64) -> Rgba<u8> {
    let segments = (stops.len() - 1) as f64;
    let x = t * segments;
    let i = x.floor() as usize;
    if i >= stops.len() - 1 {
        let (r, g, b) = stops[stops.len() - 1];
        return Rgba([r, g, b, 255]);
    }
    let f = x - i as f64;
    let (r0, g0, b0) = stops[i];
    let (r1, g1, b1) = stops[i + 1];
    let lerp = |a: u8, b: u8| (a as f64 + f * (b as f64 - a as f64)).round() as u8;
    Rgba([lerp(r0, r1), lerp(g0, g1), lerp(b0, b1), 255])
}
