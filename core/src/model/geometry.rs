use serde::{Deserialize, Serialize};

use crate::prelude::{OverlayError, OverlayResult};

/// Point or vector in the cross-section plane (y axis pointing up).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ORIGIN: Point2 = Point2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, direction: Point2, distance: f64) -> Point2 {
        Point2::new(self.x + direction.x * distance, self.y + direction.y * distance)
    }

    pub fn sub(self, other: Point2) -> Point2 {
        Point2::new(self.x - other.x, self.y - other.y)
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// The vector rotated a quarter turn counter-clockwise.
    pub fn perpendicular(self) -> Point2 {
        Point2::new(-self.y, self.x)
    }
}

/// Compass direction that angle zero points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heading {
    #[default]
    North,
    East,
    South,
    West,
}

impl Heading {
    /// Heading expressed as a mathematical angle (counter-clockwise from +x).
    fn math_degrees(self) -> f64 {
        match self {
            Heading::East => 0.0,
            Heading::North => 90.0,
            Heading::West => 180.0,
            Heading::South => 270.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    #[default]
    Clockwise,
    CounterClockwise,
}

/// How a scan angle in degrees turns into a direction in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AngularConvention {
    pub zero: Heading,
    pub rotation: Rotation,
}

impl AngularConvention {
    fn math_degrees(&self, angle_deg: f64) -> f64 {
        match self.rotation {
            Rotation::Clockwise => self.zero.math_degrees() - angle_deg,
            Rotation::CounterClockwise => self.zero.math_degrees() + angle_deg,
        }
    }

    /// Unit vector pointing from the stem center towards the scan's entry side.
    pub fn unit_vector(&self, angle_deg: f64) -> Point2 {
        let (sin, cos) = self.math_degrees(angle_deg).to_radians().sin_cos();
        Point2::new(cos, sin)
    }

    /// Inverse of [`unit_vector`](Self::unit_vector), normalized to `[0, 360)`.
    pub fn angle_of(&self, vector: Point2) -> f64 {
        let math = vector.y.atan2(vector.x).to_degrees();
        let angle = match self.rotation {
            Rotation::Clockwise => self.zero.math_degrees() - math,
            Rotation::CounterClockwise => math - self.zero.math_degrees(),
        };
        let wrapped = angle.rem_euclid(360.0);
        if wrapped >= 360.0 {
            0.0
        } else {
            wrapped
        }
    }
}

/// Physical parameters of the stem cross section shared by one rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StemGeometry {
    pub center: Point2,
    pub radius: f64,
    #[serde(default)]
    pub convention: AngularConvention,
    /// How far a scan may reach past its insertion radius before the overrun
    /// is reported.
    #[serde(default)]
    pub overflow_tolerance: f64,
}

impl StemGeometry {
    pub fn new(radius: f64) -> Self {
        Self {
            center: Point2::ORIGIN,
            radius,
            convention: AngularConvention::default(),
            overflow_tolerance: 0.0,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.overflow_tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> OverlayResult<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(OverlayError::InvalidConfig(format!(
                "stem radius must be positive, got {}",
                self.radius
            )));
        }
        if !self.overflow_tolerance.is_finite() || self.overflow_tolerance < 0.0 {
            return Err(OverlayError::InvalidConfig(format!(
                "overflow tolerance must be non-negative, got {}",
                self.overflow_tolerance
            )));
        }
        if !self.center.x.is_finite() || !self.center.y.is_finite() {
            return Err(OverlayError::InvalidConfig("stem center must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point2, b: Point2) -> bool {
        (a.x - b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12
    }

    #[test]
    fn north_clockwise_places_quarter_turn_east() {
        let convention = AngularConvention::default();
        assert!(close(convention.unit_vector(0.0), Point2::new(0.0, 1.0)));
        assert!(close(convention.unit_vector(90.0), Point2::new(1.0, 0.0)));
        assert!(close(convention.unit_vector(180.0), Point2::new(0.0, -1.0)));
    }

    #[test]
    fn east_counter_clockwise_matches_math_angles() {
        let convention = AngularConvention {
            zero: Heading::East,
            rotation: Rotation::CounterClockwise,
        };
        assert!(close(convention.unit_vector(90.0), Point2::new(0.0, 1.0)));
    }

    #[test]
    fn angle_of_inverts_unit_vector() {
        let convention = AngularConvention::default();
        for angle in [0.0, 30.0, 135.0, 270.0, 359.0] {
            let back = convention.angle_of(convention.unit_vector(angle));
            assert!((back - angle).abs() < 1e-9, "{angle} -> {back}");
        }
    }

    #[test]
    fn geometry_rejects_non_positive_radius() {
        assert!(StemGeometry::new(0.0).validate().is_err());
        assert!(StemGeometry::new(150.0).with_tolerance(-1.0).validate().is_err());
        assert!(StemGeometry::new(150.0).validate().is_ok());
    }
}
