use crate::model::Point2;

/// 2D affine map `[x', y'] = [[a, b], [c, d]] * [x, y] + [tx, ty]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Affine2 {
    pub fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn rotate(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, -sin, sin, cos, 0.0, 0.0)
    }

    /// `self` applied first, then `next`.
    pub fn then(&self, next: &Affine2) -> Affine2 {
        Affine2::new(
            next.a * self.a + next.b * self.c,
            next.a * self.b + next.b * self.d,
            next.c * self.a + next.d * self.c,
            next.c * self.b + next.d * self.d,
            next.a * self.tx + next.b * self.ty + next.tx,
            next.c * self.tx + next.d * self.ty + next.ty,
        )
    }

    pub fn apply(&self, p: Point2) -> Point2 {
        Point2::new(
            self.a * p.x + self.b * p.y + self.tx,
            self.c * p.x + self.d * p.y + self.ty,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn invert(&self) -> Option<Affine2> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-15 {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Affine2::new(
            a,
            b,
            c,
            d,
            -(a * self.tx + b * self.ty),
            -(c * self.tx + d * self.ty),
        ))
    }

    /// Row-major 3x3 homogeneous matrix in single precision.
    pub fn to_matrix_f32(&self) -> [f32; 9] {
        [
            self.a as f32,
            self.b as f32,
            self.tx as f32,
            self.c as f32,
            self.d as f32,
            self.ty as f32,
            0.0,
            0.0,
            1.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_applies_in_order() {
        let shift_then_scale = Affine2::translate(1.0, 0.0).then(&Affine2::scale(2.0, 3.0));
        let p = shift_then_scale.apply(Point2::new(1.0, 1.0));
        assert_eq!(p, Point2::new(4.0, 3.0));
    }

    #[test]
    fn invert_round_trips_points() {
        let map = Affine2::rotate(0.3)
            .then(&Affine2::scale(2.0, -2.0))
            .then(&Affine2::translate(5.0, -7.0));
        let inverse = map.invert().unwrap();
        let p = Point2::new(3.5, -1.25);
        let back = inverse.apply(map.apply(p));
        assert!((back.x - p.x).abs() < 1e-12 && (back.y - p.y).abs() < 1e-12);
    }

    #[test]
    fn degenerate_map_has_no_inverse() {
        assert!(Affine2::scale(0.0, 1.0).invert().is_none());
    }
}
