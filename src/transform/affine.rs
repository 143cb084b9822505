//! 2×3 affine matrices over pixel-space points.

use crate::ir::Point;

/// An affine map `x' = a·x + b·y + c`, `y' = d·x + e·y + f`.
///
/// Parameters are listed row by row: `(a, b, c, d, e, f)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Affine = Affine::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0);

    #[inline]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Pure translation by `(dx, dy)`.
    #[inline]
    pub const fn translation(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, dx, 0.0, 1.0, dy)
    }

    /// Rotation by `degrees` about `(cx, cy)`, using the standard matrix
    /// `[cos -sin; sin cos]`.
    ///
    /// In image coordinates (y down) a positive angle turns content
    /// clockwise on screen.
    pub fn rotation_about(cx: f64, cy: f64, degrees: f64) -> Self {
        let (sin, cos) = sin_cos_degrees(degrees);
        Self::new(
            cos,
            -sin,
            cx - cos * cx + sin * cy,
            sin,
            cos,
            cy - sin * cx - cos * cy,
        )
    }

    /// Applies the map to a point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.b * p.y + self.c,
            self.d * p.x + self.e * p.y + self.f,
        )
    }

    /// Returns the map that applies `self` first and `next` second.
    pub fn then(&self, next: &Affine) -> Affine {
        Affine::new(
            next.a * self.a + next.b * self.d,
            next.a * self.b + next.b * self.e,
            next.a * self.c + next.b * self.f + next.c,
            next.d * self.a + next.e * self.d,
            next.d * self.b + next.e * self.e,
            next.d * self.c + next.e * self.f + next.f,
        )
    }

    /// Returns the inverse map, or `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Affine> {
        let det = self.a * self.e - self.b * self.d;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let a = self.e / det;
        let b = -self.b / det;
        let d = -self.d / det;
        let e = self.a / det;
        Some(Affine::new(
            a,
            b,
            -(a * self.c + b * self.f),
            d,
            e,
            -(d * self.c + e * self.f),
        ))
    }
}

/// `(sin, cos)` of an angle in degrees, exact for multiples of 90°.
fn sin_cos_degrees(degrees: f64) -> (f64, f64) {
    let quarter_turns = degrees / 90.0;
    if quarter_turns.is_finite() && quarter_turns.fract() == 0.0 {
        match (quarter_turns as i64).rem_euclid(4) {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        }
    } else {
        degrees.to_radians().sin_cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(p: Point, x: f64, y: f64) {
        assert!(
            (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got ({}, {})",
            p.x,
            p.y
        );
    }

    #[test]
    fn rotation_about_center_matches_matrix_formula() {
        let rot = Affine::rotation_about(50.0, 25.0, 90.0);
        assert_eq!(rot.apply(Point::new(0.0, 0.0)), Point::new(75.0, -25.0));
    }

    #[test]
    fn rotation_fixes_its_center() {
        let rot = Affine::rotation_about(12.0, 7.0, 33.0);
        assert_close(rot.apply(Point::new(12.0, 7.0)), 12.0, 7.0);
    }

    #[test]
    fn quarter_turns_are_exact() {
        assert_eq!(sin_cos_degrees(90.0), (1.0, 0.0));
        assert_eq!(sin_cos_degrees(-90.0), (-1.0, 0.0));
        assert_eq!(sin_cos_degrees(540.0), (0.0, -1.0));
        let (s, c) = sin_cos_degrees(30.0);
        assert!((s - 0.5).abs() < 1e-12 && (c - 3f64.sqrt() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn then_applies_in_order() {
        let scale_x = Affine::new(2.0, 0.0, 0.0, 0.0, 1.0, 0.0);
        let shift = Affine::translation(1.0, 0.0);
        let composed = scale_x.then(&shift);
        assert_eq!(composed.apply(Point::new(3.0, 4.0)), Point::new(7.0, 4.0));
    }

    #[test]
    fn inverse_undoes_map() {
        let map = Affine::rotation_about(40.0, 10.0, 27.0).then(&Affine::new(1.0, 0.3, 0.0, 0.0, 1.0, 0.0));
        let inv = map.inverse().expect("invertible");
        let p = Point::new(13.5, -2.25);
        let back = inv.apply(map.apply(p));
        assert_close(back, p.x, p.y);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Affine::new(1.0, 2.0, 0.0, 2.0, 4.0, 0.0).inverse().is_none());
    }
}
