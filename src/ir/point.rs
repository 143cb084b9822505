//! 2D points in image pixel space.

use serde::{Deserialize, Serialize};

/// A point in pixel space, with (0, 0) at the top-left corner of the image
/// and y growing downwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point with the given x and y values.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Iterates a flat `[x0, y0, x1, y1, ...]` ring as points.
///
/// A trailing unpaired value is ignored; callers that care check the length
/// first.
pub fn ring_points(ring: &[f64]) -> impl Iterator<Item = Point> + '_ {
    ring.chunks_exact(2).map(|pair| Point::new(pair[0], pair[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_points_pairs_values() {
        let points: Vec<Point> = ring_points(&[1.0, 2.0, 3.0, 4.0]).collect();
        assert_eq!(points, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    }
}
