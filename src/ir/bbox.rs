//! Axis-aligned bounding boxes in the COCO `[x, y, width, height]` layout.
//!
//! The four values are stored exactly as read, so rewriting a store never
//! perturbs an existing box through a corner/size round trip.

use serde::{Deserialize, Serialize};

use super::point::Point;

/// An axis-aligned bounding box in pixel space; `(x, y)` is the top-left
/// corner.
///
/// Construction does not enforce non-negative sizes; a box read from a store
/// is kept exactly as written.
#[derive(Clone, Copy, Default, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    /// Creates a bounding box from the COCO layout (x, y, width, height).
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the exact axis-aligned envelope of `points`:
    /// `[min_x, min_y, max_x - min_x, max_y - min_y]`.
    ///
    /// Returns `None` when there are no points.
    pub fn envelope<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self::from_xywh(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    /// Returns the bottom-right corner.
    #[inline]
    pub fn max(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// Returns the COCO layout `[x, y, width, height]`.
    #[inline]
    pub fn to_xywh(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

impl std::fmt::Debug for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBox")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Serialize for BBox {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_xywh().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BBox {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y, w, h] = <[f64; 4]>::deserialize(deserializer)?;
        Ok(BBox::from_xywh(x, y, w, h))
    }
}
