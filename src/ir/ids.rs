//! Newtype IDs for the annotation store.
//!
//! Image and annotation ids live in separate sequences; keeping them as
//! distinct types stops an annotation id from being written into an
//! `image_id` foreign key by accident.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for an image record.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl ImageId {
    /// Creates a new ImageId.
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the id immediately after this one, or `None` at `u64::MAX`.
    #[inline]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ImageId {
    fn from(id: u64) -> Self {
        ImageId::new(id)
    }
}

/// A unique identifier for an annotation record.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

impl AnnotationId {
    /// Creates a new AnnotationId.
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the id immediately after this one, or `None` at `u64::MAX`.
    #[inline]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Debug for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationId({})", self.0)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AnnotationId {
    fn from(id: u64) -> Self {
        AnnotationId::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ordering() {
        assert!(ImageId(1) < ImageId(2));
        assert!(AnnotationId(10) > AnnotationId(5));
    }

    #[test]
    fn test_next_increments() {
        assert_eq!(ImageId(41).next(), Some(ImageId(42)));
        assert_eq!(AnnotationId::default().next(), Some(AnnotationId(1)));
    }

    #[test]
    fn test_next_stops_at_max() {
        assert_eq!(ImageId(u64::MAX).next(), None);
        assert_eq!(AnnotationId(u64::MAX).next(), None);
    }

    #[test]
    fn test_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&ImageId(7)).unwrap();
        assert_eq!(json, "7");
        let id: AnnotationId = serde_json::from_str("12").unwrap();
        assert_eq!(id, AnnotationId(12));
    }
}
