//! Annotation projection: carrying a polygon through a transform.
//!
//! The projector applies a transform's point map to every vertex of an
//! annotation's ring and derives the bounding box from the result. Nothing
//! else on the annotation is touched; extra fields are copied as-is.

use crate::error::AugmentError;
use crate::ir::{ring_points, Annotation, AnnotationId, BBox, ImageId, Segmentation};
use crate::transform::{Geometry, Transform};

/// Maps every vertex of a flat `[x0, y0, x1, y1, ...]` ring through
/// `geometry`, keeping vertex order and count.
pub fn project_ring(ring: &[f64], geometry: &Geometry) -> Vec<f64> {
    ring_points(ring)
        .map(|p| geometry.map_point(p))
        .flat_map(|p| [p.x, p.y])
        .collect()
}

/// Builds the augmented counterpart of `source` for a transform applied to a
/// `width × height` source image.
///
/// The result carries `id` and `image_id`, the projected ring, its exact
/// envelope as `bbox`, and every extra field of `source`.
///
/// # Errors
///
/// - [`AugmentError::UnsupportedSegmentation`] when `source` is not a single
///   non-empty, even-length polygon ring.
/// - [`AugmentError::UnsupportedTransform`] for transforms with no point map.
pub fn project_annotation(
    source: &Annotation,
    transform: &Transform,
    width: u32,
    height: u32,
    id: AnnotationId,
    image_id: ImageId,
) -> Result<Annotation, AugmentError> {
    let ring = check_segmentation(source)?;
    let geometry = transform.geometry(width, height)?;
    Ok(project_with(source, ring, &geometry, id, image_id))
}

/// Returns the single ring of `annotation`, or the reason it cannot be
/// projected.
pub fn check_segmentation(annotation: &Annotation) -> Result<&[f64], AugmentError> {
    annotation
        .segmentation
        .single_ring()
        .map_err(|reason| AugmentError::UnsupportedSegmentation {
            annotation_id: annotation.id.as_u64(),
            reason,
        })
}

pub(crate) fn project_with(
    source: &Annotation,
    ring: &[f64],
    geometry: &Geometry,
    id: AnnotationId,
    image_id: ImageId,
) -> Annotation {
    let projected = project_ring(ring, geometry);
    let bbox = BBox::envelope(ring_points(&projected)).unwrap_or_default();
    Annotation {
        id,
        image_id,
        segmentation: Segmentation::Polygons(vec![projected]),
        bbox,
        extra: source.extra.clone(),
    }
}
