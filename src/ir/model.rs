//! Annotation store model.
//!
//! The store is a COCO-like document: an ordered `images` array and an
//! ordered `annotations` array. Everything else in the document (categories,
//! info, licenses, extra per-record fields) is carried through untouched so a
//! rewritten store differs from its input only by the records appended to it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::bbox::BBox;
use super::ids::{AnnotationId, ImageId};

/// The structured annotation store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStore {
    /// All image records, in store order.
    #[serde(default)]
    pub images: Vec<Image>,

    /// All annotation records, in store order.
    #[serde(default)]
    pub annotations: Vec<Annotation>,

    /// Other top-level members (`categories`, `info`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnnotationStore {
    /// Finds the image record whose `file_name` matches exactly.
    pub fn image_by_file_name(&self, file_name: &str) -> Option<&Image> {
        self.images.iter().find(|img| img.file_name == file_name)
    }

    /// Returns every annotation tied to `image_id`, in store order.
    pub fn annotations_for(&self, image_id: ImageId) -> Vec<&Annotation> {
        self.annotations
            .iter()
            .filter(|ann| ann.image_id == image_id)
            .collect()
    }

    /// Largest image id in the store, or 0 for an empty store.
    pub fn max_image_id(&self) -> ImageId {
        self.images.iter().map(|img| img.id).max().unwrap_or_default()
    }

    /// Largest annotation id in the store, or 0 for an empty store.
    pub fn max_annotation_id(&self) -> AnnotationId {
        self.annotations
            .iter()
            .map(|ann| ann.id)
            .max()
            .unwrap_or_default()
    }
}

/// An image record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub width: u32,
    pub height: u32,
    pub file_name: String,

    /// Fields beyond the four above (`license`, `date_captured`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Image {
    /// Creates an image record with no extra fields.
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            file_name: file_name.into(),
            extra: Map::new(),
        }
    }
}

/// An annotation record (one polygon mask plus its bounding box).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub image_id: ImageId,

    #[serde(default)]
    pub segmentation: Segmentation,

    /// COCO bbox: `[x, y, width, height]`.
    #[serde(default)]
    pub bbox: BBox,

    /// Fields beyond the ones above (`category_id`, `area`, `iscrowd`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Annotation {
    /// Creates an annotation from a single polygon ring, deriving its bbox.
    pub fn from_ring(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        ring: Vec<f64>,
    ) -> Self {
        let bbox = BBox::envelope(super::point::ring_points(&ring)).unwrap_or_default();
        Self {
            id: id.into(),
            image_id: image_id.into(),
            segmentation: Segmentation::Polygons(vec![ring]),
            bbox,
            extra: Map::new(),
        }
    }

    /// Adds an extra field to the annotation.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Segmentation payload of an annotation.
///
/// Polygon lists are decoded; anything else (RLE objects, malformed values)
/// is kept verbatim so the store still round-trips.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segmentation {
    /// One or more flat `[x0, y0, x1, y1, ...]` rings.
    Polygons(Vec<Vec<f64>>),
    /// Any other representation.
    Other(Value),
}

impl Default for Segmentation {
    fn default() -> Self {
        Segmentation::Polygons(Vec::new())
    }
}

impl Segmentation {
    /// Returns the single polygon ring, or a description of why this
    /// segmentation cannot be treated as one.
    pub fn single_ring(&self) -> Result<&[f64], String> {
        let rings = match self {
            Segmentation::Polygons(rings) => rings,
            Segmentation::Other(_) => {
                return Err("only polygon segmentations are supported (found RLE or other)".into())
            }
        };
        match rings.as_slice() {
            [] => Err("segmentation has no polygon ring".into()),
            [ring] if ring.is_empty() => Err("polygon ring is empty".into()),
            [ring] if ring.len() % 2 != 0 => Err(format!(
                "polygon ring has an odd number of coordinates ({})",
                ring.len()
            )),
            [ring] => Ok(ring.as_slice()),
            _ => Err(format!(
                "multi-ring polygons are not supported ({} rings)",
                rings.len()
            )),
        }
    }
}
