//! Durable stores and the record types they hold.
//!
//! Two stores describe the dataset alongside the image directory:
//!
//! - the **annotation store** ([`AnnotationStore`]), a COCO-like JSON
//!   document of [`Image`] and [`Annotation`] records keyed by integer id;
//! - the **tabular store** ([`TableStore`]), a CSV file with one row per
//!   image keyed by file name.
//!
//! Both are append-only from this crate's point of view: existing records are
//! carried through unchanged and new records are added after them. Writers
//! replace files atomically (see [`persist`]).
//!
//! # Example
//!
//! ```
//! use augsync::ir::{Annotation, AnnotationStore, Image};
//!
//! let store = AnnotationStore {
//!     images: vec![Image::new(1u64, "IMG0000001.jpg", 640, 480)],
//!     annotations: vec![Annotation::from_ring(
//!         1u64,
//!         1u64,
//!         vec![10.0, 20.0, 100.0, 20.0, 100.0, 200.0],
//!     )],
//!     ..Default::default()
//! };
//! assert_eq!(store.annotations[0].bbox.to_xywh(), [10.0, 20.0, 90.0, 180.0]);
//! ```

mod bbox;
mod ids;
pub mod io_coco_json;
pub mod io_table_csv;
mod model;
pub mod persist;
mod point;

pub use bbox::BBox;
pub use ids::{AnnotationId, ImageId};
pub use io_table_csv::{SourceRecord, TableStore};
pub use model::{Annotation, AnnotationStore, Image, Segmentation};
pub use point::{ring_points, Point};
