//! COCO JSON annotation store reader and writer.
//!
//! The store is read into [`AnnotationStore`] as-is: record order is kept
//! and unknown members are carried along, so writing a store back produces
//! the same records plus whatever was appended in memory.
//!
//! # Durability
//!
//! [`write_coco_json`] replaces the destination atomically (temp file in the
//! same directory, fsync, rename). An interrupted write leaves the previous
//! checkpoint intact.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::model::AnnotationStore;
use super::persist::write_atomic;
use crate::error::AugmentError;

/// Reads an annotation store from a COCO JSON file.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not a valid store.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use augsync::ir::io_coco_json::read_coco_json;
///
/// let store = read_coco_json(Path::new("COCO_fracture_masks.json"))?;
/// println!("{} images", store.images.len());
/// # Ok::<(), augsync::AugmentError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<AnnotationStore, AugmentError> {
    let file = File::open(path).map_err(AugmentError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| AugmentError::CocoJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the full annotation store to `path`, replacing it atomically.
pub fn write_coco_json(path: &Path, store: &AnnotationStore) -> Result<(), AugmentError> {
    write_atomic(path, |writer| {
        serde_json::to_writer_pretty(writer, store).map_err(|source| AugmentError::CocoJsonWrite {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Reads an annotation store from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<AnnotationStore, serde_json::Error> {
    serde_json::from_str(json)
}

/// Reads an annotation store from a JSON byte slice.
///
/// Useful for fuzzing and processing raw bytes without UTF-8 validation overhead.
pub fn from_coco_slice(bytes: &[u8]) -> Result<AnnotationStore, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Writes an annotation store to a JSON string.
pub fn to_coco_string(store: &AnnotationStore) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(store)
}
