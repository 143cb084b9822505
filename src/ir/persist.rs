//! Atomic file replacement.
//!
//! Every store and image write goes through [`write_atomic`]: the content is
//! written to a temporary file in the destination directory, synced, and
//! renamed over the destination. Readers see either the old file or the new
//! one, never a partial write.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::AugmentError;

/// Replaces `path` with whatever `write` produces.
///
/// The destination's parent directory must exist. On error the temporary
/// file is removed and `path` is left as it was.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), AugmentError>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<(), AugmentError>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| AugmentError::Io(e.error))?;
    Ok(())
}
