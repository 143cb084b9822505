//! Removal of corrupted images and their table rows.
//!
//! Given a list of image file names (one per line), [`prune_corrupted`]
//! deletes each from the image directory and drops the matching rows from
//! the tabular store. Names that are not on disk are reported, not treated as
//! errors, and rows are removed for every listed name either way.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AugmentError;
use crate::ir::io_table_csv::{read_table_csv, write_table_csv};

/// Reads a corrupted-image list: one file name per line, surrounding
/// whitespace trimmed, blank lines ignored.
pub fn read_corrupted_list(path: &Path) -> Result<Vec<String>, AugmentError> {
    let text = fs::read_to_string(path)?;
    Ok(parse_corrupted_list(&text))
}

/// Parses the contents of a corrupted-image list.
pub fn parse_corrupted_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Deletes `names` from `images_dir` and removes their rows from `table`.
///
/// A missing `table` file is reported in the result and left alone.
///
/// # Errors
/// Fails if the table exists but cannot be read or rewritten. Individual
/// delete failures are collected in [`PruneReport::failed`].
pub fn prune_corrupted(
    names: &[String],
    images_dir: &Path,
    table: Option<&Path>,
) -> Result<PruneReport, AugmentError> {
    let mut report = PruneReport {
        images_dir: images_dir.to_path_buf(),
        ..Default::default()
    };

    for name in names {
        if !is_plain_file_name(name) {
            report.failed.push(PruneFailure {
                name: name.clone(),
                message: "not a plain file name".into(),
            });
            continue;
        }

        let path = images_dir.join(name);
        if !path.exists() {
            report.not_found.push(name.clone());
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "deleted");
                report.deleted.push(name.clone());
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to delete");
                report.failed.push(PruneFailure {
                    name: name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    report.table = match table {
        None => TableOutcome::NotRequested,
        Some(path) if !path.is_file() => TableOutcome::Missing {
            path: path.to_path_buf(),
        },
        Some(path) => {
            let mut store = read_table_csv(path)?;
            let listed: HashSet<String> = names.iter().cloned().collect();
            let removed = store.remove_image_ids(&listed);
            write_table_csv(path, &store)?;
            TableOutcome::Updated {
                path: path.to_path_buf(),
                removed,
            }
        }
    };

    Ok(report)
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    )
}

/// Outcome of a prune run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PruneReport {
    pub images_dir: PathBuf,
    pub deleted: Vec<String>,
    pub not_found: Vec<String>,
    pub failed: Vec<PruneFailure>,
    pub table: TableOutcome,
}

/// A listed name that could not be deleted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PruneFailure {
    pub name: String,
    pub message: String,
}

/// What happened to the tabular store.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome {
    #[default]
    NotRequested,
    Missing {
        path: PathBuf,
    },
    Updated {
        path: PathBuf,
        removed: usize,
    },
}

impl fmt::Display for PruneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deleted {} images.", self.deleted.len())?;
        if !self.not_found.is_empty() {
            writeln!(
                f,
                "{} images not found in {}:",
                self.not_found.len(),
                self.images_dir.display()
            )?;
            for name in &self.not_found {
                writeln!(f, "  {}", name)?;
            }
        }
        for failure in &self.failed {
            writeln!(f, "Error deleting {}: {}", failure.name, failure.message)?;
        }
        match &self.table {
            TableOutcome::NotRequested => {}
            TableOutcome::Missing { path } => {
                writeln!(f, "{} not found. Skipped CSV update.", path.display())?
            }
            TableOutcome::Updated { path, removed } => {
                writeln!(f, "Removed {} records from {}.", removed, path.display())?
            }
        }
        Ok(())
    }
}
