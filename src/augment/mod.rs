//! The augmentation orchestrator.
//!
//! A run walks the fractured rows of the input table in file order and, for
//! each one, applies every configured transform in order. Each (source,
//! transform) pair is one *unit*. A unit:
//!
//! 1. transforms the source pixels and writes the result under a freshly
//!    allocated file name,
//! 2. records a new [`Image`] with the next image id and the new dimensions,
//! 3. projects every source annotation onto it with the next annotation ids,
//! 4. appends the table row, the image and the annotations to the in-memory
//!    output stores and checkpoints both stores to disk.
//!
//! The run stops as soon as the number of units reaches
//! `target − fractured(input)`, or when the sources run out. Source records
//! without an image record, or with an annotation that cannot be projected,
//! are skipped whole before anything is written for them.
//!
//! The unit sequence depends only on the input stores and the transform
//! list, so a resumed run can skip the units an earlier run already
//! committed. The output table is the commit record: it is written after the
//! annotation store at every checkpoint. On resume, output image records
//! with no table row belong to a checkpoint that never finished; they are
//! dropped together with their annotations and image files.

mod events;
mod report;

use std::borrow::Cow;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat};

pub use events::{AugmentEvent, EventSink, NullSink, TracingSink, UnitEvent};
pub use report::{AugmentReport, SkipReason, SkippedSource, UnitSummary};

use crate::config::AugmentConfig;
use crate::error::AugmentError;
use crate::ir::io_coco_json::{read_coco_json, write_coco_json};
use crate::ir::io_table_csv::{read_table_csv, write_table_csv};
use crate::ir::persist::write_atomic;
use crate::ir::{
    Annotation, AnnotationId, AnnotationStore, Image, ImageId, SourceRecord, TableStore,
};
use crate::naming::FilenameAllocator;
use crate::project::{check_segmentation, project_with};
use crate::transform::Transform;

/// Runs augmentation as described by `config`, reporting progress to `sink`.
///
/// # Errors
///
/// Configuration problems are reported before any file is read. I/O
/// failures, allocation exhaustion and dimension mismatches abort the run;
/// the output stores then hold the last checkpoint.
pub fn run_augmentation<S: EventSink>(
    config: &AugmentConfig,
    sink: &mut S,
) -> Result<AugmentReport, AugmentError> {
    config.validate()?;
    let paths = &config.paths;

    let original_table = read_table_csv(&paths.table)?;
    let original_store = read_coco_json(&paths.annotations)?;

    let original_fractured = original_table.fractured_count();
    let needed = config.target.saturating_sub(original_fractured);

    let (table, store, completed) = load_outputs(config, &original_table, &original_store)?;

    let mut report = AugmentReport {
        original_fractured,
        target: config.target,
        needed,
        resumed: completed.min(needed),
        ..Default::default()
    };
    sink.emit(&AugmentEvent::Started {
        original_fractured,
        target: config.target,
        needed,
        already_completed: report.resumed,
    });

    let sources = original_table.fractured_rows();
    let remaining = needed - report.resumed;
    if remaining > 0 && !sources.is_empty() {
        let mut allocator =
            FilenameAllocator::scan_dir(config.naming.clone(), &paths.images_dir)?;
        for image in &store.images {
            allocator.reserve(&image.file_name);
        }
        let names = allocator.allocate(remaining)?;

        let mut run = Run {
            config,
            original_store: &original_store,
            last_image_id: store.max_image_id(),
            last_annotation_id: store.max_annotation_id(),
            table,
            store,
            names: names.into_iter(),
            report: &mut report,
        };
        run.process(&sources, sink)?;
    }

    report.sources_exhausted = report.total_augmented() < needed;
    sink.emit(&AugmentEvent::Finished {
        augmented: report.augmented,
        total_augmented: report.total_augmented(),
        needed,
        sources_exhausted: report.sources_exhausted,
    });
    Ok(report)
}

/// Output stores to append to, and how many units they already hold.
fn load_outputs(
    config: &AugmentConfig,
    original_table: &TableStore,
    original_store: &AnnotationStore,
) -> Result<(TableStore, AnnotationStore, usize), AugmentError> {
    let paths = &config.paths;
    if config.resume && paths.table_out.is_file() && paths.annotations_out.is_file() {
        let table = read_table_csv(&paths.table_out)?;
        if table.headers() != original_table.headers() {
            return Err(AugmentError::TableCsvInvalid {
                path: paths.table_out.clone(),
                message: "columns differ from the input table; cannot resume".into(),
            });
        }
        let mut store = read_coco_json(&paths.annotations_out)?;
        let dropped = drop_uncommitted(&mut store, &table, original_store);
        if !dropped.is_empty() {
            tracing::warn!(
                count = dropped.len(),
                files = ?dropped,
                "dropping image records left by an unfinished checkpoint"
            );
            for name in &dropped {
                if Path::new(name).file_name() != Some(OsStr::new(name)) {
                    continue;
                }
                let path = paths.images_dir.join(name);
                if path.is_file() {
                    fs::remove_file(&path)?;
                }
            }
            write_coco_json(&paths.annotations_out, &store)?;
        }
        let completed = table
            .fractured_count()
            .saturating_sub(original_table.fractured_count());
        tracing::debug!(completed, "resuming from existing outputs");
        Ok((table, store, completed))
    } else {
        Ok((original_table.clone(), original_store.clone(), 0))
    }
}

/// Removes output image records that are neither original nor backed by a
/// table row, and their annotations. Returns the removed file names.
fn drop_uncommitted(
    store: &mut AnnotationStore,
    table: &TableStore,
    original: &AnnotationStore,
) -> Vec<String> {
    let committed: HashSet<&str> = table.image_ids().collect();
    let original_images: HashSet<ImageId> = original.images.iter().map(|i| i.id).collect();
    let original_annotations: HashSet<AnnotationId> =
        original.annotations.iter().map(|a| a.id).collect();

    let mut dropped = Vec::new();
    store.images.retain(|image| {
        let keep = original_images.contains(&image.id)
            || committed.contains(image.file_name.as_str());
        if !keep {
            dropped.push(image.file_name.clone());
        }
        keep
    });
    let kept: HashSet<ImageId> = store.images.iter().map(|i| i.id).collect();
    store
        .annotations
        .retain(|a| original_annotations.contains(&a.id) || kept.contains(&a.image_id));
    dropped
}

struct Run<'a> {
    config: &'a AugmentConfig,
    original_store: &'a AnnotationStore,
    table: TableStore,
    store: AnnotationStore,
    names: std::vec::IntoIter<String>,
    last_image_id: ImageId,
    last_annotation_id: AnnotationId,
    report: &'a mut AugmentReport,
}

impl Run<'_> {
    fn process<S: EventSink>(
        &mut self,
        sources: &[SourceRecord],
        sink: &mut S,
    ) -> Result<(), AugmentError> {
        let config = self.config;
        let original_store = self.original_store;
        let transforms = &config.transforms;
        let mut unit_index = 0usize;

        for source in sources {
            if self.done() {
                break;
            }

            let Some(source_image) = original_store.image_by_file_name(&source.image_id) else {
                self.skip(source, SkipReason::MissingSourceImage, sink);
                continue;
            };
            let source_annotations = original_store.annotations_for(source_image.id);
            let rings = match source_annotations
                .iter()
                .map(|&ann| check_segmentation(ann))
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(rings) => rings,
                Err(AugmentError::UnsupportedSegmentation {
                    annotation_id,
                    reason,
                }) => {
                    let reason = SkipReason::UnsupportedSegmentation {
                        annotation_id,
                        reason,
                    };
                    self.skip(source, reason, sink);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let input_path = config.paths.images_dir.join(&source.image_id);
            let (width, height) = image_size(&input_path)?;
            if (width, height) != (source_image.width, source_image.height) {
                let reason = SkipReason::SourceDimensionMismatch {
                    recorded_width: source_image.width,
                    recorded_height: source_image.height,
                    actual_width: width,
                    actual_height: height,
                };
                self.skip(source, reason, sink);
                continue;
            }

            // Whole source already committed by an earlier run.
            if unit_index + transforms.len() <= self.report.resumed {
                unit_index += transforms.len();
                continue;
            }

            let pixels = read_image(&input_path)?;
            if (pixels.width(), pixels.height()) != (width, height) {
                return Err(AugmentError::DimensionMismatch {
                    path: input_path,
                    width,
                    height,
                    actual_width: pixels.width(),
                    actual_height: pixels.height(),
                });
            }

            for transform in transforms {
                if self.done() {
                    return Ok(());
                }
                unit_index += 1;
                if unit_index <= self.report.resumed {
                    continue;
                }

                let unit = SourceUnit {
                    record: source,
                    image: source_image,
                    annotations: &source_annotations,
                    rings: &rings,
                    input_path: &input_path,
                    pixels: &pixels,
                };
                let event = self.apply(&unit, transform)?;
                sink.emit(&AugmentEvent::UnitCompleted(Box::new(event)));
            }
        }
        Ok(())
    }

    fn done(&self) -> bool {
        self.report.total_augmented() >= self.report.needed
    }

    fn skip<S: EventSink>(&mut self, source: &SourceRecord, reason: SkipReason, sink: &mut S) {
        sink.emit(&AugmentEvent::SourceSkipped {
            image_id: source.image_id.clone(),
            reason: reason.clone(),
        });
        self.report.skipped.push(SkippedSource {
            image_id: source.image_id.clone(),
            reason,
        });
    }

    /// Performs one unit and checkpoints both stores.
    fn apply(
        &mut self,
        unit: &SourceUnit<'_>,
        transform: &Transform,
    ) -> Result<UnitEvent, AugmentError> {
        let output = transform.apply_to_image(unit.pixels)?;
        let geometry = transform.geometry(unit.image.width, unit.image.height)?;

        let image_id = self
            .last_image_id
            .next()
            .ok_or(AugmentError::IdExhausted {
                kind: "image",
                last: self.last_image_id.as_u64(),
            })?;
        let mut annotation_ids = Vec::with_capacity(unit.annotations.len());
        let mut last_annotation_id = self.last_annotation_id;
        for _ in unit.annotations {
            last_annotation_id =
                last_annotation_id
                    .next()
                    .ok_or(AugmentError::IdExhausted {
                        kind: "annotation",
                        last: last_annotation_id.as_u64(),
                    })?;
            annotation_ids.push(last_annotation_id);
        }

        let file_name = self
            .names
            .next()
            .ok_or_else(|| AugmentError::AllocationExhausted {
                path: self.config.paths.images_dir.clone(),
                requested: self.report.augmented + 1,
                available: self.report.augmented,
            })?;
        let output_path = self.config.paths.images_dir.join(&file_name);
        write_image(&output_path, &output)?;

        let new_image = Image::new(image_id, file_name.as_str(), output.width(), output.height());
        verify_dimensions(&output_path, &new_image)?;

        let new_annotations: Vec<Annotation> = unit
            .annotations
            .iter()
            .zip(unit.rings)
            .zip(&annotation_ids)
            .map(|((source, ring), &id)| project_with(source, ring, &geometry, id, image_id))
            .collect();

        let new_row = self.table.with_image_id(unit.record, &file_name);
        let event_rows = (
            self.table.labelled(&unit.record.values),
            self.table.labelled(&new_row),
        );
        self.table.append(new_row)?;
        self.store.images.push(new_image.clone());
        self.store.annotations.extend(new_annotations.iter().cloned());
        self.checkpoint()?;

        self.last_image_id = image_id;
        self.last_annotation_id = last_annotation_id;
        self.report.augmented += 1;
        self.report.wrote_outputs = true;
        self.report.units.push(UnitSummary {
            source: unit.record.image_id.clone(),
            transform: transform.to_string(),
            file_name,
            image_id: image_id.as_u64(),
            width: new_image.width,
            height: new_image.height,
            annotation_ids: new_annotations.iter().map(|a| a.id.as_u64()).collect(),
        });

        Ok(UnitEvent {
            transform: *transform,
            input_path: unit.input_path.display().to_string(),
            output_path: output_path.display().to_string(),
            input_image: unit.image.clone(),
            new_image,
            input_annotations: unit.annotations.iter().map(|a| (*a).clone()).collect(),
            new_annotations,
            input_row: event_rows.0,
            new_row: event_rows.1,
            completed: self.report.total_augmented(),
            needed: self.report.needed,
        })
    }

    fn checkpoint(&self) -> Result<(), AugmentError> {
        write_coco_json(&self.config.paths.annotations_out, &self.store)?;
        write_table_csv(&self.config.paths.table_out, &self.table)
    }
}

/// One source record with everything loaded for it.
struct SourceUnit<'a> {
    record: &'a SourceRecord,
    image: &'a Image,
    annotations: &'a [&'a Annotation],
    rings: &'a [&'a [f64]],
    input_path: &'a Path,
    pixels: &'a DynamicImage,
}

// ============================================================================
// Image files
// ============================================================================

fn read_image(path: &Path) -> Result<DynamicImage, AugmentError> {
    image::open(path).map_err(|source| AugmentError::ImageRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Encodes `image` in the format named by the file extension and replaces
/// `path` atomically. Alpha is dropped for formats that cannot store it.
pub(crate) fn write_image(path: &Path, image: &DynamicImage) -> Result<(), AugmentError> {
    let write_err = |source| AugmentError::ImageWrite {
        path: path.to_path_buf(),
        source,
    };
    let format = ImageFormat::from_path(path).map_err(write_err)?;

    let encodable = match (format, image.color()) {
        (ImageFormat::Jpeg, ColorType::La8 | ColorType::La16) => {
            Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8()))
        }
        (ImageFormat::Jpeg, color) if color.has_alpha() => {
            Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
        }
        _ => Cow::Borrowed(image),
    };

    write_atomic(path, |writer| {
        encodable.write_to(writer, format).map_err(write_err)
    })
}

/// Width and height from the file header, without decoding pixels.
fn image_size(path: &Path) -> Result<(u32, u32), AugmentError> {
    let size = imagesize::size(path).map_err(|source| AugmentError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((size.width as u32, size.height as u32))
}

/// Checks the header of the written file against its image record.
fn verify_dimensions(path: &Path, record: &Image) -> Result<(), AugmentError> {
    let (actual_width, actual_height) = image_size(path)?;
    if (actual_width, actual_height) != (record.width, record.height) {
        return Err(AugmentError::DimensionMismatch {
            path: path.to_path_buf(),
            width: record.width,
            height: record.height,
            actual_width,
            actual_height,
        });
    }
    Ok(())
}
