//! Run report for the augment command.

use std::fmt;

use serde::Serialize;

/// Why a source record produced no units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// No image record in the annotation store has this file name.
    MissingSourceImage,
    /// One of the image's annotations cannot be projected.
    UnsupportedSegmentation { annotation_id: u64, reason: String },
    /// The image file's size differs from its image record.
    SourceDimensionMismatch {
        recorded_width: u32,
        recorded_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingSourceImage => {
                write!(f, "no image record with this file name")
            }
            SkipReason::UnsupportedSegmentation {
                annotation_id,
                reason,
            } => write!(f, "annotation {}: {}", annotation_id, reason),
            SkipReason::SourceDimensionMismatch {
                recorded_width,
                recorded_height,
                actual_width,
                actual_height,
            } => write!(
                f,
                "file is {}x{} but its record says {}x{}",
                actual_width, actual_height, recorded_width, recorded_height
            ),
        }
    }
}

/// A source record that was skipped.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedSource {
    pub image_id: String,
    pub reason: SkipReason,
}

/// What one completed unit produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitSummary {
    /// File name of the source image.
    pub source: String,
    /// Compact transform form, e.g. `rotate:90`.
    pub transform: String,
    /// File name of the written image.
    pub file_name: String,
    pub image_id: u64,
    pub width: u32,
    pub height: u32,
    pub annotation_ids: Vec<u64>,
}

/// Outcome of an augment run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AugmentReport {
    /// Fractured rows in the input table.
    pub original_fractured: usize,
    pub target: usize,
    /// Units required to reach `target` from the input table.
    pub needed: usize,
    /// Units found already completed in resumed outputs.
    pub resumed: usize,
    /// Units completed by this run.
    pub augmented: usize,
    /// Source records that ran out before `needed` was reached.
    pub sources_exhausted: bool,
    /// Whether this run wrote anything.
    pub wrote_outputs: bool,
    pub skipped: Vec<SkippedSource>,
    pub units: Vec<UnitSummary>,
}

impl AugmentReport {
    /// Completed units across this and earlier runs.
    pub fn total_augmented(&self) -> usize {
        self.resumed + self.augmented
    }

    /// Fractured rows in the output table.
    pub fn final_fractured(&self) -> usize {
        self.original_fractured + self.total_augmented()
    }
}

impl fmt::Display for AugmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Original fractured images: {}", self.original_fractured)?;
        writeln!(
            f,
            "Augmentations needed: {} (target {})",
            self.needed, self.target
        )?;
        if self.resumed > 0 {
            writeln!(f, "Resumed after {} completed augmentation(s)", self.resumed)?;
        }
        writeln!(
            f,
            "Augmented this run: {} (total {}/{})",
            self.augmented,
            self.total_augmented(),
            self.needed
        )?;
        writeln!(f, "Fractured images now: {}", self.final_fractured())?;

        if !self.wrote_outputs {
            writeln!(f)?;
            writeln!(f, "Nothing to do; no files were written.")?;
        }

        if self.sources_exhausted {
            writeln!(f)?;
            writeln!(
                f,
                "Source records ran out {} short of the target.",
                self.needed.saturating_sub(self.total_augmented())
            )?;
        }

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped sources ({}):", self.skipped.len())?;
            for skip in &self.skipped {
                writeln!(f, "  - {}: {}", skip.image_id, skip.reason)?;
            }
        }

        Ok(())
    }
}
