//! Structured events emitted while a run progresses.
//!
//! The orchestrator reports through an injected [`EventSink`]. The CLI uses
//! [`TracingSink`], which turns each event into log lines; tests collect
//! events into a `Vec`.

use serde::Serialize;

use super::report::SkipReason;
use crate::ir::{Annotation, Image};
use crate::transform::Transform;

/// Receives events from a run, in order.
pub trait EventSink {
    fn emit(&mut self, event: &AugmentEvent);
}

impl EventSink for Vec<AugmentEvent> {
    fn emit(&mut self, event: &AugmentEvent) {
        self.push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &AugmentEvent) {
        (**self).emit(event);
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AugmentEvent) {}
}

/// One observable step of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AugmentEvent {
    /// Inputs are loaded and the amount of work is known.
    Started {
        original_fractured: usize,
        target: usize,
        needed: usize,
        already_completed: usize,
    },
    /// A source record produced no units.
    SourceSkipped { image_id: String, reason: SkipReason },
    /// One unit of work was written and checkpointed.
    UnitCompleted(Box<UnitEvent>),
    /// The run is over.
    Finished {
        augmented: usize,
        total_augmented: usize,
        needed: usize,
        sources_exhausted: bool,
    },
}

/// Everything written for one unit, with the records it was derived from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitEvent {
    pub transform: Transform,
    pub input_path: String,
    pub output_path: String,
    pub input_image: Image,
    pub new_image: Image,
    pub input_annotations: Vec<Annotation>,
    pub new_annotations: Vec<Annotation>,
    pub input_row: Vec<(String, String)>,
    pub new_row: Vec<(String, String)>,
    /// Units completed so far, including ones from earlier runs.
    pub completed: usize,
    pub needed: usize,
}

/// Logs events through `tracing`, one line per sub-step.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &AugmentEvent) {
        match event {
            AugmentEvent::Started {
                original_fractured,
                target,
                needed,
                already_completed,
            } => {
                tracing::info!(
                    original_fractured,
                    target,
                    "Original fractured images: {}",
                    original_fractured
                );
                tracing::info!(
                    needed,
                    already_completed,
                    "Augmentations needed: {}",
                    needed
                );
            }
            AugmentEvent::SourceSkipped { image_id, reason } => {
                tracing::warn!(image_id = %image_id, "Skipping source {}: {}", image_id, reason);
            }
            AugmentEvent::UnitCompleted(unit) => log_unit(unit),
            AugmentEvent::Finished {
                augmented,
                total_augmented,
                needed,
                sources_exhausted,
            } => {
                if *sources_exhausted && total_augmented < needed {
                    tracing::warn!(
                        total_augmented,
                        needed,
                        "Sources exhausted after {}/{} augmentations",
                        total_augmented,
                        needed
                    );
                }
                tracing::info!(augmented, total_augmented, needed, "Augmentation complete");
            }
        }
    }
}

fn log_unit(unit: &UnitEvent) {
    tracing::info!(transform = %unit.transform, "Augmentation: {}", unit.transform);
    tracing::info!("Input: {}", unit.input_path);
    tracing::info!("Output: {}", unit.output_path);
    tracing::info!("Input image entry for JSON: {}", to_json(&unit.input_image));
    tracing::info!("New image entry for JSON: {}", to_json(&unit.new_image));
    for ann in &unit.input_annotations {
        tracing::info!("Input annotation entry for JSON: {}", to_json(ann));
    }
    for ann in &unit.new_annotations {
        tracing::info!("New annotation entry for JSON: {}", to_json(ann));
    }
    tracing::info!("Input CSV row: {}", format_row(&unit.input_row));
    tracing::info!("New CSV row: {}", format_row(&unit.new_row));
    tracing::info!(
        completed = unit.completed,
        needed = unit.needed,
        "Total augmented: {}/{}",
        unit.completed,
        unit.needed
    );
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

fn format_row(row: &[(String, String)]) -> String {
    let cells: Vec<String> = row.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{{{}}}", cells.join(", "))
}
