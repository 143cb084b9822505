use std::path::PathBuf;
use thiserror::Error;

/// The main error type for augsync operations.
#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse annotation store from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write annotation store to {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse table CSV from {path}: {source}")]
    TableCsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write table CSV to {path}: {source}")]
    TableCsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid table CSV {path}: {message}")]
    TableCsvInvalid { path: PathBuf, message: String },

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error(
        "Image {path} is {actual_width}x{actual_height} on disk but its record says {width}x{height}"
    )]
    DimensionMismatch {
        path: PathBuf,
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Failed to traverse image directory {path}: {message}")]
    ImageDirInvalid { path: PathBuf, message: String },

    #[error(
        "Cannot allocate {requested} file name(s) in {path}: only {available} unused name(s) remain"
    )]
    AllocationExhausted {
        path: PathBuf,
        requested: usize,
        available: usize,
    },

    #[error("No {kind} id is left after {last}")]
    IdExhausted { kind: &'static str, last: u64 },

    #[error("Invalid transform '{spec}': {message}")]
    InvalidTransform { spec: String, message: String },

    #[error("Unsupported transform '{transform}': {reason}")]
    UnsupportedTransform { transform: String, reason: String },

    #[error("Unsupported segmentation on annotation {annotation_id}: {reason}")]
    UnsupportedSegmentation { annotation_id: u64, reason: String },

    #[error("Failed to parse config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },

    #[error("Failed to render report: {0}")]
    ReportRender(#[source] serde_json::Error),
}
