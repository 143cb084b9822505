//! Run configuration.
//!
//! An [`AugmentConfig`] is built from defaults, optionally overlaid by a YAML
//! file, then by command-line flags, and is validated before any file is
//! touched. It is passed explicitly into the orchestrator.
//!
//! ```yaml
//! target: 3000
//! transforms:
//!   - rotate: 90
//!   - flip: horizontal
//!   - shear: 0.2
//!   - brightness: 0.8
//! paths:
//!   images_dir: images/Fractured
//!   table: dataset.csv
//!   table_out: dataset_augmented.csv
//! naming:
//!   prefix: IMG
//!   digits: 7
//!   extension: jpg
//! resume: false
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AugmentError;
use crate::naming::FilenamePattern;
use crate::transform::{default_transforms, Transform};

/// Default positive-class count to grow the dataset to.
pub const DEFAULT_TARGET: usize = 3000;

/// Everything a run needs to know.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentConfig {
    /// Number of fractured rows the output table should reach.
    pub target: usize,
    /// Transforms applied to each source image, in order.
    pub transforms: Vec<Transform>,
    pub paths: DatasetPaths,
    pub naming: FilenamePattern,
    /// Continue from existing output stores instead of starting over.
    pub resume: bool,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET,
            transforms: default_transforms(),
            paths: DatasetPaths::default(),
            naming: FilenamePattern::default(),
            resume: false,
        }
    }
}

/// Input and output locations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetPaths {
    /// Directory holding the source images; augmented images are written
    /// here too.
    pub images_dir: PathBuf,
    pub table: PathBuf,
    pub table_out: PathBuf,
    pub annotations: PathBuf,
    pub annotations_out: PathBuf,
    /// Append-mode log file; `None` logs to stderr only.
    pub log_file: Option<PathBuf>,
}

impl Default for DatasetPaths {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("images/Fractured"),
            table: PathBuf::from("dataset.csv"),
            table_out: PathBuf::from("dataset_augmented.csv"),
            annotations: PathBuf::from("Annotations/COCO JSON/COCO_fracture_masks.json"),
            annotations_out: PathBuf::from(
                "Annotations/COCO JSON/COCO_fracture_masks_augmented.json",
            ),
            log_file: Some(PathBuf::from("augmentation_logs.log")),
        }
    }
}

impl AugmentConfig {
    /// Parses a YAML config document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Checks the configuration before any work is done.
    ///
    /// # Errors
    /// [`AugmentError::InvalidConfig`] for an empty transform list, bad
    /// parameters, a bad naming pattern, or outputs that would overwrite
    /// inputs; [`AugmentError::UnsupportedTransform`] for transforms that
    /// cannot keep annotations in sync.
    pub fn validate(&self) -> Result<(), AugmentError> {
        if self.transforms.is_empty() {
            return Err(AugmentError::InvalidConfig {
                message: "at least one transform is required".into(),
            });
        }
        for transform in &self.transforms {
            transform.validate()?;
        }
        self.naming.validate()?;

        let p = &self.paths;
        if same_file(&p.table, &p.table_out) {
            return Err(AugmentError::InvalidConfig {
                message: format!(
                    "table output must differ from its input ({})",
                    p.table.display()
                ),
            });
        }
        if same_file(&p.annotations, &p.annotations_out) {
            return Err(AugmentError::InvalidConfig {
                message: format!(
                    "annotation output must differ from its input ({})",
                    p.annotations.display()
                ),
            });
        }
        Ok(())
    }
}

/// True when `a` and `b` name the same file once `.`/`..` and symlinks are
/// resolved. Paths that do not exist yet are resolved through their parent.
fn same_file(a: &Path, b: &Path) -> bool {
    a == b || resolve(a) == resolve(b)
}

fn resolve(path: &Path) -> PathBuf {
    if let Ok(full) = fs::canonicalize(path) {
        return full;
    }
    let lexical: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let (Some(parent), Some(name)) = (lexical.parent(), lexical.file_name()) else {
        return lexical;
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    match fs::canonicalize(parent) {
        Ok(full) => full.join(name),
        Err(_) => lexical,
    }
}

/// Reads an [`AugmentConfig`] from a YAML file.
pub fn load_config(path: &Path) -> Result<AugmentConfig, AugmentError> {
    let text = fs::read_to_string(path)?;
    AugmentConfig::from_yaml_str(&text).map_err(|source| AugmentError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::FlipDirection;

    #[test]
    fn defaults_match_the_dataset_layout() {
        let config = AugmentConfig::default();
        assert_eq!(config.target, 3000);
        assert_eq!(config.transforms.len(), 4);
        assert_eq!(config.paths.images_dir, PathBuf::from("images/Fractured"));
        assert_eq!(config.naming.format(12), "IMG0000012.jpg");
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn yaml_overrides_only_what_it_names() {
        let config = AugmentConfig::from_yaml_str(
            "target: 10\ntransforms:\n  - flip: horizontal\npaths:\n  images_dir: imgs\n",
        )
        .unwrap();
        assert_eq!(config.target, 10);
        assert_eq!(
            config.transforms,
            vec![Transform::Flip {
                direction: FlipDirection::Horizontal
            }]
        );
        assert_eq!(config.paths.images_dir, PathBuf::from("imgs"));
        assert_eq!(config.paths.table, PathBuf::from("dataset.csv"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AugmentConfig::from_yaml_str("targt: 10\n").is_err());
    }

    #[test]
    fn vertical_flip_fails_validation() {
        let config = AugmentConfig {
            transforms: vec![Transform::Flip {
                direction: FlipDirection::Vertical,
            }],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AugmentError::UnsupportedTransform { .. })
        ));
    }

    #[test]
    fn outputs_must_not_overwrite_inputs() {
        let mut config = AugmentConfig::default();
        config.paths.table_out = config.paths.table.clone();
        assert!(matches!(
            config.validate(),
            Err(AugmentError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn outputs_spelled_differently_still_collide() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir(dir.path().join("sub")).expect("create sub dir");
        fs::write(dir.path().join("dataset.csv"), "image_id,fractured\n").expect("write table");

        let mut config = AugmentConfig::default();
        config.paths.table = dir.path().join("dataset.csv");
        config.paths.table_out = dir.path().join(".").join("dataset.csv");
        assert!(matches!(
            config.validate(),
            Err(AugmentError::InvalidConfig { .. })
        ));

        config.paths.table_out = dir.path().join("sub").join("..").join("dataset.csv");
        assert!(matches!(
            config.validate(),
            Err(AugmentError::InvalidConfig { .. })
        ));

        // Neither file exists yet.
        config.paths.table = dir.path().join("coco.json");
        config.paths.table_out = dir.path().join("sub").join("..").join("coco.json");
        assert!(config.validate().is_err());

        config.paths.table_out = dir.path().join("dataset_augmented.csv");
        config.paths.table = dir.path().join("dataset.csv");
        config.validate().expect("distinct outputs are fine");
    }

    #[test]
    fn load_config_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("augment.yaml");
        fs::write(&path, "target: [oops\n").expect("write config");
        match load_config(&path) {
            Err(AugmentError::ConfigParse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }
}
