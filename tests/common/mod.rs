#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use augsync::config::{AugmentConfig, DatasetPaths};
use augsync::naming::FilenamePattern;
use augsync::transform::Transform;
use image::{Rgb, RgbImage};
use serde_json::{json, Value};

/// A small dataset on disk: an image directory, a table and an annotation
/// store, laid out like the real one.
pub struct Fixture {
    pub dir: tempfile::TempDir,
    images: Vec<Value>,
    annotations: Vec<Value>,
    rows: Vec<String>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(dir.path().join("images")).expect("create image dir");
        Self {
            dir,
            images: Vec::new(),
            annotations: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root().join("images")
    }

    pub fn table_path(&self) -> PathBuf {
        self.root().join("dataset.csv")
    }

    pub fn table_out_path(&self) -> PathBuf {
        self.root().join("dataset_augmented.csv")
    }

    pub fn annotations_path(&self) -> PathBuf {
        self.root().join("coco.json")
    }

    pub fn annotations_out_path(&self) -> PathBuf {
        self.root().join("coco_augmented.json")
    }

    /// Adds an image file, its image record, its table row and one
    /// annotation per ring.
    pub fn add_image(
        &mut self,
        id: u64,
        file_name: &str,
        (width, height): (u32, u32),
        fractured: bool,
        rings: &[Vec<f64>],
    ) -> &mut Self {
        write_png(&self.images_dir().join(file_name), width, height);
        self.add_record(id, file_name, (width, height), fractured, rings)
    }

    /// Like [`Fixture::add_image`] but without writing the image file.
    pub fn add_record(
        &mut self,
        id: u64,
        file_name: &str,
        (width, height): (u32, u32),
        fractured: bool,
        rings: &[Vec<f64>],
    ) -> &mut Self {
        self.images.push(json!({
            "id": id,
            "width": width,
            "height": height,
            "file_name": file_name,
            "license": 1,
        }));
        for ring in rings {
            let ann_id = self.annotations.len() as u64 + 1;
            self.annotations.push(json!({
                "id": ann_id,
                "image_id": id,
                "category_id": 1,
                "segmentation": [ring],
                "bbox": [0.0, 0.0, 1.0, 1.0],
                "area": 1.0,
                "iscrowd": 0,
            }));
        }
        self.add_row(file_name, fractured)
    }

    /// Adds a table row with no matching image record.
    pub fn add_row(&mut self, file_name: &str, fractured: bool) -> &mut Self {
        let n = self.rows.len();
        self.rows.push(format!(
            "{},{},{},{}",
            file_name,
            if fractured { 1 } else { 0 },
            20 + n,
            if n % 2 == 0 { "F" } else { "M" }
        ));
        self
    }

    /// Adds a raw annotation record.
    pub fn add_annotation(&mut self, annotation: Value) -> &mut Self {
        self.annotations.push(annotation);
        self
    }

    /// Writes the table and the annotation store.
    pub fn write_stores(&self) {
        let mut csv = String::from("image_id,fractured,age,sex\n");
        for row in &self.rows {
            csv.push_str(row);
            csv.push('\n');
        }
        fs::write(self.table_path(), csv).expect("write table");

        let store = json!({
            "info": {"description": "fixture"},
            "images": self.images,
            "annotations": self.annotations,
            "categories": [{"id": 1, "name": "fracture"}],
        });
        fs::write(
            self.annotations_path(),
            serde_json::to_string_pretty(&store).expect("serialize store"),
        )
        .expect("write store");
    }

    /// A config pointing at this fixture, with PNG output and no log file.
    pub fn config(&self, target: usize, transforms: Vec<Transform>) -> AugmentConfig {
        AugmentConfig {
            target,
            transforms,
            paths: DatasetPaths {
                images_dir: self.images_dir(),
                table: self.table_path(),
                table_out: self.table_out_path(),
                annotations: self.annotations_path(),
                annotations_out: self.annotations_out_path(),
                log_file: None,
            },
            naming: FilenamePattern {
                extension: "png".into(),
                ..Default::default()
            },
            resume: false,
        }
    }

    pub fn read_out_store(&self) -> Value {
        let text = fs::read_to_string(self.annotations_out_path()).expect("read output store");
        serde_json::from_str(&text).expect("parse output store")
    }

    pub fn read_out_table(&self) -> Vec<Vec<String>> {
        let mut reader = csv::Reader::from_path(self.table_out_path()).expect("open output table");
        reader
            .records()
            .map(|r| {
                r.expect("table row")
                    .iter()
                    .map(str::to_string)
                    .collect()
            })
            .collect()
    }

    /// File names in the image directory, sorted.
    pub fn image_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.images_dir())
            .expect("read image dir")
            .map(|e| {
                e.expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

/// Writes a PNG with a simple gradient so transforms have something to move.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 128])
    });
    img.save(path).expect("write png file");
}

/// A triangle well inside a `width × height` image.
pub fn triangle(width: u32, height: u32) -> Vec<f64> {
    let (w, h) = (width as f64, height as f64);
    vec![w * 0.2, h * 0.2, w * 0.6, h * 0.25, w * 0.4, h * 0.7]
}
