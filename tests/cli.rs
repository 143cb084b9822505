mod common;

use std::fs;

use assert_cmd::Command;
use common::{triangle, Fixture};
use predicates::prelude::*;

fn fixture() -> Fixture {
    let mut fx = Fixture::new();
    fx.add_image(1, "IMG0000001.png", (20, 10), true, &[triangle(20, 10)])
        .add_image(2, "IMG0000002.png", (20, 10), false, &[triangle(20, 10)]);
    fx.write_stores();
    fx
}

fn augment_cmd(fx: &Fixture) -> Command {
    let mut cmd = Command::cargo_bin("augsync").unwrap();
    cmd.current_dir(fx.root()).args([
        "augment",
        "--table",
        "dataset.csv",
        "--table-out",
        "dataset_augmented.csv",
        "--annotations",
        "coco.json",
        "--annotations-out",
        "coco_augmented.json",
        "--images-dir",
        "images",
        "--extension",
        "png",
        "--no-log-file",
    ]);
    cmd
}

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("augsync").unwrap();
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("augsync --help"));
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("augsync").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("augsync 0.1.0\n");
}

// Augment subcommand tests

#[test]
fn augment_text_report() {
    let fx = fixture();
    let mut cmd = augment_cmd(&fx);
    cmd.args(["--target", "3", "--transform", "flip:horizontal"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Original fractured images: 1"))
        .stdout(predicate::str::contains("Augmented this run: 1 (total 1/2)"));

    assert!(fx.images_dir().join("IMG0000003.png").is_file());
    assert_eq!(fx.read_out_table().len(), 3);
}

#[test]
fn augment_json_report() {
    let fx = fixture();
    let mut cmd = augment_cmd(&fx);
    cmd.args(["--target", "3", "--output", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let report: serde_json::Value = serde_json::from_slice(&output).expect("json report");
    assert_eq!(report["augmented"], 2);
    assert_eq!(report["units"][0]["transform"], "rotate:90");
    assert_eq!(report["units"][0]["width"], 10);
    assert_eq!(report["units"][1]["file_name"], "IMG0000004.png");
}

#[test]
fn augment_writes_log_file() {
    let fx = fixture();
    let mut cmd = Command::cargo_bin("augsync").unwrap();
    cmd.current_dir(fx.root()).args([
        "augment",
        "--table",
        "dataset.csv",
        "--annotations",
        "coco.json",
        "--annotations-out",
        "coco_augmented.json",
        "--images-dir",
        "images",
        "--extension",
        "png",
        "--target",
        "2",
        "--transform",
        "shear:0.2",
        "--log-file",
        "run.log",
    ]);
    cmd.assert().success();

    let log = fs::read_to_string(fx.root().join("run.log")).expect("read log file");
    assert!(log.contains("Augmentation: shear:0.2"));
    assert!(log.contains("New CSV row: {image_id=IMG0000003.png"));
    assert!(log.contains("Total augmented: 1/1"));
}

#[test]
fn augment_with_config_file() {
    let fx = fixture();
    fs::write(
        fx.root().join("augment.yaml"),
        "target: 2\ntransforms:\n  - brightness: {factor: 0.5}\n",
    )
    .unwrap();
    let mut cmd = augment_cmd(&fx);
    cmd.args(["--config", "augment.yaml", "--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("brightness:0.5"));
}

#[test]
fn augment_rejects_bad_transform() {
    let fx = fixture();
    let mut cmd = augment_cmd(&fx);
    cmd.args(["--transform", "blur:3"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown transform"));
}

#[test]
fn augment_rejects_vertical_flip() {
    let fx = fixture();
    let mut cmd = augment_cmd(&fx);
    cmd.args(["--transform", "flip:vertical"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error: Unsupported transform"));
    assert!(!fx.table_out_path().exists());
}

#[test]
fn augment_missing_table_fails() {
    let fx = Fixture::new();
    let mut cmd = augment_cmd(&fx);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// Prune subcommand tests

#[test]
fn prune_deletes_listed_images_and_rows() {
    let fx = fixture();
    fs::write(
        fx.root().join("corrupted_images.txt"),
        "IMG0000002.png\nIMG0000077.png\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("augsync").unwrap();
    cmd.current_dir(fx.root()).args([
        "prune",
        "--list",
        "corrupted_images.txt",
        "--images-dir",
        "images",
        "--table",
        "dataset.csv",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 images."))
        .stdout(predicate::str::contains("IMG0000077.png"))
        .stdout(predicate::str::contains("Removed 1 records from dataset.csv."));

    assert!(!fx.images_dir().join("IMG0000002.png").exists());
    let table = fs::read_to_string(fx.table_path()).unwrap();
    assert!(!table.contains("IMG0000002.png"));
}

#[test]
fn prune_missing_list_fails() {
    let fx = fixture();
    let mut cmd = Command::cargo_bin("augsync").unwrap();
    cmd.current_dir(fx.root())
        .args(["prune", "--list", "nope.txt", "--images-dir", "images"]);
    cmd.assert().failure();
}
