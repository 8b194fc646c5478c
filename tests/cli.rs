//! CLI integration tests
//!
//! Runs the `pdfcleaner` binary against temporary folders.

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Temporary workspace with an empty config file
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pdfcleaner.toml"), "").unwrap();
    dir
}

fn pdfcleaner(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pdfcleaner").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn write_pages(folder: &Path, count: usize) {
    std::fs::create_dir_all(folder).unwrap();
    for index in 0..count {
        RgbImage::from_pixel(20, 30, Rgb([255, 255, 255]))
            .save(folder.join(format!("source_image_{:03}.jpg", index)))
            .unwrap();
    }
}

// CLI-001: recombine joins every consecutive page image
#[test]
fn test_recombine_creates_pdf() {
    let dir = workspace();
    let images = dir.path().join("images");
    write_pages(&images, 3);

    pdfcleaner(dir.path())
        .args(["recombine", "-c", "pdfcleaner.toml", "--input-images", "images", "-o", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 pages"));

    let output = dir.path().join("out").join("Recombined_output.pdf");
    let document = lopdf::Document::load(&output).unwrap();
    assert_eq!(document.get_pages().len(), 3);
}

// CLI-002: a fixed count larger than the available images fails
#[test]
fn test_recombine_count_mismatch() {
    let dir = workspace();
    write_pages(&dir.path().join("images"), 2);

    pdfcleaner(dir.path())
        .args([
            "recombine",
            "-c",
            "pdfcleaner.toml",
            "--input-images",
            "images",
            "-o",
            "out",
            "--count",
            "32",
        ])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("source_image_002.jpg"));

    assert!(!dir.path().join("out").join("Recombined_output.pdf").exists());
}

// CLI-003: recombining an empty folder is a precondition failure
#[test]
fn test_recombine_empty_folder() {
    let dir = workspace();
    std::fs::create_dir_all(dir.path().join("images")).unwrap();

    pdfcleaner(dir.path())
        .args(["recombine", "-c", "pdfcleaner.toml", "--input-images", "images", "-o", "out"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No page images"));
}

// CLI-008: a non-positive resolution is rejected before encoding
#[test]
fn test_recombine_zero_resolution() {
    let dir = workspace();
    write_pages(&dir.path().join("images"), 1);

    pdfcleaner(dir.path())
        .args([
            "recombine",
            "-c",
            "pdfcleaner.toml",
            "--input-images",
            "images",
            "-o",
            "out",
            "--resolution",
            "0",
        ])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Invalid resolution"));

    assert!(!dir.path().join("out").join("Recombined_output.pdf").exists());
}

// CLI-004: missing source PDF
#[test]
fn test_clean_missing_source() {
    let dir = workspace();

    pdfcleaner(dir.path())
        .args([
            "clean",
            "-c",
            "pdfcleaner.toml",
            "--input-folder",
            ".",
            "--input-file",
            "missing.pdf",
            "-o",
            "out",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Source PDF not found"));
}

// CLI-005: missing required option
#[test]
fn test_clean_missing_output_folder() {
    let dir = workspace();

    pdfcleaner(dir.path())
        .args([
            "clean",
            "-c",
            "pdfcleaner.toml",
            "--input-folder",
            ".",
            "--input-file",
            "exam.pdf",
        ])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("output_folder"));
}

// CLI-006: options come from the config file
#[test]
fn test_clean_dry_run_uses_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("custom.toml"),
        "input_pdf_folder = \"scans\"\ninput_pdf_file = \"exam.pdf\"\noutput_folder = \"out\"\ndpi = 150\n",
    )
    .unwrap();

    pdfcleaner(dir.path())
        .args(["clean", "-c", "custom.toml", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exam.pdf"))
        .stdout(predicate::str::contains("DPI: 150"));

    assert!(!dir.path().join("out").exists());
}

// CLI-007: tweak needs a source argument
#[test]
fn test_tweak_requires_source() {
    let dir = workspace();
    pdfcleaner(dir.path()).arg("tweak").assert().code(2);
}

#[test]
fn test_info() {
    let dir = workspace();
    pdfcleaner(dir.path())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("pdfcleaner v"))
        .stdout(predicate::str::contains("pdftoppm"));
}
