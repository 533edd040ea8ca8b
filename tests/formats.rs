//! One round trip per codec family through the local facade.

#![cfg(all(feature = "tabular", feature = "image", feature = "document"))]

use easy_env::codec::image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use easy_env::codec::polars::prelude::*;
use easy_env::codec::OfficePackage;
use easy_env::{Disk, Payload};
use tempfile::TempDir;

fn frame() -> DataFrame {
    df!(
        "a" => [1i64, 2, 3, 4],
        "b" => ["w", "x", "y", "z"],
    )
    .unwrap()
}

#[test]
fn csv_keeps_columns_and_rows() {
    let dir = TempDir::new().unwrap();
    let disk = Disk::new(dir.path());

    disk.save(&Payload::from(frame()), "t.csv").unwrap();
    let loaded: DataFrame = disk.load_as("t.csv").unwrap();

    let mut names: Vec<String> = loaded
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(loaded.height(), frame().height());
}

#[test]
fn tabular_formats_round_trip() {
    let dir = TempDir::new().unwrap();
    let disk = Disk::new(dir.path());

    for path in ["t.parquet", "t.xlsx"] {
        disk.save(&Payload::from(frame()), path).unwrap();
        let loaded: DataFrame = disk.load_as(path).unwrap();
        assert!(loaded.equals(&frame()), "{path}");
    }
}

#[test]
fn png_round_trip_is_exact() {
    let dir = TempDir::new().unwrap();
    let disk = Disk::new(dir.path());
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(5, 3, |x, y| {
        Rgb([x as u8 * 40, y as u8 * 80, 7])
    }));

    disk.save(&Payload::from(image.clone()), "i.png").unwrap();
    let loaded: DynamicImage = disk.load_as("i.png").unwrap();
    assert_eq!(loaded.to_rgb8(), image.to_rgb8());

    disk.save(&Payload::from(image), "i.jpg").unwrap();
    let loaded: DynamicImage = disk.load_as("i.jpg").unwrap();
    assert_eq!(loaded.dimensions(), (5, 3));
}

#[test]
fn docx_round_trip_keeps_paragraphs() {
    let dir = TempDir::new().unwrap();
    let disk = Disk::new(dir.path());

    let package = OfficePackage::docx_from_paragraphs(&["Intro", "Body"]);
    disk.save(&Payload::from(package), "d.docx").unwrap();

    let loaded: OfficePackage = disk.load_as("d.docx").unwrap();
    assert_eq!(loaded.paragraphs().unwrap(), vec!["Intro", "Body"]);
}
