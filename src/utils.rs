//! Utility functions for reporting results and producing synthetic data.
use crate::evaluator::AnnotatedImage;
use crate::report::Report;
use crate::tasks::{InferenceOutput, TaskOutput};
use anyhow::{anyhow, Context, Result};
use csv::WriterBuilder;
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

/// Print the report as a two-column table.
pub fn print_report_table(report: &Report) {
    let width = report.metrics.iter().map(|(l, _)| l.len()).max().unwrap_or(0).max(6);
    let rule = format!("+-{}-+------------+", "-".repeat(width));
    println!("\nEvaluation Summary:");
    println!("{}", rule);
    println!("| {:<width$} | {:>10} |", "Metric", "Value", width = width);
    println!("{}", rule);
    for (label, value) in &report.metrics {
        println!("| {:<width$} | {:>10.4} |", label, value, width = width);
    }
    println!("{}", rule);
}

/// Write each annotated image to `dir/<name>`, creating `dir` if needed.
pub fn save_annotated_images(dir: &Path, images: &[AnnotatedImage]) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| anyhow!("Failed to create {}: {}", dir.display(), e))?;
    for annotated in images {
        let path = dir.join(&annotated.name);
        annotated
            .image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Channel intensity encoding a positive label in synthetic images.
const ON: u8 = 220;
const OFF: u8 = 30;

/// Generate a labeled toy dataset under `dir`: `images/*.png` plus
/// `train.txt` and `val.txt` manifests with `n_samples` lines each.
///
/// The green channel encodes the road label and the blue channel the
/// crossing label, so [`synthetic_classifier`] scores it perfectly.
pub fn generate_synthetic_dataset(dir: &Path, n_samples: usize, width: u32, height: u32, seed: u64) -> Result<()> {
    let image_dir = dir.join("images");
    fs::create_dir_all(&image_dir)
        .map_err(|e| anyhow!("Failed to create {}: {}", image_dir.display(), e))?;
    let mut rng = StdRng::seed_from_u64(seed);
    for split in ["train", "val"] {
        let manifest = dir.join(format!("{}.txt", split));
        let mut writer = WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .from_path(&manifest)
            .map_err(|e| anyhow!("Failed to create {}: {}", manifest.display(), e))?;
        for i in 0..n_samples {
            let road: bool = rng.gen();
            let cross: bool = rng.gen();
            let image = RgbImage::from_pixel(
                width,
                height,
                Rgb([100, if road { ON } else { OFF }, if cross { ON } else { OFF }]),
            );
            let name = format!("images/{}_{:04}.png", split, i);
            image
                .save(dir.join(&name))
                .with_context(|| format!("Failed to write {}", name))?;
            writer.write_record([name.as_str(), label(road), label(cross)])?;
        }
        writer.flush()?;
    }
    Ok(())
}

fn label(positive: bool) -> &'static str {
    if positive {
        "1"
    } else {
        "0"
    }
}

/// Heuristic stand-in for a trained network on synthetic data: the brightest
/// green value drives the road head and the brightest blue the crossing head.
/// Black padding does not change either maximum.
pub fn synthetic_classifier(image: &RgbImage) -> Result<InferenceOutput> {
    let (mut green, mut blue) = (0u8, 0u8);
    for px in image.pixels() {
        green = green.max(px[1]);
        blue = blue.max(px[2]);
    }
    let logit = |v: u8| (f32::from(v) - 127.5) / 32.0;
    Ok(InferenceOutput {
        road: TaskOutput::from_logits([0.0, logit(green)]),
        cross: TaskOutput::from_logits([0.0, logit(blue)]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::Manifest;

    #[test]
    fn synthetic_dataset_round_trips_through_manifest() {
        let dir = tempfile::tempdir().unwrap();
        generate_synthetic_dataset(dir.path(), 5, 8, 6, 1).unwrap();
        let entries: Vec<_> = Manifest::open(dir.path().join("val.txt"))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(entries.len(), 5);
        for entry in &entries {
            let image = crate::datasets::load_image(&entry.image_path).unwrap();
            assert_eq!(image.dimensions(), (8, 6));
            let out = synthetic_classifier(&image).unwrap();
            assert_eq!(out.road.predicts_positive(), entry.labels.road_type == "1");
            assert_eq!(out.cross.predicts_positive(), entry.labels.crossing == "1");
        }
    }

    #[test]
    fn saves_images_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("annotated");
        let images = vec![AnnotatedImage {
            name: "um_000001.png".to_string(),
            image: RgbImage::new(4, 4),
        }];
        save_annotated_images(&out, &images).unwrap();
        assert!(out.join("um_000001.png").is_file());
    }
}
