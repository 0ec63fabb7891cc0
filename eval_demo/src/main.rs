// eval_demo/src/main.rs
use anyhow::Result;
use road_eval::{evaluate, generate_synthetic_dataset, print_report_table, save_annotated_images, synthetic_classifier, Hypes};
use serde_json::json;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let workdir = tempfile::tempdir()?;
    let data_dir = workdir.path().join("data");
    generate_synthetic_dataset(&data_dir.join("road"), 200, 96, 48, 42)?;

    let hypes = Hypes::from_value(json!({
        "only_road": false,
        "dirs": { "data_dir": data_dir },
        "data": { "train_file": "road/train.txt", "val_file": "road/val.txt" },
        "jitter": { "fix_shape": true, "image_height": 64, "image_width": 128 },
        "eval": { "sample_rate": 0.3, "seed": 7 }
    }))?;

    let mut model = synthetic_classifier;
    let report = evaluate(&hypes, &mut model)?;
    print_report_table(&report);

    let out_dir = Path::new("annotated");
    save_annotated_images(out_dir, &report.images)?;
    tracing::info!(count = report.images.len(), dir = %out_dir.display(), "saved annotated images");

    Ok(())
}
