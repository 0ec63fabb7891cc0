//! Validation + training evaluation flattened into labeled figures.
use crate::config::Hypes;
use crate::evaluator::{evaluate_data, AnnotatedImage, EvalResult, Inference, Split};
use anyhow::{anyhow, Result};

/// Labeled metric values in display order, plus the annotated validation
/// images.
#[derive(Debug, Clone)]
pub struct Report {
    pub metrics: Vec<(String, f64)>,
    pub images: Vec<AnnotatedImage>,
}

impl Report {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.metrics.iter().find(|(l, _)| l == label).map(|&(_, v)| v)
    }
}

/// Evaluate the validation split, then the training split, sharing one
/// sampling RNG seeded from `hypes.eval.seed`.
pub fn evaluate<I>(hypes: &Hypes, inference: &mut I) -> Result<Report>
where
    I: Inference + ?Sized,
{
    let mut rng = hypes.eval.rng();
    let val = evaluate_data(hypes, inference, Split::Validation, &mut rng)?;
    let train = evaluate_data(hypes, inference, Split::Training, &mut rng)?;
    build_report(val, &train)
}

/// Percentages per task (val then train, accuracy/precision/recall), then
/// the validation latency in milliseconds and frames per second.
pub fn build_report(val: EvalResult, train: &EvalResult) -> Result<Report> {
    let mut metrics = Vec::new();
    for (task, v) in val.metrics.iter() {
        let t = train
            .metrics
            .get(task)
            .ok_or_else(|| anyhow!("training results lack task {}", task))?;
        for (split, m) in [(Split::Validation, v), (Split::Training, t)] {
            metrics.push((format!("{}  {} Accuracy", task, split), 100.0 * m.accuracy));
            metrics.push((format!("{}  {} Precision", task, split), 100.0 * m.precision));
            metrics.push((format!("{}  {} Recall", task, split), 100.0 * m.recall));
        }
    }

    let dt = val
        .latency
        .ok_or_else(|| anyhow!("validation results carry no latency"))?
        .as_secs_f64();
    metrics.push(("Speed (msec)".to_string(), 1000.0 * dt));
    metrics.push(("Speed (fps)".to_string(), 1.0 / dt));

    Ok(Report {
        metrics,
        images: val.images,
    })
}
