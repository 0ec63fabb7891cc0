//! Single-split evaluation: stream a manifest, run the classifier on a random
//! subset of its images and accumulate per-task confusion counts.
use crate::annotate::annotate;
use crate::config::Hypes;
use crate::datasets::{center_pad, load_image, Manifest};
use crate::metrics::{score_sample, Confusion, TaskMetrics};
use crate::tasks::{InferenceOutput, PerTask, Task};
use anyhow::{anyhow, Result};
use image::RgbImage;
use rand::distributions::Bernoulli;
use rand::Rng;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A classifier that can be run on one image at a time.
pub trait Inference {
    fn infer(&mut self, image: &RgbImage) -> Result<InferenceOutput>;
}

impl<F> Inference for F
where
    F: FnMut(&RgbImage) -> Result<InferenceOutput>,
{
    fn infer(&mut self, image: &RgbImage) -> Result<InferenceOutput> {
        self(image)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Validation,
    Training,
}

impl Split {
    pub fn short_name(self) -> &'static str {
        match self {
            Split::Validation => "val",
            Split::Training => "train",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A validation image with the predicted class drawn on it.
#[derive(Debug, Clone)]
pub struct AnnotatedImage {
    pub name: String,
    pub image: RgbImage,
}

/// Outcome of evaluating one split.
#[derive(Debug, Clone)]
pub struct EvalResult {
    pub split: Split,
    pub confusion: PerTask<Confusion>,
    pub metrics: PerTask<TaskMetrics>,
    /// Mean time of one inference call; validation split only.
    pub latency: Option<Duration>,
    /// Annotated inputs; empty for the training split.
    pub images: Vec<AnnotatedImage>,
    /// Manifest lines that passed the sampling filter.
    pub evaluated: usize,
}

/// Evaluate `inference` on one split of the dataset described by `hypes`.
///
/// Each manifest line is kept with probability `hypes.eval.sample_rate`,
/// drawn from `rng`. Any I/O, parse or inference failure aborts the run.
pub fn evaluate_data<I, R>(hypes: &Hypes, inference: &mut I, split: Split, rng: &mut R) -> Result<EvalResult>
where
    I: Inference + ?Sized,
    R: Rng + ?Sized,
{
    let manifest_path = match split {
        Split::Validation => hypes.val_manifest(),
        Split::Training => hypes.train_manifest(),
    };
    let task_set = hypes.task_set();
    let fixed_shape = hypes.fixed_shape()?;
    let sampler = Bernoulli::new(hypes.eval.sample_rate)
        .map_err(|e| anyhow!("invalid eval.sample_rate {}: {}", hypes.eval.sample_rate, e))?;

    let mut confusion = PerTask::from_fn(task_set, |_| Confusion::default());
    let mut images = Vec::new();
    let mut last_input: Option<RgbImage> = None;
    let mut evaluated = 0usize;
    let mut total = 0usize;

    for entry in Manifest::open(&manifest_path)? {
        let entry = entry?;
        total += 1;
        if !rng.sample(sampler) {
            continue;
        }

        let image = load_image(&entry.image_path)?;
        let input = match fixed_shape {
            Some((height, width)) => center_pad(&image, height, width)?,
            None => image,
        };

        let output = inference.infer(&input)?;
        debug!(
            split = %split,
            image = %entry.image_path.display(),
            road = ?output.road.0,
            cross = ?output.cross.0,
            "evaluated sample"
        );

        if split == Split::Validation {
            let highway = output.task(Task::Road).predicts_positive();
            images.push(AnnotatedImage {
                name: entry.basename(),
                image: annotate(&input, highway),
            });
        }

        for &task in task_set.tasks() {
            if let Some(acc) = confusion.get_mut(task) {
                *acc += score_sample(&entry.labels, &output, task);
            }
        }
        evaluated += 1;
        last_input = Some(input);
    }

    if evaluated == 0 {
        warn!(split = %split, lines = total, "no samples passed the sampling filter");
    }

    let latency = match split {
        Split::Validation => {
            let input = last_input
                .as_ref()
                .ok_or_else(|| anyhow!("cannot time inference: no {} samples were evaluated", split))?;
            Some(time_inference(inference, input, hypes.eval.timing_runs)?)
        }
        Split::Training => None,
    };

    let metrics = confusion.try_map(|_, c| TaskMetrics::from_confusion(c))?;
    info!(
        split = %split,
        evaluated,
        lines = total,
        road_accuracy = metrics.road.accuracy,
        latency_ms = latency.map(|d| d.as_secs_f64() * 1000.0),
        "split evaluated"
    );

    Ok(EvalResult {
        split,
        confusion,
        metrics,
        latency,
        images,
        evaluated,
    })
}

/// Mean wall-clock time of `runs` back-to-back inference calls on `input`.
pub fn time_inference<I>(inference: &mut I, input: &RgbImage, runs: usize) -> Result<Duration>
where
    I: Inference + ?Sized,
{
    let runs = runs.max(1);
    let divisor = u32::try_from(runs).map_err(|_| anyhow!("timing runs {} exceed u32::MAX", runs))?;
    let start = Instant::now();
    for _ in 0..runs {
        inference.infer(input)?;
    }
    Ok(start.elapsed() / divisor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_inference() {
        let mut calls = 0;
        let mut model = |_: &RgbImage| -> Result<InferenceOutput> {
            calls += 1;
            Ok(InferenceOutput::new([0.5, 0.5], [0.5, 0.5]))
        };
        let image = RgbImage::new(2, 2);
        time_inference(&mut model, &image, 10).unwrap();
        assert_eq!(calls, 10);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn timing_rejects_run_count_beyond_u32() {
        let mut calls = 0u64;
        let mut model = |_: &RgbImage| -> Result<InferenceOutput> {
            calls += 1;
            Ok(InferenceOutput::new([0.5, 0.5], [0.5, 0.5]))
        };
        let runs = u32::MAX as usize + 1;
        assert!(time_inference(&mut model, &RgbImage::new(1, 1), runs).is_err());
        assert_eq!(calls, 0);
    }

    #[test]
    fn timing_propagates_inference_errors() {
        let mut model = |_: &RgbImage| -> Result<InferenceOutput> { Err(anyhow!("session closed")) };
        assert!(time_inference(&mut model, &RgbImage::new(1, 1), 3).is_err());
    }
}
