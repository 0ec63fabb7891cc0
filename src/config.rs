//! Evaluation hyperparameters ("hypes"), loaded from the same JSON file the
//! training run uses.
use crate::tasks::TaskSet;
use anyhow::{anyhow, ensure, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Top-level hypes. Unknown keys (solver, arch, logging, ...) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hypes {
    /// Evaluate only the road-type task, skipping the crossing task.
    pub only_road: bool,
    pub dirs: Dirs,
    pub data: DataFiles,
    #[serde(default)]
    pub jitter: Jitter,
    #[serde(default)]
    pub eval: EvalSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dirs {
    pub data_dir: PathBuf,
}

/// Manifest locations, relative to `dirs.data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFiles {
    pub train_file: PathBuf,
    pub val_file: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jitter {
    /// Center-pad every input into an `image_height x image_width` canvas.
    #[serde(default)]
    pub fix_shape: bool,
    pub image_height: Option<u32>,
    pub image_width: Option<u32>,
}

/// Sampling and timing knobs of the evaluation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSettings {
    /// Probability that a manifest line is evaluated.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Seed for the sampling RNG; `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Inference calls averaged for the latency figure.
    #[serde(default = "default_timing_runs")]
    pub timing_runs: usize,
}

fn default_sample_rate() -> f64 {
    0.3
}

fn default_timing_runs() -> usize {
    10
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            seed: None,
            timing_runs: default_timing_runs(),
        }
    }
}

impl EvalSettings {
    /// Random source for the sampling filter.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Hypes {
    /// Load and validate hypes from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| anyhow!("Failed to open {}: {}", path.display(), e))?;
        let hypes: Hypes = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid hypes in {}", path.display()))?;
        hypes.validate()?;
        Ok(hypes)
    }

    /// Build hypes from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let hypes: Hypes = serde_json::from_value(value).context("Invalid hypes")?;
        hypes.validate()?;
        Ok(hypes)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.eval.sample_rate),
            "eval.sample_rate must lie in [0, 1], got {}",
            self.eval.sample_rate
        );
        ensure!(self.eval.timing_runs > 0, "eval.timing_runs must be positive");
        if self.jitter.fix_shape {
            self.target_shape()?;
        }
        Ok(())
    }

    pub fn task_set(&self) -> TaskSet {
        if self.only_road {
            TaskSet::RoadOnly
        } else {
            TaskSet::RoadAndCross
        }
    }

    /// Padding target as `(height, width)`, if `jitter.fix_shape` is set.
    pub fn fixed_shape(&self) -> Result<Option<(u32, u32)>> {
        if self.jitter.fix_shape {
            self.target_shape().map(Some)
        } else {
            Ok(None)
        }
    }

    fn target_shape(&self) -> Result<(u32, u32)> {
        match (self.jitter.image_height, self.jitter.image_width) {
            (Some(h), Some(w)) => Ok((h, w)),
            _ => Err(anyhow!(
                "jitter.fix_shape requires jitter.image_height and jitter.image_width"
            )),
        }
    }

    pub fn val_manifest(&self) -> PathBuf {
        self.dirs.data_dir.join(&self.data.val_file)
    }

    pub fn train_manifest(&self) -> PathBuf {
        self.dirs.data_dir.join(&self.data.train_file)
    }
}
