//! Confusion counting and the derived accuracy / precision / recall.
use crate::datasets::Labels;
use crate::tasks::{InferenceOutput, Task};
use anyhow::{ensure, Result};
use std::ops::AddAssign;

/// Added to the precision and recall denominators so empty tasks yield 0.
pub const EPSILON: f64 = 1e-6;

/// What one sample adds to one task's confusion counts. Each field is 0 or 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contribution {
    pub false_negative: u32,
    pub false_positive: u32,
    pub positive: u32,
    pub negative: u32,
}

/// Score one sample for `task`.
///
/// A label of `"0"` is a negative sample and counts as a false positive when
/// the head predicts class 1. Any other label is positive and counts as a
/// false negative when the head predicts class 0.
pub fn score_sample(labels: &Labels, output: &InferenceOutput, task: Task) -> Contribution {
    let predicted = output.task(task).argmax();
    if labels.get(task) == "0" {
        Contribution {
            negative: 1,
            false_positive: (predicted == 1) as u32,
            ..Contribution::default()
        }
    } else {
        Contribution {
            positive: 1,
            false_negative: (predicted == 0) as u32,
            ..Contribution::default()
        }
    }
}

/// Running confusion counts of one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confusion {
    pub false_negatives: u64,
    pub false_positives: u64,
    pub positives: u64,
    pub negatives: u64,
}

impl AddAssign<Contribution> for Confusion {
    fn add_assign(&mut self, c: Contribution) {
        self.false_negatives += u64::from(c.false_negative);
        self.false_positives += u64::from(c.false_positive);
        self.positives += u64::from(c.positive);
        self.negatives += u64::from(c.negative);
    }
}

impl Confusion {
    pub fn true_positives(&self) -> u64 {
        self.positives - self.false_negatives
    }

    pub fn true_negatives(&self) -> u64 {
        self.negatives - self.false_positives
    }

    pub fn total(&self) -> u64 {
        self.positives + self.negatives
    }
}

/// Summary statistics of one task, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

impl TaskMetrics {
    /// Derive metrics from final counts. Accuracy has no epsilon guard, so a
    /// task without samples is an error rather than a silent zero.
    pub fn from_confusion(c: &Confusion) -> Result<Self> {
        ensure!(c.total() > 0, "cannot compute accuracy: no samples were scored");
        let tp = c.true_positives() as f64;
        let tn = c.true_negatives() as f64;
        Ok(Self {
            accuracy: (tp + tn) / c.total() as f64,
            precision: tp / (tp + c.false_positives as f64 + EPSILON),
            recall: tp / (c.positives as f64 + EPSILON),
        })
    }
}
