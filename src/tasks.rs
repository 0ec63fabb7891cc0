//! The two binary tasks of the road classifier and the shape of its output.
use std::fmt;

/// A binary task head of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Highway (positive) vs. small road (negative).
    Road,
    /// Intersection present (positive) or not.
    Cross,
}

impl Task {
    /// Position of the task's head in the model output and its label column.
    pub fn index(self) -> usize {
        match self {
            Task::Road => 0,
            Task::Cross => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Task::Road => "road",
            Task::Cross => "cross",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which tasks a run evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSet {
    RoadOnly,
    RoadAndCross,
}

impl TaskSet {
    pub fn tasks(self) -> &'static [Task] {
        match self {
            TaskSet::RoadOnly => &[Task::Road],
            TaskSet::RoadAndCross => &[Task::Road, Task::Cross],
        }
    }
}

/// One value per active task. `cross` is `None` for road-only runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PerTask<T> {
    pub road: T,
    pub cross: Option<T>,
}

impl<T> PerTask<T> {
    pub fn from_fn(set: TaskSet, mut f: impl FnMut(Task) -> T) -> Self {
        let road = f(Task::Road);
        let cross = match set {
            TaskSet::RoadOnly => None,
            TaskSet::RoadAndCross => Some(f(Task::Cross)),
        };
        Self { road, cross }
    }

    pub fn get(&self, task: Task) -> Option<&T> {
        match task {
            Task::Road => Some(&self.road),
            Task::Cross => self.cross.as_ref(),
        }
    }

    pub fn get_mut(&mut self, task: Task) -> Option<&mut T> {
        match task {
            Task::Road => Some(&mut self.road),
            Task::Cross => self.cross.as_mut(),
        }
    }

    pub fn task_set(&self) -> TaskSet {
        if self.cross.is_some() {
            TaskSet::RoadAndCross
        } else {
            TaskSet::RoadOnly
        }
    }

    /// Active tasks in order, road first.
    pub fn iter(&self) -> impl Iterator<Item = (Task, &T)> {
        std::iter::once((Task::Road, &self.road))
            .chain(self.cross.as_ref().map(|c| (Task::Cross, c)))
    }

    pub fn try_map<U, E>(&self, mut f: impl FnMut(Task, &T) -> Result<U, E>) -> Result<PerTask<U>, E> {
        let road = f(Task::Road, &self.road)?;
        let cross = match &self.cross {
            Some(c) => Some(f(Task::Cross, c)?),
            None => None,
        };
        Ok(PerTask { road, cross })
    }
}

/// Softmax output of one task head: `[negative, positive]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskOutput(pub [f32; 2]);

impl TaskOutput {
    /// Probabilities from raw logits, using a max-shifted softmax.
    pub fn from_logits(logits: [f32; 2]) -> Self {
        let max = logits[0].max(logits[1]);
        let exps = logits.map(|l| (l - max).exp());
        let sum: f32 = exps.iter().sum();
        if !sum.is_finite() || sum <= 0.0 {
            return Self([0.5, 0.5]);
        }
        Self(exps.map(|e| e / sum))
    }

    /// Index of the larger probability; ties go to the negative class.
    pub fn argmax(&self) -> usize {
        self.0
            .iter()
            .enumerate()
            .fold(0usize, |max_i, (i, &v)| if v > self.0[max_i] { i } else { max_i })
    }

    pub fn predicts_positive(&self) -> bool {
        self.argmax() == 1
    }
}

/// Everything a single forward pass produces: one head per task. The
/// crossing head is always computed even when only the road task is scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceOutput {
    pub road: TaskOutput,
    pub cross: TaskOutput,
}

impl InferenceOutput {
    pub fn new(road: [f32; 2], cross: [f32; 2]) -> Self {
        Self {
            road: TaskOutput(road),
            cross: TaskOutput(cross),
        }
    }

    pub fn task(&self, task: Task) -> &TaskOutput {
        match task {
            Task::Road => &self.road,
            Task::Cross => &self.cross,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_negative_on_tie() {
        assert_eq!(TaskOutput([0.5, 0.5]).argmax(), 0);
        assert_eq!(TaskOutput([0.2, 0.8]).argmax(), 1);
        assert_eq!(TaskOutput([0.9, 0.1]).argmax(), 0);
    }

    #[test]
    fn softmax_normalizes() {
        let out = TaskOutput::from_logits([1.0, 3.0]);
        assert!((out.0[0] + out.0[1] - 1.0).abs() < 1e-6);
        assert!(out.predicts_positive());
    }

    #[test]
    fn per_task_respects_task_set() {
        let only = PerTask::from_fn(TaskSet::RoadOnly, |t| t.index());
        assert_eq!(only.iter().count(), 1);
        assert!(only.get(Task::Cross).is_none());

        let both = PerTask::from_fn(TaskSet::RoadAndCross, |t| t.name());
        let names: Vec<_> = both.iter().map(|(_, n)| *n).collect();
        assert_eq!(names, vec!["road", "cross"]);
        assert_eq!(both.task_set(), TaskSet::RoadAndCross);
    }
}
