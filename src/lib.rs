//! Evaluation harness for road-scene classifiers: highway vs. small road,
//! optionally with an intersection ("crossing") head.
//!
//! - Manifest streaming with seedable random subsampling
//! - Fixed-shape center padding of inputs
//! - Per-task confusion counts, accuracy, precision and recall
//! - Inference latency and annotated validation images
//!
//! The classifier itself is supplied by the caller through [`Inference`].

pub mod annotate;
pub mod config;
pub mod datasets;
pub mod evaluator;
pub mod metrics;
pub mod report;
pub mod tasks;
pub mod utils;

pub use annotate::{annotate, RoadClass};
pub use config::Hypes;
pub use datasets::{center_pad, load_image, Labels, Manifest, ManifestEntry};
pub use evaluator::{evaluate_data, AnnotatedImage, EvalResult, Inference, Split};
pub use metrics::{score_sample, Confusion, Contribution, TaskMetrics, EPSILON};
pub use report::{evaluate, Report};
pub use tasks::{InferenceOutput, PerTask, Task, TaskOutput, TaskSet};
pub use utils::{generate_synthetic_dataset, print_report_table, save_annotated_images, synthetic_classifier};
