//! The end-to-end training pipeline: load → fit → save → predict.
//!
//! [`run`] executes the pipeline with the fixed defaults below and prints two
//! lines to stdout. [`Trainer`] is the same pipeline with overridable settings
//! and an arbitrary output sink.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ndarray::ArrayView1;
use tracing::{debug, info};

use crate::dataset::load_iris;
use crate::error::{ForestError, Result};
use crate::model::{ForestConfig, InferenceModel, RandomForestClassifier, TrainableModel};

/// Number of trees in the forest.
pub const DEFAULT_N_ESTIMATORS: usize = 10;

/// Seed controlling bootstrap sampling and feature selection.
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Artifact location, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "model.pkl";

/// The sample classified after training (an Iris setosa measurement).
pub const DEFAULT_SAMPLE: [f64; 4] = [5.1, 3.5, 1.4, 0.2];

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub output_path: PathBuf,
    pub prediction: usize,
    pub training_accuracy: f64,
}

/// Runs the training pipeline. Immutable once built via [`TrainerBuilder`].
#[derive(Debug, Clone)]
pub struct Trainer {
    n_estimators: usize,
    random_state: u64,
    output_path: PathBuf,
    sample: Vec<f64>,
}

/// Fluent builder for a [`Trainer`].
///
/// Defaults:
/// - `n_estimators`: [`DEFAULT_N_ESTIMATORS`]
/// - `random_state`: [`DEFAULT_RANDOM_STATE`]
/// - `output_path`: [`DEFAULT_OUTPUT_PATH`]
/// - `sample`: [`DEFAULT_SAMPLE`]
#[derive(Debug, Clone)]
pub struct TrainerBuilder {
    n_estimators: usize,
    random_state: u64,
    output_path: PathBuf,
    sample: Vec<f64>,
}

impl Default for TrainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainerBuilder {
    pub fn new() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            random_state: DEFAULT_RANDOM_STATE,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            sample: DEFAULT_SAMPLE.to_vec(),
        }
    }

    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn sample(mut self, sample: impl Into<Vec<f64>>) -> Self {
        self.sample = sample.into();
        self
    }

    pub fn build(self) -> Trainer {
        Trainer {
            n_estimators: self.n_estimators,
            random_state: self.random_state,
            output_path: self.output_path,
            sample: self.sample,
        }
    }
}

impl Default for Trainer {
    fn default() -> Self {
        TrainerBuilder::new().build()
    }
}

impl Trainer {
    /// Convenience constructor that starts the builder pattern.
    pub fn builder() -> TrainerBuilder {
        TrainerBuilder::new()
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Runs the pipeline, printing the report to stdout.
    pub fn run(&self) -> Result<TrainReport> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_with_output(&mut out)
    }

    /// Runs the pipeline, writing the two report lines to `out`.
    ///
    /// Each line is written only after the step it reports has succeeded; any
    /// error aborts the run at that point.
    pub fn run_with_output<W: Write>(&self, out: &mut W) -> Result<TrainReport> {
        let dataset = load_iris()?;
        info!(
            samples = dataset.targets().len(),
            features = dataset.records().ncols(),
            "Loaded iris dataset"
        );

        let config = ForestConfig::default()
            .n_estimators(self.n_estimators)
            .random_state(self.random_state);
        let model = RandomForestClassifier::new(config).fit(&dataset)?;

        model.save_to_file(&self.output_path)?;
        writeln!(
            out,
            "✓ Model trained and saved as {}",
            self.output_path.display()
        )
        .map_err(ForestError::Report)?;

        let prediction = model.predict(ArrayView1::from(&self.sample[..]))?;
        writeln!(out, "✓ Prediction for [{:?}]: {}", self.sample, prediction)
            .map_err(ForestError::Report)?;

        let training_accuracy = model.score(&dataset)?;
        debug!(training_accuracy, "Scored model on training data");

        Ok(TrainReport {
            output_path: self.output_path.clone(),
            prediction,
            training_accuracy,
        })
    }
}

/// Trains the default forest, saves it to `model.pkl` and prints the sample prediction.
pub fn run() -> Result<TrainReport> {
    Trainer::default().run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_trainer_builder_default_values() {
        let builder = TrainerBuilder::new();

        assert_eq!(builder.n_estimators, 10);
        assert_eq!(builder.random_state, 42);
        assert_eq!(builder.output_path, PathBuf::from("model.pkl"));
        assert_eq!(builder.sample, vec![5.1, 3.5, 1.4, 0.2]);
    }

    #[test]
    fn test_trainer_builder_overrides() {
        let trainer = Trainer::builder()
            .n_estimators(3)
            .random_state(1)
            .output_path("out/forest.bin")
            .sample(vec![6.0, 3.0, 5.0, 2.0])
            .build();

        assert_eq!(trainer.n_estimators, 3);
        assert_eq!(trainer.random_state, 1);
        assert_eq!(trainer.output_path(), Path::new("out/forest.bin"));
        assert_eq!(trainer.sample, vec![6.0, 3.0, 5.0, 2.0]);
    }

    #[test]
    fn test_run_writes_two_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.pkl");
        let trainer = Trainer::builder().output_path(&path).build();

        let mut out = Vec::new();
        let report = trainer.run_with_output(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            format!("✓ Model trained and saved as {}", path.display())
        );
        assert_eq!(lines[1], "✓ Prediction for [[5.1, 3.5, 1.4, 0.2]]: 0");
        assert_eq!(report.prediction, 0);
        assert_eq!(report.output_path, path);
    }

    #[test]
    fn test_run_rejects_wrong_sample_width_after_saving() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.pkl");
        let trainer = Trainer::builder()
            .output_path(&path)
            .sample(vec![1.0, 2.0])
            .build();

        let mut out = Vec::new();
        let err = trainer.run_with_output(&mut out).unwrap_err();
        assert!(matches!(err, ForestError::FeatureMismatch { .. }));

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(path.exists());
    }
}
