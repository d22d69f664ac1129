//! Tree-based classifiers with compile-time state tracking.
//!
//! Every model is generic over a state marker:
//! - `Model<Unfitted>` implements [`TrainableModel`] and only knows its hyperparameters.
//! - `Model<Fitted>` implements [`InferenceModel`]: prediction and persistence.
//!
//! Fitting consumes the unfitted value, so a model can be fitted exactly once and
//! nothing can be predicted or saved before that happens.

use std::path::Path;

use ndarray::{ArrayView1, ArrayView2};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::serialization::{read_artifact, write_artifact, SerializableParams};

pub mod criterion;
pub mod forest;
pub mod state;
pub mod tree;

pub use criterion::SplitCriterion;
pub use forest::{ForestConfig, ForestParams, RandomForestClassifier};
pub use state::{Fitted, Unfitted};
pub use tree::{DecisionTreeClassifier, MaxFeatures, Node, TreeConfig, TreeParams};

/// A model that can be fitted on a labeled dataset.
pub trait TrainableModel {
    /// The fitted counterpart produced by [`fit`](TrainableModel::fit).
    type Output: InferenceModel;

    /// Fits the model on every sample of `dataset`.
    fn fit<D: Dataset>(self, dataset: &D) -> Result<Self::Output>;
}

/// A fitted classifier that can predict and be persisted.
pub trait InferenceModel: Sized {
    /// Plain-data representation written to and read from disk.
    type ParamsRepr: SerializableParams<Error = bincode::Error>;

    /// Number of features every input row must have.
    fn n_features(&self) -> usize;

    /// Number of classes the model can predict.
    fn n_classes(&self) -> usize;

    /// Class probability estimates for a single sample.
    fn predict_proba(&self, sample: ArrayView1<'_, f64>) -> Result<Vec<f64>>;

    /// Predicted class label for a single sample.
    fn predict(&self, sample: ArrayView1<'_, f64>) -> Result<usize> {
        let proba = self.predict_proba(sample)?;
        Ok(argmax(&proba))
    }

    /// Predicted class labels for every row of `records`.
    fn predict_batch(&self, records: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        records.rows().into_iter().map(|row| self.predict(row)).collect()
    }

    fn extract_params(&self) -> Self::ParamsRepr;

    fn from_params(params: Self::ParamsRepr) -> Result<Self>;

    /// Writes the fitted parameters to `path`, replacing any existing file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.extract_params().to_bytes()?;
        write_artifact(path.as_ref(), &bytes)
    }

    /// Reads a model previously written with [`save_to_file`](InferenceModel::save_to_file).
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = read_artifact(path.as_ref())?;
        let params = Self::ParamsRepr::from_bytes(&bytes)?;
        Self::from_params(params)
    }
}

/// Index of the largest value; the lowest index wins ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::argmax;

    #[test]
    fn test_argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
    }

    #[test]
    fn test_argmax_ties_go_to_lowest_index() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
    }

    #[test]
    fn test_argmax_empty_is_zero() {
        assert_eq!(argmax(&[]), 0);
    }
}
