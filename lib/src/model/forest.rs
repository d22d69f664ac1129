//! Random-forest classifier: bagged CART trees with per-node feature subsampling.
//!
//! Fitting is fully determined by `random_state`. A master [`ChaCha8Rng`] draws one
//! seed per tree; each tree seed drives that tree's bootstrap sample and its
//! feature visiting order. Predictions average the trees' leaf distributions
//! and return the most probable class.

use std::marker::PhantomData;

use ndarray::{ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{ForestError, Result};
use crate::metrics;
use crate::model::{
    DecisionTreeClassifier, Fitted, InferenceModel, MaxFeatures, SplitCriterion, TrainableModel,
    TreeConfig, TreeParams, Unfitted,
};

/// Hyperparameters of a [`RandomForestClassifier`].
///
/// Defaults:
/// - `n_estimators`: 10
/// - `random_state`: 42
/// - `criterion`: Gini
/// - `max_depth`: unlimited
/// - `min_samples_split`: 2
/// - `min_samples_leaf`: 1
/// - `max_features`: `Sqrt`
/// - `bootstrap`: true
#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    pub(crate) n_estimators: usize,
    pub(crate) random_state: u64,
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 10,
            random_state: 42,
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
        }
    }
}

impl ForestConfig {
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn min_samples_split(mut self, n: usize) -> Self {
        self.min_samples_split = n;
        self
    }

    pub fn min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }

    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// When false every tree sees every sample exactly once.
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    fn tree_config(&self, seed: u64) -> TreeConfig {
        TreeConfig::default()
            .criterion(self.criterion)
            .max_depth(self.max_depth)
            .min_samples_split(self.min_samples_split)
            .min_samples_leaf(self.min_samples_leaf)
            .max_features(self.max_features)
            .random_state(seed)
    }

    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForestError::InvalidParameter(
                "n_estimators must be positive".into(),
            ));
        }
        self.tree_config(0).validate()
    }
}

/// Serializable state of a fitted forest. This is what lands in the model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<TreeParams>,
}

/// Random-forest classifier with state encoded at the type level.
///
/// Only the unfitted forest exposes its [`ForestConfig`]. The fitted state is the
/// list of trees; a forest restored with [`InferenceModel::from_params`] holds
/// `ForestConfig::default()` in place of its training hyperparameters.
///
/// ```
/// use iris_forest::dataset::load_iris;
/// use iris_forest::model::{ForestConfig, InferenceModel, RandomForestClassifier, TrainableModel};
/// use ndarray::array;
///
/// let iris = load_iris().unwrap();
/// let forest = RandomForestClassifier::new(ForestConfig::default())
///     .fit(&iris)
///     .unwrap();
/// let label = forest.predict(array![5.1, 3.5, 1.4, 0.2].view()).unwrap();
/// assert_eq!(label, 0);
/// ```
#[derive(Debug, Clone)]
pub struct RandomForestClassifier<S> {
    /// Read only while fitting.
    config: ForestConfig,
    trees: Vec<DecisionTreeClassifier<Fitted>>,
    n_features: usize,
    n_classes: usize,
    _state: PhantomData<S>,
}

impl RandomForestClassifier<Unfitted> {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
            n_classes: 0,
            _state: PhantomData,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fits the forest on an in-memory record matrix.
    ///
    /// The number of classes is `max(targets) + 1`.
    pub fn fit_records(
        self,
        records: ArrayView2<'_, f64>,
        targets: &[usize],
    ) -> Result<RandomForestClassifier<Fitted>> {
        self.config.validate()?;
        let (n_samples, n_features) = records.dim();
        if n_samples == 0 {
            return Err(ForestError::EmptyData("no samples to fit".into()));
        }
        if targets.len() != n_samples {
            return Err(ForestError::InvalidData(format!(
                "records have {} rows but {} targets were given",
                n_samples,
                targets.len()
            )));
        }
        let n_classes = targets.iter().max().map_or(0, |&m| m + 1);

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        let mut trees = Vec::with_capacity(self.config.n_estimators);
        for t in 0..self.config.n_estimators {
            let mut tree_rng = ChaCha8Rng::seed_from_u64(rng.gen());
            let weights = if self.config.bootstrap {
                let mut counts = vec![0.0; n_samples];
                for _ in 0..n_samples {
                    counts[tree_rng.gen_range(0..n_samples)] += 1.0;
                }
                counts
            } else {
                vec![1.0; n_samples]
            };
            let tree = DecisionTreeClassifier::new(self.config.tree_config(tree_rng.gen()))
                .fit_weighted(records, targets, &weights, n_classes)?;
            debug!(
                tree = t,
                depth = tree.depth(),
                leaves = tree.n_leaves(),
                "Fitted tree"
            );
            trees.push(tree);
        }

        info!(
            n_estimators = trees.len(),
            n_samples, n_features, n_classes, "Fitted random forest"
        );

        Ok(RandomForestClassifier {
            config: self.config,
            trees,
            n_features,
            n_classes,
            _state: PhantomData,
        })
    }
}

impl TrainableModel for RandomForestClassifier<Unfitted> {
    type Output = RandomForestClassifier<Fitted>;

    fn fit<D: Dataset>(self, dataset: &D) -> Result<Self::Output> {
        let n_total = dataset
            .len()
            .ok_or_else(|| ForestError::InvalidData("Dataset length unknown".into()))?;
        if n_total == 0 {
            return Err(ForestError::EmptyData("Dataset is empty".into()));
        }
        let (records, targets) = dataset
            .get_batch(0..n_total)
            .map_err(|e| ForestError::InvalidData(format!("Data error: {:?}", e)))?;
        self.fit_records(records.view(), &targets)
    }
}

impl RandomForestClassifier<Fitted> {
    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTreeClassifier<Fitted>] {
        &self.trees
    }

    /// Mean of the per-tree normalized importances, renormalized to sum to 1.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in importances.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        importances
    }

    /// Fraction of the dataset's samples whose label is predicted correctly.
    pub fn score<D: Dataset>(&self, dataset: &D) -> Result<f64> {
        let mut y_true = Vec::new();
        let mut y_pred = Vec::new();
        for batch in dataset.batches(64) {
            let (records, targets) =
                batch.map_err(|e| ForestError::InvalidData(format!("Data error: {:?}", e)))?;
            y_pred.extend(self.predict_batch(records.view())?);
            y_true.extend(targets);
        }
        Ok(metrics::accuracy(&y_true, &y_pred))
    }
}

impl InferenceModel for RandomForestClassifier<Fitted> {
    type ParamsRepr = ForestParams;

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, sample: ArrayView1<'_, f64>) -> Result<Vec<f64>> {
        if sample.len() != self.n_features {
            return Err(ForestError::FeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.leaf_distribution(sample)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }

    fn extract_params(&self) -> Self::ParamsRepr {
        ForestParams {
            n_features: self.n_features,
            n_classes: self.n_classes,
            trees: self.trees.iter().map(|t| t.extract_params()).collect(),
        }
    }

    fn from_params(params: Self::ParamsRepr) -> Result<Self> {
        if params.trees.is_empty() {
            return Err(ForestError::InvalidData("forest has no trees".into()));
        }
        let mut trees = Vec::with_capacity(params.trees.len());
        for tree in params.trees {
            if tree.n_features != params.n_features || tree.n_classes != params.n_classes {
                return Err(ForestError::InvalidData(format!(
                    "tree shape ({}, {}) does not match forest shape ({}, {})",
                    tree.n_features, tree.n_classes, params.n_features, params.n_classes
                )));
            }
            trees.push(DecisionTreeClassifier::from_params(tree)?);
        }
        Ok(Self {
            config: ForestConfig::default(),
            trees,
            n_features: params.n_features,
            n_classes: params.n_classes,
            _state: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{load_iris, InMemoryDataset};
    use ndarray::array;

    fn iris_forest() -> RandomForestClassifier<Fitted> {
        let iris = load_iris().unwrap();
        RandomForestClassifier::new(ForestConfig::default())
            .fit(&iris)
            .unwrap()
    }

    #[test]
    fn test_forest_config_defaults() {
        let config = ForestConfig::default();
        assert_eq!(config.n_estimators, 10);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.max_features, MaxFeatures::Sqrt);
        assert!(config.bootstrap);
    }

    #[test]
    fn test_min_samples_split_below_two_rejected() {
        let iris = load_iris().unwrap();
        for split in [0, 1] {
            let err = RandomForestClassifier::new(ForestConfig::default().min_samples_split(split))
                .fit(&iris)
                .unwrap_err();
            assert!(matches!(err, ForestError::InvalidParameter(_)), "split = {split}");
        }
    }

    #[test]
    fn test_zero_min_samples_leaf_rejected() {
        let iris = load_iris().unwrap();
        let err = RandomForestClassifier::new(ForestConfig::default().min_samples_leaf(0))
            .fit(&iris)
            .unwrap_err();
        assert!(matches!(err, ForestError::InvalidParameter(_)));
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let iris = load_iris().unwrap();
        let err = RandomForestClassifier::new(ForestConfig::default().n_estimators(0))
            .fit(&iris)
            .unwrap_err();
        assert!(matches!(err, ForestError::InvalidParameter(_)));
    }

    #[test]
    fn test_fit_builds_requested_tree_count() {
        let forest = iris_forest();
        assert_eq!(forest.n_estimators(), 10);
        assert_eq!(forest.n_features(), 4);
        assert_eq!(forest.n_classes(), 3);
    }

    #[test]
    fn test_predicts_setosa_sample() {
        let forest = iris_forest();
        assert_eq!(forest.predict(array![5.1, 3.5, 1.4, 0.2].view()).unwrap(), 0);
    }

    #[test]
    fn test_predict_proba_is_distribution() {
        let forest = iris_forest();
        let proba = forest.predict_proba(array![6.0, 2.9, 4.5, 1.5].view()).unwrap();
        assert_eq!(proba.len(), 3);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_training_accuracy_is_high() {
        let iris = load_iris().unwrap();
        let forest = iris_forest();
        assert!(forest.score(&iris).unwrap() >= 0.95);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let a = iris_forest().extract_params();
        let b = iris_forest().extract_params();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_changes_forest() {
        let iris = load_iris().unwrap();
        let a = iris_forest().extract_params();
        let b = RandomForestClassifier::new(ForestConfig::default().random_state(7))
            .fit(&iris)
            .unwrap()
            .extract_params();
        assert_ne!(a, b);
    }

    #[test]
    fn test_feature_importances_sum_to_one() {
        let importances = iris_forest().feature_importances();
        assert_eq!(importances.len(), 4);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        // petal measurements carry most of the signal on Iris
        assert!(importances[2] + importances[3] > importances[0] + importances[1]);
    }

    #[test]
    fn test_without_bootstrap_fits_training_data_exactly() {
        let ds = InMemoryDataset::new(
            array![[1.0, 0.0], [2.0, 0.0], [3.0, 1.0], [4.0, 1.0]],
            vec![0, 0, 1, 1],
        )
        .unwrap();
        let forest = RandomForestClassifier::new(ForestConfig::default().bootstrap(false))
            .fit(&ds)
            .unwrap();
        assert_eq!(forest.score(&ds).unwrap(), 1.0);
    }

    #[test]
    fn test_predict_batch_matches_predict() {
        let iris = load_iris().unwrap();
        let forest = iris_forest();
        let batch = forest.predict_batch(iris.records().view()).unwrap();
        for (row, &label) in iris.records().rows().into_iter().zip(&batch) {
            assert_eq!(forest.predict(row).unwrap(), label);
        }
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let forest = iris_forest();
        let err = forest.predict(array![5.1, 3.5].view()).unwrap_err();
        assert!(matches!(
            err,
            ForestError::FeatureMismatch { expected: 4, got: 2 }
        ));
    }

    #[test]
    fn test_from_params_carries_no_training_config() {
        let iris = load_iris().unwrap();
        let config = ForestConfig::default().n_estimators(3).max_depth(Some(2));
        let trained = RandomForestClassifier::new(config)
            .fit(&iris)
            .unwrap();
        let restored = RandomForestClassifier::from_params(trained.extract_params()).unwrap();

        assert_eq!(restored.config, ForestConfig::default());
        assert_eq!(restored.n_estimators(), 3);
        assert_eq!(restored.extract_params(), trained.extract_params());
    }

    #[test]
    fn test_from_params_rejects_empty_forest() {
        let params = ForestParams {
            n_features: 4,
            n_classes: 3,
            trees: Vec::new(),
        };
        assert!(RandomForestClassifier::from_params(params).is_err());
    }

    #[test]
    fn test_from_params_rejects_mismatched_tree() {
        let mut params = iris_forest().extract_params();
        params.trees[0].n_classes = 2;
        assert!(RandomForestClassifier::from_params(params).is_err());
    }
}
