//! CART decision-tree classifier.
//!
//! Trees are grown depth-first into a flat node arena: a node's children always
//! have larger indices than the node itself, and the root is node `0`. Samples
//! go to the left child when `x[feature] <= threshold`.

use std::marker::PhantomData;

use ndarray::{ArrayView1, ArrayView2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{ForestError, Result};
use crate::model::{Fitted, InferenceModel, SplitCriterion, TrainableModel, Unfitted};

/// Feature values closer than this are treated as equal.
const FEATURE_THRESHOLD: f64 = 1e-7;

/// How many features are examined when searching for a node's split.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`
    Sqrt,
    /// `floor(log2(n_features))`
    Log2,
    /// Every feature.
    #[default]
    All,
    /// A fixed number of features.
    Count(usize),
    /// A fraction of the features, in `(0, 1]`.
    Fraction(f64),
}

impl MaxFeatures {
    /// Resolves to a concrete feature count in `1..=n_features`.
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match *self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => k,
            MaxFeatures::Fraction(f) => (f * n_features as f64) as usize,
        };
        k.clamp(1, n_features.max(1))
    }

    fn validate(&self) -> Result<()> {
        match *self {
            MaxFeatures::Count(0) => Err(ForestError::InvalidParameter(
                "max_features count must be positive".into(),
            )),
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => Err(
                ForestError::InvalidParameter(format!("max_features fraction {f} not in (0, 1]")),
            ),
            _ => Ok(()),
        }
    }
}

/// Hyperparameters for growing a single tree.
///
/// Defaults:
/// - `criterion`: Gini
/// - `max_depth`: unlimited
/// - `min_samples_split`: 2
/// - `min_samples_leaf`: 1
/// - `max_features`: all features
/// - `random_state`: 0
#[derive(Debug, Clone, PartialEq)]
pub struct TreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) random_state: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            random_state: 0,
        }
    }
}

impl TreeConfig {
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

    /// Seed for the feature visiting order at each node.
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.min_samples_split < 2 {
            return Err(ForestError::InvalidParameter(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForestError::InvalidParameter(
                "min_samples_leaf must be positive".into(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ForestError::InvalidParameter(
                "max_depth must be positive when set".into(),
            ));
        }
        self.max_features.validate()
    }
}

/// One node of a fitted tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        impurity: f64,
        weighted_samples: f64,
    },
    Leaf {
        /// Class probabilities, indexed by label.
        distribution: Vec<f64>,
        impurity: f64,
        weighted_samples: f64,
    },
}

impl Node {
    pub fn impurity(&self) -> f64 {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }

    pub fn weighted_samples(&self) -> f64 {
        match self {
            Node::Split {
                weighted_samples, ..
            }
            | Node::Leaf {
                weighted_samples, ..
            } => *weighted_samples,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// Serializable state of a fitted tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub n_features: usize,
    pub n_classes: usize,
    pub nodes: Vec<Node>,
}

impl TreeParams {
    /// Checks that the arena describes a well-formed tree.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ForestError::InvalidData("tree has no nodes".into()));
        }
        let n_nodes = self.nodes.len();
        let mut has_parent = vec![false; n_nodes];
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= self.n_features {
                        return Err(ForestError::InvalidData(format!(
                            "node {id} splits on feature {feature} of {}",
                            self.n_features
                        )));
                    }
                    // Children after parents rules out cycles.
                    if *left <= id || *right <= id || *left >= n_nodes || *right >= n_nodes {
                        return Err(ForestError::InvalidData(format!(
                            "node {id} has invalid children {left}, {right}"
                        )));
                    }
                    // Every node has at most one parent, so the arena is a tree.
                    for child in [*left, *right] {
                        if std::mem::replace(&mut has_parent[child], true) {
                            return Err(ForestError::InvalidData(format!(
                                "node {child} is referenced more than once"
                            )));
                        }
                    }
                    if !threshold.is_finite() {
                        return Err(ForestError::InvalidData(format!(
                            "node {id} has non-finite threshold"
                        )));
                    }
                }
                Node::Leaf { distribution, .. } => {
                    if distribution.len() != self.n_classes {
                        return Err(ForestError::InvalidData(format!(
                            "leaf {id} has {} class probabilities, expected {}",
                            distribution.len(),
                            self.n_classes
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// A CART classification tree with state encoded at the type level.
///
/// - `DecisionTreeClassifier<Unfitted>`: holds a [`TreeConfig`], implements [`TrainableModel`].
/// - `DecisionTreeClassifier<Fitted>`: holds the grown node arena, implements [`InferenceModel`].
///
/// Hyperparameters are not part of the fitted state. A fitted tree never reads
/// `config`, and one restored with [`InferenceModel::from_params`] holds
/// `TreeConfig::default()` there rather than the values it was grown with.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier<S> {
    /// Read only while fitting.
    config: TreeConfig,
    params: TreeParams,
    _state: PhantomData<S>,
}

impl DecisionTreeClassifier<Unfitted> {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            params: TreeParams {
                n_features: 0,
                n_classes: 0,
                nodes: Vec::new(),
            },
            _state: PhantomData,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Grows the tree on weighted samples.
    ///
    /// Samples with zero weight are ignored. Labels must be below `n_classes`;
    /// every leaf distribution has exactly `n_classes` entries.
    pub fn fit_weighted(
        self,
        records: ArrayView2<'_, f64>,
        targets: &[usize],
        weights: &[f64],
        n_classes: usize,
    ) -> Result<DecisionTreeClassifier<Fitted>> {
        self.config.validate()?;
        let n_samples = records.nrows();
        if targets.len() != n_samples || weights.len() != n_samples {
            return Err(ForestError::InvalidData(format!(
                "{} rows, {} targets, {} weights",
                n_samples,
                targets.len(),
                weights.len()
            )));
        }
        if records.ncols() == 0 {
            return Err(ForestError::EmptyData("records have no features".into()));
        }
        if let Some(&bad) = targets.iter().find(|&&t| t >= n_classes) {
            return Err(ForestError::InvalidData(format!(
                "label {bad} out of range for {n_classes} classes"
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ForestError::InvalidData(
                "sample weights must be finite and non-negative".into(),
            ));
        }

        let indices: Vec<usize> = (0..n_samples).filter(|&i| weights[i] > 0.0).collect();
        if indices.is_empty() {
            return Err(ForestError::EmptyData("no samples with positive weight".into()));
        }

        let mut grower = Grower {
            records: records.reborrow(),
            targets,
            weights,
            n_classes,
            criterion: self.config.criterion,
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features.resolve(records.ncols()),
            rng: ChaCha8Rng::seed_from_u64(self.config.random_state),
            nodes: Vec::new(),
        };
        grower.grow(indices, 0);

        Ok(DecisionTreeClassifier {
            config: self.config,
            params: TreeParams {
                n_features: records.ncols(),
                n_classes,
                nodes: grower.nodes,
            },
            _state: PhantomData,
        })
    }
}

impl TrainableModel for DecisionTreeClassifier<Unfitted> {
    type Output = DecisionTreeClassifier<Fitted>;

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
        let n_classes = targets.iter().max().map_or(0, |&m| m + 1);
        let weights = vec![1.0; n_total];
        self.fit_weighted(records.view(), &targets, &weights, n_classes)
    }
}

impl DecisionTreeClassifier<Fitted> {
    pub fn nodes(&self) -> &[Node] {
        &self.params.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.params.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Length of the longest root-to-leaf path (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            match &self.params.nodes[id] {
                Node::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
            }
        }
        max_depth
    }

    /// Total weighted impurity decrease contributed by each feature, normalized to sum to 1.
    ///
    /// All zeros when the tree is a single leaf.
    pub fn feature_importances(&self) -> Vec<f64> {
        let nodes = &self.params.nodes;
        let mut importances = vec![0.0; self.params.n_features];
        for node in nodes {
            if let Node::Split {
                feature,
                left,
                right,
                impurity,
                weighted_samples,
                ..
            } = node
            {
                let l = &nodes[*left];
                let r = &nodes[*right];
                importances[*feature] += weighted_samples * impurity
                    - l.weighted_samples() * l.impurity()
                    - r.weighted_samples() * r.impurity();
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        importances
    }

    /// Class distribution of the leaf `sample` falls into.
    pub(crate) fn leaf_distribution(&self, sample: ArrayView1<'_, f64>) -> &[f64] {
        let nodes = &self.params.nodes;
        let mut id = 0;
        loop {
            match &nodes[id] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    id = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { distribution, .. } => return distribution,
            }
        }
    }

    pub(crate) fn check_features(&self, got: usize) -> Result<()> {
        if got != self.params.n_features {
            return Err(ForestError::FeatureMismatch {
                expected: self.params.n_features,
                got,
            });
        }
        Ok(())
    }
}

impl InferenceModel for DecisionTreeClassifier<Fitted> {
    type ParamsRepr = TreeParams;

    fn n_features(&self) -> usize {
        self.params.n_features
    }

    fn n_classes(&self) -> usize {
        self.params.n_classes
    }

    fn predict_proba(&self, sample: ArrayView1<'_, f64>) -> Result<Vec<f64>> {
        self.check_features(sample.len())?;
        Ok(self.leaf_distribution(sample).to_vec())
    }

    fn extract_params(&self) -> Self::ParamsRepr {
        self.params.clone()
    }

    fn from_params(params: Self::ParamsRepr) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            config: TreeConfig::default(),
            params,
            _state: PhantomData,
        })
    }
}

struct Candidate {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

/// Recursive node builder for one tree.
struct Grower<'a> {
    records: ArrayView2<'a, f64>,
    targets: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    criterion: SplitCriterion,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: usize,
    rng: ChaCha8Rng,
    nodes: Vec<Node>,
}

impl Grower<'_> {
    fn class_counts(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[self.targets[i]] += self.weights[i];
        }
        counts
    }

    /// Grows the subtree over `indices` and returns its root id.
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&indices);
        let weighted: f64 = counts.iter().sum();
        let impurity = self.criterion.impurity(&counts);
        let id = self.nodes.len();

        let splittable = impurity > f64::EPSILON
            && indices.len() >= self.min_samples_split
            && indices.len() >= 2 * self.min_samples_leaf
            && self.max_depth.map_or(true, |d| depth < d);

        if splittable {
            if let Some(best) = self.best_split(&indices, &counts, impurity, weighted) {
                let records = self.records;
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .into_iter()
                    .partition(|&i| records[[i, best.feature]] <= best.threshold);

                // Reserve the slot so children get larger ids.
                self.nodes.push(Node::Leaf {
                    distribution: Vec::new(),
                    impurity,
                    weighted_samples: weighted,
                });
                let left = self.grow(left_idx, depth + 1);
                let right = self.grow(right_idx, depth + 1);
                self.nodes[id] = Node::Split {
                    feature: best.feature,
                    threshold: best.threshold,
                    left,
                    right,
                    impurity,
                    weighted_samples: weighted,
                };
                return id;
            }
        }

        let distribution = counts.iter().map(|c| c / weighted).collect();
        self.nodes.push(Node::Leaf {
            distribution,
            impurity,
            weighted_samples: weighted,
        });
        id
    }

    /// Best split over at most `max_features` non-constant features.
    ///
    /// Features are visited in a seeded random order; constant features are
    /// skipped without counting against `max_features`.
    fn best_split(
        &mut self,
        indices: &[usize],
        counts: &[f64],
        impurity: f64,
        weighted: f64,
    ) -> Option<Candidate> {
        let records = self.records;
        let mut features: Vec<usize> = (0..records.ncols()).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<Candidate> = None;
        let mut visited = 0;
        let mut sorted = indices.to_vec();
        let n = sorted.len();

        for feature in features {
            if visited >= self.max_features {
                break;
            }
            let column = records.column(feature);
            sorted.sort_by(|&a, &b| column[a].total_cmp(&column[b]));
            if column[sorted[n - 1]] <= column[sorted[0]] + FEATURE_THRESHOLD {
                continue;
            }
            visited += 1;

            let mut left = vec![0.0; self.n_classes];
            let mut right = counts.to_vec();
            for pos in 0..n - 1 {
                let i = sorted[pos];
                left[self.targets[i]] += self.weights[i];
                right[self.targets[i]] -= self.weights[i];

                let n_left = pos + 1;
                if n_left < self.min_samples_leaf || n - n_left < self.min_samples_leaf {
                    continue;
                }
                let current = column[i];
                let next = column[sorted[pos + 1]];
                if next <= current + FEATURE_THRESHOLD {
                    continue;
                }

                let w_left: f64 = left.iter().sum();
                let w_right = weighted - w_left;
                let children = (w_left * self.criterion.impurity(&left)
                    + w_right * self.criterion.impurity(&right))
                    / weighted;
                let decrease = impurity - children;

                if best.as_ref().map_or(true, |b| decrease > b.decrease) {
                    let mut threshold = current / 2.0 + next / 2.0;
                    if !(threshold < next) {
                        threshold = current;
                    }
                    best = Some(Candidate {
                        feature,
                        threshold,
                        decrease,
                    });
                }
            }
        }
        best
    }
}
