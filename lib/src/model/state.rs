/// A marker type indicating that a model is **not yet trained**.
///
/// Used as the state parameter (e.g., `RandomForestClassifier<Unfitted>`)
/// to enforce compile-time guarantees:
/// - Fitting (via [`TrainableModel::fit`](super::TrainableModel::fit)) requires an `Unfitted` model.
/// - Prediction and persistence are **not available** until the model becomes `Fitted`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unfitted;

/// A marker type indicating that a model has been **fully trained**.
///
/// A `Fitted` model implements [`InferenceModel`](super::InferenceModel) and can be
/// queried or written to disk. Its persisted form contains only the grown trees,
/// never the hyperparameters used to grow them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fitted;
