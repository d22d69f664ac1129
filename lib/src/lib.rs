//! # iris-forest
//!
//! A type-safe random-forest classifier trained on the bundled Iris dataset,
//! with deterministic fitting and on-disk model persistence.
//!
//! ## Core Design Principles
//!
//! - **Stateful Type Safety**: Models carry their training state in the type system
//!   (`Unfitted` vs `Fitted`), so predicting with or saving an untrained model does
//!   not compile.
//! - **Reproducibility**: All randomness flows from one seed through
//!   `rand_chacha`, so the same seed yields the same trees and byte-identical
//!   artifacts.
//! - **Plain-data persistence**: Fitted models expose their parameters as plain
//!   structs encoded with `bincode`; no hyperparameters are stored.
//!
//! ## Quick Start
//!
//! ```rust
//! use iris_forest::dataset::load_iris;
//! use iris_forest::model::{ForestConfig, InferenceModel, RandomForestClassifier, TrainableModel};
//! use ndarray::array;
//!
//! let iris = load_iris().unwrap();
//! let forest = RandomForestClassifier::new(ForestConfig::default().n_estimators(10).random_state(42))
//!     .fit(&iris)
//!     .unwrap();
//!
//! let label = forest.predict(array![5.1, 3.5, 1.4, 0.2].view()).unwrap();
//! assert!(label < 3);
//! ```
//!
//! ## Module Structure
//!
//! - `dataset` — `Dataset` trait, batch iteration, in-memory data and the Iris loader
//! - `model` — decision tree and random forest with stateful type parameters
//! - `metrics` — accuracy and confusion matrix
//! - `serialization` — parameter codec and atomic artifact writes
//! - `trainer` — the load → fit → save → predict pipeline

/// Data loading utilities and dataset abstractions.
pub mod dataset;

/// Crate-wide error type.
pub mod error;

/// Classification metrics.
pub mod metrics;

/// Tree-based classifiers with compile-time state safety.
pub mod model;

/// Model persistence.
pub mod serialization;

/// End-to-end training pipeline.
pub mod trainer;

pub use error::{ForestError, Result};
pub use model::{Fitted, InferenceModel, TrainableModel, Unfitted};
pub use trainer::{run, TrainReport, Trainer, TrainerBuilder};
