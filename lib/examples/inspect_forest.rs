//! Fits the Iris forest, reports what it learned and checks a save/load round trip.
//!
//! Run with `cargo run --example inspect_forest`.

use iris_forest::dataset::{load_iris, Dataset};
use iris_forest::metrics::confusion_matrix;
use iris_forest::model::{
    Fitted, ForestConfig, InferenceModel, RandomForestClassifier, SplitCriterion, TrainableModel,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let iris = load_iris()?;
    println!(
        "Loaded {} samples with {} features",
        iris.len().unwrap_or(0),
        iris.n_features()
    );

    for criterion in [SplitCriterion::Gini, SplitCriterion::Entropy] {
        let forest = RandomForestClassifier::new(ForestConfig::default().criterion(criterion))
            .fit(&iris)?;
        println!("\n{:?}: training accuracy {:.3}", criterion, forest.score(&iris)?);

        for (name, importance) in iris.feature_names().iter().zip(forest.feature_importances()) {
            println!("  {:<20} {:.3}", name, importance);
        }

        let depths: Vec<usize> = forest.trees().iter().map(|t| t.depth()).collect();
        println!("  tree depths: {:?}", depths);
    }

    let forest = RandomForestClassifier::new(ForestConfig::default()).fit(&iris)?;
    let preds = forest.predict_batch(iris.records().view())?;
    println!("\nConfusion matrix (rows = true class):");
    println!("{}", confusion_matrix(iris.targets(), &preds, iris.n_classes()));

    let dir = std::env::temp_dir().join("iris-forest-example");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("model.pkl");
    forest.save_to_file(&path)?;
    let restored = RandomForestClassifier::<Fitted>::load_from_file(&path)?;
    let restored_preds = restored.predict_batch(iris.records().view())?;
    println!(
        "Reloaded {} trees from {}; predictions identical: {}",
        restored.n_estimators(),
        path.display(),
        restored_preds == preds
    );

    Ok(())
}
