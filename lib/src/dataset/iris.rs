use csv::ReaderBuilder;
use ndarray::Array2;

use crate::dataset::InMemoryDataset;
use crate::error::{ForestError, Result};

/// Fisher's Iris table compiled into the crate.
///
/// Columns: sepal length, sepal width, petal length, petal width (cm), target.
const IRIS_CSV: &str = include_str!("../../data/iris.csv");

pub const IRIS_FEATURE_NAMES: [&str; 4] = [
    "sepal length (cm)",
    "sepal width (cm)",
    "petal length (cm)",
    "petal width (cm)",
];

pub const IRIS_TARGET_NAMES: [&str; 3] = ["setosa", "versicolor", "virginica"];

/// Load the bundled Iris dataset.
///
/// 150 samples, 4 features, 3 classes with 50 samples each. The data is
/// parsed from the embedded table on every call and never touches disk.
///
/// # Example
///
/// ```
/// use iris_forest::dataset::{load_iris, Dataset};
///
/// let iris = load_iris().unwrap();
/// assert_eq!(iris.len(), Some(150));
/// assert_eq!(iris.n_features(), 4);
/// ```
pub fn load_iris() -> Result<InMemoryDataset> {
    let mut rdr = ReaderBuilder::new().from_reader(IRIS_CSV.as_bytes());
    let n_features = IRIS_FEATURE_NAMES.len();

    let mut data = Vec::with_capacity(150 * n_features);
    let mut targets = Vec::with_capacity(150);

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() != n_features + 1 {
            return Err(ForestError::InvalidData(format!(
                "iris row {} has {} columns, expected {}",
                row,
                record.len(),
                n_features + 1
            )));
        }
        for field in record.iter().take(n_features) {
            let value: f64 = field.trim().parse().map_err(|_| {
                ForestError::InvalidData(format!("iris row {row}: bad feature value {field:?}"))
            })?;
            data.push(value);
        }
        let target: usize = record[n_features].trim().parse().map_err(|_| {
            ForestError::InvalidData(format!(
                "iris row {row}: bad target {:?}",
                &record[n_features]
            ))
        })?;
        targets.push(target);
    }

    let records = Array2::from_shape_vec((targets.len(), n_features), data)?;
    InMemoryDataset::new(records, targets)?
        .with_feature_names(IRIS_FEATURE_NAMES)?
        .with_target_names(IRIS_TARGET_NAMES)
}
