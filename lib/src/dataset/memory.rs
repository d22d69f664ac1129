use std::ops::Range;

use ndarray::{s, Array2};

use crate::dataset::Dataset;
use crate::error::{ForestError, Result};

/// Labeled records held entirely in memory.
///
/// Rows of `records` are samples; `targets[i]` is the class label of row `i`.
/// Labels are dense integers starting at `0`.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    records: Array2<f64>,
    targets: Vec<usize>,
    feature_names: Vec<String>,
    target_names: Vec<String>,
}

impl InMemoryDataset {
    pub fn new(records: Array2<f64>, targets: Vec<usize>) -> Result<Self> {
        if records.nrows() != targets.len() {
            return Err(ForestError::InvalidData(format!(
                "records have {} rows but {} targets were given",
                records.nrows(),
                targets.len()
            )));
        }
        if targets.is_empty() {
            return Err(ForestError::EmptyData("dataset has no samples".into()));
        }
        if records.ncols() == 0 {
            return Err(ForestError::EmptyData("dataset has no features".into()));
        }
        if records.iter().any(|v| !v.is_finite()) {
            return Err(ForestError::InvalidData(
                "records must not contain NaN or infinite values".into(),
            ));
        }
        Ok(Self {
            records,
            targets,
            feature_names: Vec::new(),
            target_names: Vec::new(),
        })
    }

    /// Attaches column names. The count must match the number of features.
    pub fn with_feature_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.records.ncols() {
            return Err(ForestError::FeatureMismatch {
                expected: self.records.ncols(),
                got: names.len(),
            });
        }
        self.feature_names = names;
        Ok(self)
    }

    /// Attaches class names, indexed by label.
    pub fn with_target_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() < self.n_classes() {
            return Err(ForestError::InvalidData(format!(
                "{} target names given for {} classes",
                names.len(),
                self.n_classes()
            )));
        }
        self.target_names = names;
        Ok(self)
    }

    pub fn records(&self) -> &Array2<f64> {
        &self.records
    }

    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    /// Number of distinct classes assumed by the labels (`max label + 1`).
    pub fn n_classes(&self) -> usize {
        self.targets.iter().max().map_or(0, |&m| m + 1)
    }

    /// Per-class sample counts, indexed by label.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes()];
        for &t in &self.targets {
            counts[t] += 1;
        }
        counts
    }
}

impl Dataset for InMemoryDataset {
    type Error = ForestError;

    fn len(&self) -> Option<usize> {
        Some(self.targets.len())
    }

    fn n_features(&self) -> usize {
        self.records.ncols()
    }

    fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Vec<usize>)> {
        if range.start > range.end || range.end > self.targets.len() {
            return Err(ForestError::InvalidData(format!(
                "batch range {}..{} out of bounds for {} samples",
                range.start,
                range.end,
                self.targets.len()
            )));
        }
        let records = self.records.slice(s![range.clone(), ..]).to_owned();
        let targets = self.targets[range].to_vec();
        Ok((records, targets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = InMemoryDataset::new(array![[1.0], [2.0]], vec![0]).unwrap_err();
        assert!(matches!(err, ForestError::InvalidData(_)));
    }

    #[test]
    fn test_new_rejects_empty() {
        let records = Array2::<f64>::zeros((0, 4));
        let err = InMemoryDataset::new(records, vec![]).unwrap_err();
        assert!(matches!(err, ForestError::EmptyData(_)));
    }

    #[test]
    fn test_new_rejects_nan() {
        let err = InMemoryDataset::new(array![[f64::NAN]], vec![0]).unwrap_err();
        assert!(matches!(err, ForestError::InvalidData(_)));
    }

    #[test]
    fn test_n_classes_and_counts() {
        let ds = InMemoryDataset::new(array![[0.0], [1.0], [2.0], [3.0]], vec![0, 2, 2, 1]).unwrap();
        assert_eq!(ds.n_classes(), 3);
        assert_eq!(ds.class_counts(), vec![1, 1, 2]);
    }

    #[test]
    fn test_feature_names_must_match_columns() {
        let ds = InMemoryDataset::new(array![[0.0, 1.0]], vec![0]).unwrap();
        let err = ds.clone().with_feature_names(["a"]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::FeatureMismatch { expected: 2, got: 1 }
        ));
        let named = ds.with_feature_names(["a", "b"]).unwrap();
        assert_eq!(named.feature_names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_get_batch_slices_rows() {
        let ds = InMemoryDataset::new(array![[0.0, 0.1], [1.0, 1.1], [2.0, 2.1]], vec![0, 1, 2])
            .unwrap();
        let (x, y) = ds.get_batch(1..3).unwrap();
        assert_eq!(x, array![[1.0, 1.1], [2.0, 2.1]]);
        assert_eq!(y, vec![1, 2]);
    }

    #[test]
    fn test_get_batch_out_of_bounds() {
        let ds = InMemoryDataset::new(array![[0.0]], vec![0]).unwrap();
        assert!(ds.get_batch(0..2).is_err());
    }
}
