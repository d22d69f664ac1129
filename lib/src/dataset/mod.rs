//! Dataset abstractions for classification workloads.
//!
//! This module provides a generic [`Dataset`] trait for uniform access to labeled
//! records and a [`DatasetBatchIter`] iterator for walking a dataset in fixed-size
//! chunks (used for evaluation over large sources).
//!
//! # Core Concepts
//!
//! - **Dataset** — A source of `(X, y)` pairs where `X` is a record matrix of shape
//!   `(n_samples, n_features)` and `y` holds one integer class label per sample.
//! - **Batch** — A contiguous subset of samples `[start, end)`.
//!
//! # Example
//!
//! ```rust
//! use iris_forest::dataset::{Dataset, InMemoryDataset};
//! use ndarray::array;
//!
//! let x = array![[1.0, 0.5], [2.0, 1.5]];
//! let y = vec![0, 1];
//! let dataset = InMemoryDataset::new(x, y).unwrap();
//!
//! for batch in dataset.batches(1) {
//!     let (records, targets) = batch.unwrap();
//!     assert_eq!(records.nrows(), targets.len());
//! }
//! ```

use ndarray::Array2;
use std::{fmt::Debug, ops::Range};

pub mod iris;
pub mod memory;
pub use self::iris::load_iris;
pub use self::memory::InMemoryDataset;

/// Abstract interface for a labeled classification dataset.
///
/// Defines a contract for loading data in `(X, y)` format where:
/// - `X` — Record matrix with shape `(n_samples, n_features)`
/// - `y` — Class labels with length `n_samples`
pub trait Dataset {
    /// Error type returned when accessing data.
    type Error: Debug + 'static;

    /// Returns the total number of samples in the dataset, if known.
    ///
    /// - `Some(n)` — Exact number of samples
    /// - `None` — Size is unknown (e.g., streaming sources)
    fn len(&self) -> Option<usize>;

    /// Checks whether the dataset is empty.
    ///
    /// Default implementation checks if `len() == Some(0)`.
    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Number of feature columns per record.
    fn n_features(&self) -> usize;

    /// Creates an iterator over fixed-size batches.
    ///
    /// Returns batches of size `batch_size`, except possibly the last one.
    /// Errors from [`get_batch`](Dataset::get_batch) are yielded as `Some(Err(e))`.
    fn batches(&self, batch_size: usize) -> DatasetBatchIter<'_, Self>
    where
        Self: Sized,
    {
        DatasetBatchIter {
            dataset: self,
            batch_size,
            current: 0,
        }
    }

    /// Loads a subset of data for the given index range `[start, end)`.
    ///
    /// Boundary checks are the implementor's responsibility.
    fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Vec<usize>), Self::Error>;
}

/// Iterator over dataset batches.
///
/// Created by [`Dataset::batches`], yields consecutive batches of fixed size
/// (last batch may be smaller than requested). Data is fetched lazily and the
/// iterator stops immediately when the dataset length is unknown.
pub struct DatasetBatchIter<'a, D: ?Sized> {
    dataset: &'a D,
    batch_size: usize,
    /// Index of the next sample to yield.
    current: usize,
}

impl<D: Dataset> Iterator for DatasetBatchIter<'_, D> {
    type Item = Result<(Array2<f64>, Vec<usize>), D::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len()?;
        if self.current >= total || self.batch_size == 0 {
            return None;
        }

        let end = (self.current + self.batch_size).min(total);
        let range = self.current..end;
        self.current = end;

        Some(self.dataset.get_batch(range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock dataset for iterator logic testing
    struct MockDataset {
        len: usize,
    }

    impl Dataset for MockDataset {
        type Error = &'static str;

        fn len(&self) -> Option<usize> {
            Some(self.len)
        }

        fn n_features(&self) -> usize {
            2
        }

        fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Vec<usize>), Self::Error> {
            if range.start >= self.len || range.end > self.len {
                return Err("range out of bounds");
            }

            let n = range.len();
            let start = range.start;

            // X: (n, 2), unique values per sample
            let data: Vec<f64> = (0..n * 2).map(|i| (start * 2 + i) as f64).collect();
            let x = Array2::from_shape_vec((n, 2), data).map_err(|_| "bad shape")?;
            let y = range.map(|i| i % 3).collect();

            Ok((x, y))
        }
    }

    #[test]
    fn test_dataset_is_empty() {
        let empty = MockDataset { len: 0 };
        assert!(empty.is_empty());

        let non_empty = MockDataset { len: 1 };
        assert!(!non_empty.is_empty());
    }

    #[test]
    fn test_batches_full() {
        let dataset = MockDataset { len: 6 };
        let mut iter = dataset.batches(2);

        for i in 0..3 {
            let (x, y) = iter.next().unwrap().unwrap();
            assert_eq!(x.dim(), (2, 2));
            assert_eq!(y, vec![(i * 2) % 3, (i * 2 + 1) % 3]);
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_batches_partial_last() {
        let dataset = MockDataset { len: 5 };
        let mut iter = dataset.batches(2);

        assert_eq!(iter.next().unwrap().unwrap().0.dim(), (2, 2));
        assert_eq!(iter.next().unwrap().unwrap().0.dim(), (2, 2));
        assert_eq!(iter.next().unwrap().unwrap().0.dim(), (1, 2));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_batches_larger_than_dataset() {
        let dataset = MockDataset { len: 3 };
        let mut iter = dataset.batches(10);

        let batch = iter.next().unwrap().unwrap();
        assert_eq!(batch.0.dim(), (3, 2));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_batches_empty_dataset() {
        let dataset = MockDataset { len: 0 };
        assert!(dataset.batches(2).next().is_none());
    }

    #[test]
    fn test_batches_zero_size_yields_nothing() {
        let dataset = MockDataset { len: 4 };
        assert!(dataset.batches(0).next().is_none());
    }

    // Streaming source whose size is not known up front
    struct UnsizedDataset;

    impl Dataset for UnsizedDataset {
        type Error = &'static str;

        fn len(&self) -> Option<usize> {
            None
        }

        fn n_features(&self) -> usize {
            2
        }

        fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Vec<usize>), Self::Error> {
            Ok((Array2::zeros((range.len(), 2)), vec![0; range.len()]))
        }
    }

    #[test]
    fn test_batches_unknown_length_yields_nothing() {
        let dataset = UnsizedDataset;
        assert!(!dataset.is_empty());
        assert!(dataset.batches(4).next().is_none());
    }
}
