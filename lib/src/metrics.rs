//! Metrics for evaluating classifiers.

use ndarray::Array2;

/// Fraction of predictions equal to the ground truth.
///
/// Returns `0.0` for empty input.
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "Arrays must have the same length"
    );

    if y_true.is_empty() {
        return 0.0;
    }

    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();

    correct as f64 / y_true.len() as f64
}

/// Confusion matrix with true labels on rows and predicted labels on columns.
///
/// Labels at or above `n_classes` are ignored.
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Array2<usize> {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "Arrays must have the same length"
    );

    let mut matrix = Array2::zeros((n_classes, n_classes));
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        if t < n_classes && p < n_classes {
            matrix[[t, p]] += 1;
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy_perfect() {
        assert_eq!(accuracy(&[0, 1, 2], &[0, 1, 2]), 1.0);
    }

    #[test]
    fn test_accuracy_partial() {
        assert_eq!(accuracy(&[0, 1, 2, 2], &[0, 2, 2, 1]), 0.5);
    }

    #[test]
    fn test_accuracy_empty() {
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    #[should_panic(expected = "Arrays must have the same length")]
    fn test_accuracy_length_mismatch() {
        accuracy(&[0, 1], &[0]);
    }

    #[test]
    fn test_confusion_matrix() {
        let m = confusion_matrix(&[0, 0, 1, 2, 2], &[0, 1, 1, 2, 0], 3);
        assert_eq!(m, array![[1, 1, 0], [0, 1, 0], [1, 0, 1]]);
    }
}
