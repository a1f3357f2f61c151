use ndarray::Array1;

use crate::error::{Error, Result};

/// Cross entropy against a one-hot target: -ln(probabilities[label]).
/// The probability is clamped away from zero so a saturated softmax yields a
/// large finite loss instead of infinity.
pub fn cross_entropy(probabilities: &Array1<f64>, label: usize) -> Result<f64> {
    if label >= probabilities.len() {
        return Err(Error::InvalidLabel {
            label,
            classes: probabilities.len(),
        });
    }
    let epsilon = 1e-15;
    Ok(-probabilities[label].max(epsilon).ln())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cross_entropy_perfect_prediction_is_zero() {
        let p = array![0.0, 1.0, 0.0];
        assert_eq!(cross_entropy(&p, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_cross_entropy_zero_probability_is_finite() {
        let p = array![1.0, 0.0];
        let loss = cross_entropy(&p, 1).unwrap();
        assert!(loss.is_finite());
        assert!(loss > 30.0);
    }

    #[test]
    fn test_cross_entropy_rejects_out_of_range_label() {
        let p = array![0.5, 0.5];
        assert!(matches!(
            cross_entropy(&p, 2),
            Err(Error::InvalidLabel { label: 2, classes: 2 })
        ));
    }
}
