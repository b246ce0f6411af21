use ndarray::Zip;

use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Clipping bound applied to predictions before the cross-entropy logs.
const CLIP_EPSILON: f64 = 1e-15;

/// A stateless loss with its gradient, evaluated over same-shaped
/// prediction and target matrices.
pub trait LossFunction {
    fn loss(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<f64>;

    /// Gradient of the loss with respect to the predictions, same shape as
    /// the predictions.
    fn gradient(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<Matrix>;
}

fn check_shapes(y_true: &Matrix, y_pred: &Matrix) -> Result<()> {
    if y_true.shape() != y_pred.shape() {
        return Err(Error::ShapeMismatch {
            expected: y_true.shape(),
            got: y_pred.shape(),
        });
    }
    Ok(())
}

/// `mean((y_pred - y_true)^2)` over every entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanSquaredError;

impl LossFunction for MeanSquaredError {
    fn loss(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<f64> {
        check_shapes(y_true, y_pred)?;
        let diff = y_pred.as_array() - y_true.as_array();
        Ok(diff.mapv(|d| d * d).mean().unwrap())
    }

    fn gradient(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<Matrix> {
        check_shapes(y_true, y_pred)?;
        let n = (y_true.rows() * y_true.cols()) as f64;
        let diff = y_pred.as_array() - y_true.as_array();
        Ok(Matrix::from_array_unchecked(diff * (2.0 / n)))
    }
}

/// Binary cross-entropy with predictions clipped away from 0 and 1 so the
/// logs stay finite. The clipping is the only value coercion in the crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryCrossEntropy;

impl LossFunction for BinaryCrossEntropy {
    fn loss(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<f64> {
        check_shapes(y_true, y_pred)?;
        let clipped = y_pred
            .as_array()
            .mapv(|p| p.max(CLIP_EPSILON).min(1.0 - CLIP_EPSILON));
        let per_entry = Zip::from(&clipped)
            .and(y_true.as_array())
            .map_collect(|&p, &y| -y * p.ln() - (1.0 - y) * (1.0 - p).ln());
        Ok(per_entry.mean().unwrap())
    }

    fn gradient(&self, y_true: &Matrix, y_pred: &Matrix) -> Result<Matrix> {
        check_shapes(y_true, y_pred)?;
        let n = (y_true.rows() * y_true.cols()) as f64;
        let clipped = y_pred
            .as_array()
            .mapv(|p| p.max(CLIP_EPSILON).min(1.0 - CLIP_EPSILON));
        let gradient = Zip::from(&clipped)
            .and(y_true.as_array())
            .map_collect(|&p, &y| (p - y) / (p * (1.0 - p)) / n);
        Ok(Matrix::from_array_unchecked(gradient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mse_zero_on_exact_predictions() {
        let y = Matrix::new(vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let loss = MeanSquaredError.loss(&y, &y).unwrap();
        assert_abs_diff_eq!(loss, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mse_value_and_gradient() {
        let y_true = Matrix::new(vec![vec![1.0], vec![2.0]]).unwrap();
        let y_pred = Matrix::new(vec![vec![2.0], vec![4.0]]).unwrap();

        // ((2-1)^2 + (4-2)^2) / 2 = 2.5
        let loss = MeanSquaredError.loss(&y_true, &y_pred).unwrap();
        assert_abs_diff_eq!(loss, 2.5, epsilon = 1e-12);

        // 2 * (pred - true) / n
        let gradient = MeanSquaredError.gradient(&y_true, &y_pred).unwrap();
        assert_eq!(gradient.shape(), (2, 1));
        assert_abs_diff_eq!(gradient.get(0, 0).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(gradient.get(1, 0).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mse_shape_mismatch() {
        let a = Matrix::zeros(2, 1).unwrap();
        let b = Matrix::zeros(3, 1).unwrap();
        assert!(matches!(
            MeanSquaredError.loss(&a, &b),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            MeanSquaredError.gradient(&a, &b),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_bce_known_value() {
        let y_true = Matrix::new(vec![vec![1.0], vec![0.0]]).unwrap();
        let y_pred = Matrix::new(vec![vec![0.9], vec![0.1]]).unwrap();

        // both entries contribute -ln(0.9)
        let loss = BinaryCrossEntropy.loss(&y_true, &y_pred).unwrap();
        assert_abs_diff_eq!(loss, -(0.9_f64.ln()), epsilon = 1e-12);
    }

    #[test]
    fn test_bce_clipping_keeps_loss_finite() {
        let y_true = Matrix::new(vec![vec![1.0], vec![0.0]]).unwrap();
        let y_pred = Matrix::new(vec![vec![0.0], vec![1.0]]).unwrap();

        let loss = BinaryCrossEntropy.loss(&y_true, &y_pred).unwrap();
        assert!(loss.is_finite());

        let gradient = BinaryCrossEntropy.gradient(&y_true, &y_pred).unwrap();
        assert!(gradient.as_array().iter().all(|g| g.is_finite()));
    }

    #[test]
    fn test_bce_gradient_sign() {
        let y_true = Matrix::new(vec![vec![1.0]]).unwrap();
        let y_pred = Matrix::new(vec![vec![0.3]]).unwrap();

        // Underestimating the positive class pushes the prediction up.
        let gradient = BinaryCrossEntropy.gradient(&y_true, &y_pred).unwrap();
        assert!(gradient.get(0, 0).unwrap() < 0.0);
    }
}
