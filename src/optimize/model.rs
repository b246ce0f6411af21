use ndarray::{Array2, Axis};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::loss::LossFunction;
use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Initial weights are drawn uniformly from this symmetric range.
const INIT_SPREAD: f64 = 0.01;

/// Contract between the optimizer and anything it can train.
///
/// `parameters` returns owned copies in a fixed order;
/// `compute_gradients` must match that order; `update_parameters` subtracts
/// same-shaped updates in place.
pub trait OptimizableModel {
    fn predict(&self, x: &Matrix) -> Result<Matrix>;

    fn parameters(&self) -> Vec<Matrix>;

    fn update_parameters(&mut self, updates: &[Matrix]) -> Result<()>;

    fn compute_gradients(
        &self,
        x: &Matrix,
        y_true: &Matrix,
        loss: &dyn LossFunction,
    ) -> Result<Vec<Matrix>>;
}

/// Linear model `y = X W + b` with a weight matrix and a bias row.
#[derive(Clone, Debug)]
pub struct LinearRegression {
    weights: Matrix,
    bias: Matrix,
}

impl LinearRegression {
    pub fn new(input_dim: usize, output_dim: usize) -> Result<Self> {
        Self::init(input_dim, output_dim, &mut rand::thread_rng())
    }

    /// Deterministic initialization for reproducible training runs.
    pub fn seeded(input_dim: usize, output_dim: usize, seed: u64) -> Result<Self> {
        Self::init(input_dim, output_dim, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    fn init<R: Rng + ?Sized>(input_dim: usize, output_dim: usize, rng: &mut R) -> Result<Self> {
        if input_dim == 0 || output_dim == 0 {
            return Err(Error::InvalidShape {
                reason: "model dimensions must be at least 1".to_string(),
            });
        }
        let spread = Uniform::new(-INIT_SPREAD, INIT_SPREAD);
        let weights = Array2::random_using((input_dim, output_dim), spread, rng);
        let bias = Array2::random_using((1, output_dim), spread, rng);
        Ok(Self {
            weights: Matrix::from_array_unchecked(weights),
            bias: Matrix::from_array_unchecked(bias),
        })
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn bias(&self) -> &Matrix {
        &self.bias
    }
}

impl OptimizableModel for LinearRegression {
    /// `X W` plus the bias row broadcast across all sample rows.
    fn predict(&self, x: &Matrix) -> Result<Matrix> {
        if x.cols() != self.weights.rows() {
            return Err(Error::FeatureMismatch {
                expected: self.weights.rows(),
                got: x.cols(),
            });
        }
        let out = x.as_array().dot(self.weights.as_array()) + self.bias.as_array();
        Ok(Matrix::from_array_unchecked(out))
    }

    fn parameters(&self) -> Vec<Matrix> {
        vec![self.weights.clone(), self.bias.clone()]
    }

    fn update_parameters(&mut self, updates: &[Matrix]) -> Result<()> {
        if updates.len() != 2 {
            return Err(Error::InvalidShape {
                reason: format!("expected 2 parameter updates, got {}", updates.len()),
            });
        }
        for (shape, update) in [
            (self.weights.shape(), &updates[0]),
            (self.bias.shape(), &updates[1]),
        ] {
            if update.shape() != shape {
                return Err(Error::ShapeMismatch {
                    expected: shape,
                    got: update.shape(),
                });
            }
        }
        self.weights =
            Matrix::from_array_unchecked(self.weights.as_array() - updates[0].as_array());
        self.bias = Matrix::from_array_unchecked(self.bias.as_array() - updates[1].as_array());
        Ok(())
    }

    /// `[X^T g, column-sums of g]` for the loss gradient `g` at the current
    /// predictions.
    fn compute_gradients(
        &self,
        x: &Matrix,
        y_true: &Matrix,
        loss: &dyn LossFunction,
    ) -> Result<Vec<Matrix>> {
        let predictions = self.predict(x)?;
        let gradient = loss.gradient(y_true, &predictions)?;
        let grad_weights = x.as_array().t().dot(gradient.as_array());
        let grad_bias = gradient.as_array().sum_axis(Axis(0)).insert_axis(Axis(0));
        Ok(vec![
            Matrix::from_array_unchecked(grad_weights),
            Matrix::from_array_unchecked(grad_bias),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::super::loss::MeanSquaredError;
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_initialization_range_and_shapes() {
        let model = LinearRegression::seeded(3, 2, 1).unwrap();
        assert_eq!(model.weights().shape(), (3, 2));
        assert_eq!(model.bias().shape(), (1, 2));
        assert!(
            model
                .weights()
                .as_array()
                .iter()
                .all(|w| w.abs() <= INIT_SPREAD)
        );
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(LinearRegression::new(0, 1).is_err());
        assert!(LinearRegression::new(1, 0).is_err());
    }

    #[test]
    fn test_seeded_initialization_is_deterministic() {
        let a = LinearRegression::seeded(4, 2, 99).unwrap();
        let b = LinearRegression::seeded(4, 2, 99).unwrap();
        assert!(a.weights().equals(b.weights(), 0.0));
        assert!(a.bias().equals(b.bias(), 0.0));
    }

    #[test]
    fn test_predict_broadcasts_bias() {
        let mut model = LinearRegression::seeded(1, 1, 2).unwrap();
        // Pin the parameters to y = 2x + 1.
        model
            .update_parameters(&[
                model.weights().subtract(&Matrix::new(vec![vec![2.0]]).unwrap()).unwrap(),
                model.bias().subtract(&Matrix::new(vec![vec![1.0]]).unwrap()).unwrap(),
            ])
            .unwrap();

        let x = Matrix::new(vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let predictions = model.predict(&x).unwrap();
        assert_abs_diff_eq!(predictions.get(0, 0).unwrap(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(predictions.get(1, 0).unwrap(), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(predictions.get(2, 0).unwrap(), 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_predict_feature_mismatch() {
        let model = LinearRegression::seeded(2, 1, 3).unwrap();
        let x = Matrix::zeros(4, 3).unwrap();
        assert!(matches!(
            model.predict(&x),
            Err(Error::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_gradient_shapes_match_parameters() {
        let model = LinearRegression::seeded(3, 2, 4).unwrap();
        let x = Matrix::ones(5, 3).unwrap();
        let y = Matrix::zeros(5, 2).unwrap();

        let parameters = model.parameters();
        let gradients = model.compute_gradients(&x, &y, &MeanSquaredError).unwrap();
        assert_eq!(gradients.len(), parameters.len());
        for (gradient, parameter) in gradients.iter().zip(parameters.iter()) {
            assert_eq!(gradient.shape(), parameter.shape());
        }
    }

    #[test]
    fn test_update_parameters_validates_input() {
        let mut model = LinearRegression::seeded(2, 1, 5).unwrap();
        assert!(matches!(
            model.update_parameters(&[Matrix::zeros(2, 1).unwrap()]),
            Err(Error::InvalidShape { .. })
        ));
        assert!(matches!(
            model.update_parameters(&[
                Matrix::zeros(3, 1).unwrap(),
                Matrix::zeros(1, 1).unwrap()
            ]),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
