use std::str::FromStr;

use log::debug;
use ndarray::Array2;

use super::loss::LossFunction;
use super::model::OptimizableModel;
use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Update rule used by [`GradientDescent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Sgd,
    Momentum,
    Adam,
}

impl Method {
    /// Parses `"sgd"`, `"momentum"` or `"adam"`; anything else fails fast.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "sgd" => Ok(Self::Sgd),
            "momentum" => Ok(Self::Momentum),
            "adam" => Ok(Self::Adam),
            other => Err(Error::UnknownOptimizationMethod(other.to_string())),
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Loss trajectory of a [`GradientDescent::optimize`] run.
#[derive(Clone, Debug)]
pub struct OptimizeOutcome {
    /// Loss recorded at the start of each iteration.
    pub losses: Vec<f64>,
    pub converged: bool,
    /// Equal to `losses.len()`.
    pub iterations: usize,
}

/// Gradient-descent driver over any model/loss pair.
///
/// Per-parameter optimizer state (velocities, moment estimates) is
/// re-initialized at the start of every `optimize` call; nothing persists
/// across calls. There is no gradient clipping and no divergence detection:
/// an unstable learning rate shows up as a growing loss history.
#[derive(Clone, Debug)]
pub struct GradientDescent {
    learning_rate: f64,
    max_iterations: usize,
    tolerance: f64,
    method: Method,
    momentum_beta: f64,
    adam_beta1: f64,
    adam_beta2: f64,
    adam_epsilon: f64,
}

impl GradientDescent {
    pub fn new(learning_rate: f64, max_iterations: usize, tolerance: f64, method: Method) -> Self {
        Self {
            learning_rate,
            max_iterations,
            tolerance,
            method,
            momentum_beta: 0.9,
            adam_beta1: 0.9,
            adam_beta2: 0.999,
            adam_epsilon: 1e-8,
        }
    }

    pub fn momentum_beta(mut self, momentum_beta: f64) -> Self {
        self.momentum_beta = momentum_beta;
        self
    }

    pub fn adam_beta1(mut self, adam_beta1: f64) -> Self {
        self.adam_beta1 = adam_beta1;
        self
    }

    pub fn adam_beta2(mut self, adam_beta2: f64) -> Self {
        self.adam_beta2 = adam_beta2;
        self
    }

    pub fn adam_epsilon(mut self, adam_epsilon: f64) -> Self {
        self.adam_epsilon = adam_epsilon;
        self
    }

    pub fn optimize(
        &self,
        model: &mut dyn OptimizableModel,
        x: &Matrix,
        y: &Matrix,
        loss_fn: &dyn LossFunction,
    ) -> Result<OptimizeOutcome> {
        let shapes: Vec<(usize, usize)> = model.parameters().iter().map(|p| p.shape()).collect();
        let mut velocity: Vec<Array2<f64>> =
            shapes.iter().map(|&shape| Array2::zeros(shape)).collect();
        let mut first_moment: Vec<Array2<f64>> =
            shapes.iter().map(|&shape| Array2::zeros(shape)).collect();
        let mut second_moment: Vec<Array2<f64>> =
            shapes.iter().map(|&shape| Array2::zeros(shape)).collect();
        let mut step = 0usize;

        let mut losses = Vec::new();
        let mut converged = false;
        let mut previous = f64::INFINITY;

        for _ in 0..self.max_iterations {
            let predictions = model.predict(x)?;
            let loss = loss_fn.loss(y, &predictions)?;
            losses.push(loss);

            // Converged: stop without taking a further update this iteration.
            if (previous - loss).abs() < self.tolerance {
                converged = true;
                break;
            }
            previous = loss;

            let gradients = model.compute_gradients(x, y, loss_fn)?;
            let updates = self.build_updates(
                &gradients,
                &mut velocity,
                &mut first_moment,
                &mut second_moment,
                step,
            );
            model.update_parameters(&updates)?;
            step += 1;
        }

        debug!(
            "gradient descent stopped after {} iterations (converged: {converged})",
            losses.len()
        );
        Ok(OptimizeOutcome {
            converged,
            iterations: losses.len(),
            losses,
        })
    }

    fn build_updates(
        &self,
        gradients: &[Matrix],
        velocity: &mut [Array2<f64>],
        first_moment: &mut [Array2<f64>],
        second_moment: &mut [Array2<f64>],
        step: usize,
    ) -> Vec<Matrix> {
        match self.method {
            Method::Sgd => gradients
                .iter()
                .map(|g| Matrix::from_array_unchecked(g.as_array() * self.learning_rate))
                .collect(),
            Method::Momentum => gradients
                .iter()
                .enumerate()
                .map(|(i, g)| {
                    velocity[i] = &velocity[i] * self.momentum_beta
                        + &(g.as_array() * self.learning_rate);
                    Matrix::from_array_unchecked(velocity[i].clone())
                })
                .collect(),
            Method::Adam => gradients
                .iter()
                .enumerate()
                .map(|(i, g)| {
                    let g = g.as_array();
                    first_moment[i] =
                        &first_moment[i] * self.adam_beta1 + &(g * (1.0 - self.adam_beta1));
                    second_moment[i] = &second_moment[i] * self.adam_beta2
                        + &(g.mapv(|v| v * v) * (1.0 - self.adam_beta2));

                    let correction1 = 1.0 - self.adam_beta1.powi(step as i32 + 1);
                    let correction2 = 1.0 - self.adam_beta2.powi(step as i32 + 1);
                    let m_hat = &first_moment[i] / correction1;
                    let v_hat = &second_moment[i] / correction2;
                    Matrix::from_array_unchecked(
                        m_hat / (v_hat.mapv(f64::sqrt) + self.adam_epsilon) * self.learning_rate,
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::loss::MeanSquaredError;
    use super::super::model::LinearRegression;
    use super::*;
    use approx::assert_abs_diff_eq;

    fn line_fixture() -> (Matrix, Matrix) {
        // y = 2x + 1
        let x = Matrix::new(vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]]).unwrap();
        let y = Matrix::new(vec![vec![3.0], vec![5.0], vec![7.0], vec![9.0]]).unwrap();
        (x, y)
    }

    #[test]
    fn test_sgd_recovers_line() {
        let (x, y) = line_fixture();
        let mut model = LinearRegression::seeded(1, 1, 21).unwrap();
        let optimizer = GradientDescent::new(0.05, 50_000, 1e-13, Method::Sgd);

        let outcome = optimizer
            .optimize(&mut model, &x, &y, &MeanSquaredError)
            .unwrap();

        assert!(outcome.converged);
        assert_eq!(outcome.iterations, outcome.losses.len());
        assert_abs_diff_eq!(model.weights().get(0, 0).unwrap(), 2.0, epsilon = 1e-2);
        assert_abs_diff_eq!(model.bias().get(0, 0).unwrap(), 1.0, epsilon = 2e-2);

        // Loss history is non-increasing at convergence.
        assert!(outcome.losses.last().unwrap() <= outcome.losses.first().unwrap());
        let tail = &outcome.losses[outcome.losses.len().saturating_sub(10)..];
        for pair in tail.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-12);
        }
    }

    #[test]
    fn test_momentum_decreases_loss() {
        let (x, y) = line_fixture();
        let mut model = LinearRegression::seeded(1, 1, 22).unwrap();
        let optimizer = GradientDescent::new(0.01, 5_000, 1e-12, Method::Momentum);

        let outcome = optimizer
            .optimize(&mut model, &x, &y, &MeanSquaredError)
            .unwrap();
        assert!(outcome.losses.last().unwrap() < outcome.losses.first().unwrap());
    }

    #[test]
    fn test_adam_decreases_loss() {
        let (x, y) = line_fixture();
        let mut model = LinearRegression::seeded(1, 1, 23).unwrap();
        let optimizer = GradientDescent::new(0.05, 5_000, 0.0, Method::Adam)
            .adam_beta1(0.9)
            .adam_beta2(0.999)
            .adam_epsilon(1e-8);

        let outcome = optimizer
            .optimize(&mut model, &x, &y, &MeanSquaredError)
            .unwrap();
        assert!(outcome.losses.last().unwrap() < outcome.losses.first().unwrap());
    }

    #[test]
    fn test_convergence_bookkeeping() {
        let (x, y) = line_fixture();
        let mut model = LinearRegression::seeded(1, 1, 24).unwrap();
        // Generous tolerance: converges almost immediately, well under the cap.
        let optimizer = GradientDescent::new(0.01, 1_000, 1.0, Method::Sgd);

        let outcome = optimizer
            .optimize(&mut model, &x, &y, &MeanSquaredError)
            .unwrap();
        assert!(outcome.converged);
        assert!(outcome.iterations < 1_000);
        assert_eq!(outcome.iterations, outcome.losses.len());
    }

    #[test]
    fn test_iteration_cap_without_convergence() {
        let (x, y) = line_fixture();
        let mut model = LinearRegression::seeded(1, 1, 25).unwrap();
        let optimizer = GradientDescent::new(0.01, 5, 0.0, Method::Sgd);

        let outcome = optimizer
            .optimize(&mut model, &x, &y, &MeanSquaredError)
            .unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 5);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("sgd").unwrap(), Method::Sgd);
        assert_eq!(Method::parse("momentum").unwrap(), Method::Momentum);
        assert_eq!(Method::parse("adam").unwrap(), Method::Adam);
        assert!(matches!(
            Method::parse("adagrad"),
            Err(Error::UnknownOptimizationMethod(_))
        ));
        assert_eq!("adam".parse::<Method>().unwrap(), Method::Adam);
    }
}
