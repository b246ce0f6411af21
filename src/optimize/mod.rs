//! Gradient-based optimization: losses, the trainable-model contract and the
//! gradient-descent driver.
//!
//! The optimizer works against two small traits so that new losses and new
//! model types plug in without touching the driver:
//! - `LossFunction`: a value/gradient pair over same-shaped matrices
//! - `OptimizableModel`: predict / parameters / gradients / in-place update
//!
//! # Examples
//!
//! ```rust
//! use numkit::{GradientDescent, LinearRegression, Matrix, MeanSquaredError, Method};
//!
//! // y = 2x + 1
//! let x = Matrix::new(vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]]).unwrap();
//! let y = Matrix::new(vec![vec![3.0], vec![5.0], vec![7.0], vec![9.0]]).unwrap();
//!
//! let mut model = LinearRegression::seeded(1, 1, 7).unwrap();
//! let optimizer = GradientDescent::new(0.05, 20_000, 1e-12, Method::Sgd);
//! let outcome = optimizer.optimize(&mut model, &x, &y, &MeanSquaredError).unwrap();
//!
//! assert!(outcome.converged);
//! assert!(outcome.losses.last().unwrap() < outcome.losses.first().unwrap());
//! ```
//!
//! Method names arriving as strings (from a config file or request payload)
//! go through [`Method::parse`]:
//!
//! ```rust
//! use numkit::Method;
//!
//! assert_eq!(Method::parse("adam").unwrap(), Method::Adam);
//! assert!(Method::parse("newton").is_err());
//! ```

mod gradient_descent;
mod loss;
mod model;

pub use gradient_descent::{GradientDescent, Method, OptimizeOutcome};
pub use loss::{BinaryCrossEntropy, LossFunction, MeanSquaredError};
pub use model::{LinearRegression, OptimizableModel};
