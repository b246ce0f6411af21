//! Dense numerical linear algebra with a small gradient-based optimization
//! framework.
//!
//! The crate is built around a validated [`Matrix`] type (finite entries,
//! fixed rectangular shape) and layers the rest on top of it:
//! decompositions ([`Pca`], [`Svd`], [`Qr`]) and a pluggable
//! [`GradientDescent`] optimizer driving any [`OptimizableModel`] /
//! [`LossFunction`] pair.
//!
//! Everything is synchronous and caller-private: no globals, no background
//! work, no shared state between instances. Long-running iterative
//! operations are bounded by their configurable iteration caps.
//!
//! # Examples
//!
//! ```rust
//! use numkit::Matrix;
//!
//! let a = Matrix::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
//! assert_eq!(a.trace().unwrap(), 5.0);
//! assert_eq!(a.determinant().unwrap(), -2.0);
//!
//! let pair = a.multiply(&a.transpose()).unwrap().power_iteration(1000, 1e-10).unwrap();
//! assert!(pair.converged);
//! ```

pub mod decomposition;
pub mod error;
pub mod matrix;
pub mod optimize;

pub use decomposition::{Pca, Qr, Svd};
pub use error::{Error, Result};
pub use matrix::{Eigenpair, Matrix};
pub use optimize::{
    BinaryCrossEntropy, GradientDescent, LinearRegression, LossFunction, MeanSquaredError, Method,
    OptimizableModel, OptimizeOutcome,
};
