//! Matrix decompositions: PCA, SVD and QR.
//!
//! This module provides the three decomposition engines:
//! - `Pca`: Principal Component Analysis via power iteration with deflation
//! - `Svd`: Singular Value Decomposition via the same iterative strategy
//! - `Qr`: QR factorization via Householder reflections, with a linear solver
//!
//! # Examples
//!
//! ## Principal Component Analysis (PCA)
//! ```rust
//! use numkit::{Matrix, Pca};
//!
//! let x = Matrix::new(vec![
//!     vec![1.0, 2.0],
//!     vec![2.0, 4.0],
//!     vec![3.0, 6.0],
//!     vec![4.0, 8.0],
//!     vec![5.0, 10.0],
//! ]).unwrap();
//!
//! let mut pca = Pca::new().n_components(1).random_state(42);
//! let scores = pca.fit_transform(&x).unwrap();
//! assert_eq!(scores.shape(), (5, 1));
//!
//! // Perfectly collinear data: one component explains everything.
//! let ratio = pca.explained_variance_ratio().unwrap();
//! assert!((ratio[0] - 1.0).abs() < 1e-6);
//! ```
//!
//! ## Singular Value Decomposition
//! ```rust
//! use numkit::{Matrix, Svd};
//!
//! let a = Matrix::new(vec![vec![3.0, 0.0], vec![0.0, 1.0]]).unwrap();
//! let svd = Svd::decompose_seeded(&a, 200, 1e-12, 0).unwrap();
//!
//! assert!(svd.reconstruct(None).unwrap().equals(&a, 1e-6));
//! assert!((svd.condition_number() - 3.0).abs() < 1e-6);
//! ```
//!
//! ## QR factorization and linear solve
//! ```rust
//! use numkit::{Matrix, Qr};
//!
//! let a = Matrix::new(vec![vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
//! let b = Matrix::new(vec![vec![3.0], vec![3.0]]).unwrap();
//!
//! let x = Qr::solve_system(&a, &b).unwrap();
//! assert!((x.get(0, 0).unwrap() - 1.0).abs() < 1e-8);
//! assert!((x.get(1, 0).unwrap() - 1.0).abs() < 1e-8);
//! ```

mod pca;
mod qr;
mod svd;

pub use pca::Pca;
pub use qr::Qr;
pub use svd::Svd;
