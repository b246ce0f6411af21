//! Error types shared across the crate.

use thiserror::Error;

/// Result type alias using numkit's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by matrix operations, decompositions and the optimizer.
///
/// Every variant is raised synchronously at the point of violation; nothing
/// is retried or coerced internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Construction input was empty, ragged or contained non-finite numbers
    #[error("invalid shape: {reason}")]
    InvalidShape {
        /// What made the input unusable
        reason: String,
    },

    /// Element access outside `[0, rows) x [0, cols)`
    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    IndexOutOfBounds {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
        /// Matrix row count
        rows: usize,
        /// Matrix column count
        cols: usize,
    },

    /// A non-finite element value was supplied to `set`
    #[error("invalid value: {0} is not a finite number")]
    InvalidValue(f64),

    /// A non-finite scalar was supplied to a scalar operation
    #[error("invalid scalar: {0} is not a finite number")]
    InvalidScalar(f64),

    /// Operand shapes are incompatible for the requested operation
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Shape the operation required
        expected: (usize, usize),
        /// Shape that was supplied
        got: (usize, usize),
    },

    /// Scalar division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// A square-only operation was called on a rectangular matrix
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// `transform` (or similar) was called before `fit`
    #[error("model has not been fitted; call fit() first")]
    NotFitted,

    /// Input column count differs from the fitted feature count
    #[error("feature count mismatch: expected {expected}, got {got}")]
    FeatureMismatch {
        /// Feature count seen during fitting
        expected: usize,
        /// Feature count of the offending input
        got: usize,
    },

    /// Fewer samples than features (or fewer than two samples overall)
    #[error("insufficient samples: {samples} samples for {features} features")]
    InsufficientSamples {
        /// Sample (row) count
        samples: usize,
        /// Feature (column) count
        features: usize,
    },

    /// A component count outside `[1, available]` was requested
    #[error("requested {requested} components but only {available} are available")]
    InvalidComponentCount {
        /// Requested component count
        requested: usize,
        /// Largest count the data supports
        available: usize,
    },

    /// An optimization method name that is not `sgd`, `momentum` or `adam`
    #[error("unknown optimization method '{0}'")]
    UnknownOptimizationMethod(String),
}
