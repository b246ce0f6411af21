use ndarray::{Array2, Axis};
use rand::Rng;

use crate::error::{Error, Result};

/// Dense, validated 2D matrix of `f64` values.
///
/// Invariants enforced at construction and on `set`: at least one row and
/// one column, rectangular data, every entry finite. Operations are
/// value-like: everything except `set` returns a new matrix.
#[derive(Clone, Debug)]
pub struct Matrix {
    data: Array2<f64>,
}

/// Dominant eigenpair produced by [`Matrix::power_iteration`].
#[derive(Clone, Debug)]
pub struct Eigenpair {
    pub eigenvalue: f64,
    /// Unit-norm eigenvector as an `n x 1` column.
    pub eigenvector: Matrix,
    /// Iterations actually used.
    pub iterations: usize,
    pub converged: bool,
}

impl Matrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(Error::InvalidShape {
                reason: "matrix needs at least one row and one column".to_string(),
            });
        }
        let cols = rows[0].len();
        if rows.iter().any(|row| row.len() != cols) {
            return Err(Error::InvalidShape {
                reason: "rows have different lengths".to_string(),
            });
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        if flat.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidShape {
                reason: "entries must be finite numbers".to_string(),
            });
        }
        let n_rows = flat.len() / cols;
        let data = Array2::from_shape_vec((n_rows, cols), flat).unwrap();
        Ok(Self { data })
    }

    pub fn from_array(data: Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(Error::InvalidShape {
                reason: "matrix needs at least one row and one column".to_string(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidShape {
                reason: "entries must be finite numbers".to_string(),
            });
        }
        Ok(Self { data })
    }

    /// Wraps an array produced by internal arithmetic without re-validating.
    pub(crate) fn from_array_unchecked(data: Array2<f64>) -> Self {
        Self { data }
    }

    pub fn identity(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidShape {
                reason: "identity size must be at least 1".to_string(),
            });
        }
        Ok(Self { data: Array2::eye(n) })
    }

    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidShape {
                reason: "matrix needs at least one row and one column".to_string(),
            });
        }
        Ok(Self { data: Array2::zeros((rows, cols)) })
    }

    pub fn ones(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidShape {
                reason: "matrix needs at least one row and one column".to_string(),
            });
        }
        Ok(Self { data: Array2::ones((rows, cols)) })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.data.nrows(), self.data.ncols())
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.check_index(row, col)?;
        Ok(self.data[[row, col]])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.check_index(row, col)?;
        if !value.is_finite() {
            return Err(Error::InvalidValue(value));
        }
        self.data[[row, col]] = value;
        Ok(())
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape(),
                got: other.shape(),
            });
        }
        Ok(Matrix::from_array_unchecked(&self.data + &other.data))
    }

    pub fn subtract(&self, other: &Matrix) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape(),
                got: other.shape(),
            });
        }
        Ok(Matrix::from_array_unchecked(&self.data - &other.data))
    }

    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols() != other.rows() {
            return Err(Error::ShapeMismatch {
                expected: (self.cols(), other.cols()),
                got: other.shape(),
            });
        }
        Ok(Matrix::from_array_unchecked(self.data.dot(&other.data)))
    }

    pub fn multiply_scalar(&self, scalar: f64) -> Result<Matrix> {
        if !scalar.is_finite() {
            return Err(Error::InvalidScalar(scalar));
        }
        Ok(Matrix::from_array_unchecked(&self.data * scalar))
    }

    pub fn divide_scalar(&self, scalar: f64) -> Result<Matrix> {
        if !scalar.is_finite() {
            return Err(Error::InvalidScalar(scalar));
        }
        if scalar == 0.0 {
            return Err(Error::DivisionByZero);
        }
        Ok(Matrix::from_array_unchecked(&self.data / scalar))
    }

    pub fn transpose(&self) -> Matrix {
        Matrix::from_array_unchecked(self.data.t().to_owned())
    }

    pub fn trace(&self) -> Result<f64> {
        self.check_square()?;
        Ok(self.data.diag().sum())
    }

    /// Determinant by cofactor expansion along the first row.
    ///
    /// Exact for exact arithmetic but factorial in cost, so only usable for
    /// small matrices (dimension ~10 at most).
    pub fn determinant(&self) -> Result<f64> {
        self.check_square()?;
        Ok(det_cofactor(&self.data))
    }

    pub fn equals(&self, other: &Matrix, epsilon: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Estimates the dominant eigenpair by power iteration.
    ///
    /// Starts from a random unit vector, repeatedly multiplies by the matrix
    /// and renormalizes, and estimates the eigenvalue as the inner product of
    /// the unnormalized image with the previous vector. Stops once the
    /// eigenvalue estimate changes by less than `tolerance` between
    /// iterations, or after `max_iterations` with `converged = false`.
    ///
    /// The random seed means repeated calls may need a different number of
    /// iterations; the eigenvalue itself is deterministic for matrices with a
    /// unique dominant eigenvalue magnitude.
    pub fn power_iteration(&self, max_iterations: usize, tolerance: f64) -> Result<Eigenpair> {
        self.power_iteration_with_rng(max_iterations, tolerance, &mut rand::thread_rng())
    }

    /// Same as [`Matrix::power_iteration`] but with a caller-supplied RNG,
    /// so tests can pin the seed vector.
    pub fn power_iteration_with_rng<R: Rng + ?Sized>(
        &self,
        max_iterations: usize,
        tolerance: f64,
        rng: &mut R,
    ) -> Result<Eigenpair> {
        self.check_square()?;
        let n = self.rows();

        let mut v: ndarray::Array1<f64> = ndarray::Array1::from_shape_fn(n, |_| rng.gen_range(-1.0..1.0));
        let mut norm = v.dot(&v).sqrt();
        if norm < 1e-12 {
            v.fill(1.0);
            norm = (n as f64).sqrt();
        }
        v /= norm;

        let mut eigenvalue = 0.0;
        let mut previous = f64::INFINITY;
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..max_iterations {
            iterations = iter + 1;
            let image = self.data.dot(&v);
            eigenvalue = image.dot(&v);
            let image_norm = image.dot(&image).sqrt();
            if image_norm < 1e-12 {
                // Matrix annihilates the current direction; nothing left to iterate on.
                converged = true;
                break;
            }
            v = image / image_norm;
            if (eigenvalue - previous).abs() < tolerance {
                converged = true;
                break;
            }
            previous = eigenvalue;
        }

        Ok(Eigenpair {
            eigenvalue,
            eigenvector: Matrix::from_array_unchecked(v.insert_axis(Axis(1))),
            iterations,
            converged,
        })
    }

    fn check_square(&self) -> Result<()> {
        if self.rows() != self.cols() {
            return Err(Error::NotSquare {
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(())
    }
}

fn det_cofactor(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    match n {
        1 => a[[0, 0]],
        2 => a[[0, 0]] * a[[1, 1]] - a[[0, 1]] * a[[1, 0]],
        _ => {
            let mut det = 0.0;
            for j in 0..n {
                let minor = Array2::from_shape_fn((n - 1, n - 1), |(r, c)| {
                    a[[r + 1, if c < j { c } else { c + 1 }]]
                });
                let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
                det += sign * a[[0, j]] * det_cofactor(&minor);
            }
            det
        }
    }
}
