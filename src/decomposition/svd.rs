use log::debug;
use ndarray::{Array1, Array2, Axis, s};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};
use crate::matrix::Matrix;

const DEFAULT_MAX_ITERATIONS: usize = 100;
const DEFAULT_TOLERANCE: f64 = 1e-10;
const RANK_FLOOR: f64 = 1e-12;

/// Singular value decomposition `A = U * Sigma * V^T` by power iteration
/// with deflation.
///
/// Each sweep runs power iteration on `A^T A` of the deflated working matrix
/// to find the currently-largest singular triplet, then subtracts its
/// outer-product contribution. Singular values therefore come out in
/// descending order.
#[derive(Clone, Debug)]
pub struct Svd {
    u: Matrix,
    sigma: Matrix,
    vt: Matrix,
    singular_values: Vec<f64>,
}

impl Svd {
    pub fn decompose(a: &Matrix) -> Result<Self> {
        Self::decompose_with(a, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE)
    }

    pub fn decompose_with(a: &Matrix, max_iterations: usize, tolerance: f64) -> Result<Self> {
        Self::decompose_impl(a, max_iterations, tolerance, &mut rand::thread_rng())
    }

    /// Deterministic variant for callers that need reproducible factors.
    pub fn decompose_seeded(
        a: &Matrix,
        max_iterations: usize,
        tolerance: f64,
        seed: u64,
    ) -> Result<Self> {
        Self::decompose_impl(
            a,
            max_iterations,
            tolerance,
            &mut ChaCha8Rng::seed_from_u64(seed),
        )
    }

    fn decompose_impl<R: Rng + ?Sized>(
        a: &Matrix,
        max_iterations: usize,
        tolerance: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let (m, n) = a.shape();
        let k = m.min(n);

        let mut work = a.as_array().clone();
        let mut u = Array2::<f64>::zeros((m, k));
        let mut vt = Array2::<f64>::zeros((k, n));
        let mut singular_values = vec![0.0; k];

        for i in 0..k {
            let gram = Matrix::from_array_unchecked(work.t().dot(&work));
            let pair = gram.power_iteration_with_rng(max_iterations, tolerance, rng)?;
            let v: Array1<f64> = pair.eigenvector.as_array().column(0).to_owned();
            let sigma = pair.eigenvalue.max(0.0).sqrt();

            singular_values[i] = sigma;
            vt.row_mut(i).assign(&v);

            if sigma > tolerance {
                let u_col = work.dot(&v) / sigma;
                let outer = u_col
                    .view()
                    .insert_axis(Axis(1))
                    .dot(&v.view().insert_axis(Axis(0)));
                work -= &(outer * sigma);
                u.column_mut(i).assign(&u_col);
            } else {
                // Spent spectrum: fill the column with a standard-basis
                // placeholder. It is NOT orthogonalized against the columns
                // found so far, matching the deflation scheme's behavior for
                // rank-deficient input.
                u[[i, i]] = 1.0;
                debug!("singular value {i} at or below tolerance, placeholder U column");
            }
        }

        let sigma = Array2::from_diag(&Array1::from(singular_values.clone()));
        Ok(Self {
            u: Matrix::from_array_unchecked(u),
            sigma: Matrix::from_array_unchecked(sigma),
            vt: Matrix::from_array_unchecked(vt),
            singular_values,
        })
    }

    pub fn u(&self) -> &Matrix {
        &self.u
    }

    pub fn sigma(&self) -> &Matrix {
        &self.sigma
    }

    pub fn vt(&self) -> &Matrix {
        &self.vt
    }

    pub fn v(&self) -> Matrix {
        self.vt.transpose()
    }

    /// Diagonal of `Sigma`, in descending order.
    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    /// Ratio of the largest to the smallest non-negligible singular value,
    /// or infinity when every singular value sits below the floor.
    pub fn condition_number(&self) -> f64 {
        let significant: Vec<f64> = self
            .singular_values
            .iter()
            .copied()
            .filter(|&s| s > RANK_FLOOR)
            .collect();
        match (significant.first(), significant.last()) {
            (Some(&largest), Some(&smallest)) => largest / smallest,
            _ => f64::INFINITY,
        }
    }

    /// Count of singular values above `threshold`.
    pub fn numerical_rank(&self, threshold: f64) -> usize {
        self.singular_values
            .iter()
            .filter(|&&s| s > threshold)
            .count()
    }

    /// Low-rank reconstruction `U_k * Sigma_k * VT_k` from the first
    /// `components` triplets (default: all of them).
    pub fn reconstruct(&self, components: Option<usize>) -> Result<Matrix> {
        let available = self.singular_values.len();
        let keep = components.unwrap_or(available);
        if keep == 0 || keep > available {
            return Err(Error::InvalidComponentCount {
                requested: keep,
                available,
            });
        }

        let u = self.u.as_array().slice(s![.., ..keep]);
        let sigma = Array2::from_diag(&Array1::from(self.singular_values[..keep].to_vec()));
        let vt = self.vt.as_array().slice(s![..keep, ..]);
        Ok(Matrix::from_array_unchecked(u.dot(&sigma).dot(&vt)))
    }
}
