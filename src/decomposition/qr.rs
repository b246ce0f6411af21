use ndarray::{Array1, Array2, Axis, s};

use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// QR factorization via Householder reflections.
///
/// For `k = min(rows, cols)` the factors are `Q` (`rows x k`, orthonormal
/// columns) and `R` (`k x cols`, upper triangular), built by zeroing each
/// subdiagonal column of `R` with a reflection and accumulating the product
/// of reflections into `Q`.
#[derive(Clone, Debug)]
pub struct Qr {
    q: Matrix,
    r: Matrix,
}

impl Qr {
    pub fn decompose(a: &Matrix) -> Result<Self> {
        let (m, n) = a.shape();
        let k = m.min(n);

        // Q starts as the m x k truncated identity, R as the top k rows of A.
        let mut q = Array2::<f64>::zeros((m, k));
        for i in 0..k {
            q[[i, i]] = 1.0;
        }
        let mut r = a.as_array().slice(s![..k, ..]).to_owned();

        for j in 0..k {
            let mut v: Array1<f64> = r.slice(s![j.., j]).to_owned();
            let norm = v.dot(&v).sqrt();
            if norm < 1e-12 {
                // Subdiagonal already zero, nothing to reflect.
                continue;
            }
            let alpha = if v[0] >= 0.0 { -norm } else { norm };
            v[0] -= alpha;
            let vtv = v.dot(&v);
            if vtv < 1e-24 {
                continue;
            }
            let beta = 2.0 / vtv;

            // R[j.., j..] -= beta * v (v^T R[j.., j..])
            let vt_r = v.dot(&r.slice(s![j.., j..]));
            let r_correction =
                v.view().insert_axis(Axis(1)).dot(&vt_r.view().insert_axis(Axis(0))) * beta;
            let mut r_block = r.slice_mut(s![j.., j..]);
            r_block -= &r_correction;

            // Q[.., j..] -= beta * (Q[.., j..] v) v^T
            let qv = q.slice(s![.., j..]).dot(&v);
            let q_correction =
                qv.view().insert_axis(Axis(1)).dot(&v.view().insert_axis(Axis(0))) * beta;
            let mut q_block = q.slice_mut(s![.., j..]);
            q_block -= &q_correction;
        }

        Ok(Self {
            q: Matrix::from_array_unchecked(q),
            r: Matrix::from_array_unchecked(r),
        })
    }

    pub fn q(&self) -> &Matrix {
        &self.q
    }

    pub fn r(&self) -> &Matrix {
        &self.r
    }

    /// Solves `A x = b` through `R x = Q^T b` with back-substitution.
    ///
    /// A near-zero diagonal entry of `R` means the system is singular or
    /// rank-deficient; detecting that case is the caller's job via
    /// [`Qr::rank`].
    pub fn solve(&self, b: &Matrix) -> Result<Matrix> {
        let (m, k) = self.q.shape();
        if b.shape() != (m, 1) {
            return Err(Error::ShapeMismatch {
                expected: (m, 1),
                got: b.shape(),
            });
        }

        let y = self.q.as_array().t().dot(b.as_array());
        let r = self.r.as_array();
        let n = r.ncols();

        let mut x = Array1::<f64>::zeros(n);
        for i in (0..k).rev() {
            let mut sum = y[[i, 0]];
            for j in (i + 1)..n {
                sum -= r[[i, j]] * x[j];
            }
            x[i] = sum / r[[i, i]];
        }

        Ok(Matrix::from_array_unchecked(x.insert_axis(Axis(1))))
    }

    /// Product of `R`'s diagonal. Meaningful only for square input; the sign
    /// carries the determinant of the accumulated reflections.
    pub fn determinant(&self) -> f64 {
        self.r.as_array().diag().iter().product()
    }

    /// Number of diagonal entries of `R` with magnitude above `threshold`.
    pub fn rank(&self, threshold: f64) -> usize {
        self.r
            .as_array()
            .diag()
            .iter()
            .filter(|d| d.abs() > threshold)
            .count()
    }

    /// Decompose-then-solve convenience for one-shot systems.
    pub fn solve_system(a: &Matrix, b: &Matrix) -> Result<Matrix> {
        Self::decompose(a)?.solve(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn orthonormality_error(q: &Matrix) -> f64 {
        let qtq = q.as_array().t().dot(q.as_array());
        let k = qtq.nrows();
        let mut worst: f64 = 0.0;
        for i in 0..k {
            for j in 0..k {
                let expected = if i == j { 1.0 } else { 0.0 };
                worst = worst.max((qtq[[i, j]] - expected).abs());
            }
        }
        worst
    }

    #[test]
    fn test_decompose_square() {
        let a = Matrix::from_array(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 10.0]])
            .unwrap();
        let qr = Qr::decompose(&a).unwrap();

        assert_eq!(qr.q().shape(), (3, 3));
        assert_eq!(qr.r().shape(), (3, 3));
        assert!(orthonormality_error(qr.q()) < 1e-10);

        let product = qr.q().multiply(qr.r()).unwrap();
        assert!(product.equals(&a, 1e-10));

        // R is upper triangular
        for i in 1..3 {
            for j in 0..i {
                assert_abs_diff_eq!(qr.r().get(i, j).unwrap(), 0.0, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_decompose_wide() {
        let a = Matrix::from_array(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let qr = Qr::decompose(&a).unwrap();

        assert_eq!(qr.q().shape(), (2, 2));
        assert_eq!(qr.r().shape(), (2, 3));
        assert!(orthonormality_error(qr.q()) < 1e-10);
        assert!(qr.q().multiply(qr.r()).unwrap().equals(&a, 1e-10));
    }

    #[test]
    fn test_decompose_tall_shapes() {
        let a = Matrix::from_array(array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap();
        let qr = Qr::decompose(&a).unwrap();
        assert_eq!(qr.q().shape(), (3, 2));
        assert_eq!(qr.r().shape(), (2, 2));
    }

    #[test]
    fn test_solve() {
        let a = Matrix::new(vec![vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
        let b = Matrix::new(vec![vec![3.0], vec![3.0]]).unwrap();

        let x = Qr::decompose(&a).unwrap().solve(&b).unwrap();
        assert_abs_diff_eq!(x.get(0, 0).unwrap(), 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(x.get(1, 0).unwrap(), 1.0, epsilon = 1e-10);

        let residual = a.multiply(&x).unwrap();
        assert!(residual.equals(&b, 1e-10));
    }

    #[test]
    fn test_solve_rejects_wrong_rhs_shape() {
        let a = Matrix::identity(2).unwrap();
        let qr = Qr::decompose(&a).unwrap();
        let bad = Matrix::zeros(3, 1).unwrap();
        assert!(matches!(qr.solve(&bad), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_solve_system_convenience() {
        let a = Matrix::new(vec![vec![3.0, 1.0], vec![1.0, 2.0]]).unwrap();
        let b = Matrix::new(vec![vec![9.0], vec![8.0]]).unwrap();
        let x = Qr::solve_system(&a, &b).unwrap();
        assert_abs_diff_eq!(x.get(0, 0).unwrap(), 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(x.get(1, 0).unwrap(), 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_determinant() {
        let a = Matrix::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let qr = Qr::decompose(&a).unwrap();
        assert_abs_diff_eq!(qr.determinant(), -2.0, epsilon = 1e-10);

        // Sign depends on the number of reflections, magnitude does not.
        let b = Matrix::from_array(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 10.0]])
            .unwrap();
        let det = Qr::decompose(&b).unwrap().determinant();
        assert_abs_diff_eq!(det.abs(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rank() {
        let full = Matrix::new(vec![vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
        assert_eq!(Qr::decompose(&full).unwrap().rank(1e-12), 2);

        let deficient = Matrix::new(vec![vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert_eq!(Qr::decompose(&deficient).unwrap().rank(1e-12), 1);
    }
}
