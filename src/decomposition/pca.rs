use std::cmp::Ordering;

use log::debug;
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};
use crate::matrix::Matrix;

const POWER_MAX_ITERATIONS: usize = 1000;
const POWER_TOLERANCE: f64 = 1e-10;

/// Principal component analysis over a covariance matrix, eigen-decomposed
/// by repeated power iteration with deflation.
///
/// Later eigenpairs come out of an already-deflated, numerically degraded
/// matrix, so trailing components accumulate floating-point error. Fine for
/// small, well-conditioned inputs; a known limitation for larger ones.
#[derive(Clone, Debug)]
pub struct Pca {
    components: Option<Matrix>,
    explained_variance: Option<Vec<f64>>,
    explained_variance_ratio: Option<Vec<f64>>,
    mean: Option<Matrix>,
    n_components: Option<usize>,
    random_state: Option<u64>,
}

impl Pca {
    pub fn new() -> Self {
        Self {
            components: None,
            explained_variance: None,
            explained_variance_ratio: None,
            mean: None,
            n_components: None,
            random_state: None,
        }
    }

    /// Number of components to keep. Defaults to the feature count.
    pub fn n_components(mut self, n_components: usize) -> Self {
        self.n_components = Some(n_components);
        self
    }

    /// Seed for the power-iteration start vectors, for reproducible fits.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        let (samples, features) = x.shape();
        if samples < features || samples < 2 {
            return Err(Error::InsufficientSamples { samples, features });
        }
        let n_components = self.n_components.unwrap_or(features);
        if n_components == 0 || n_components > features {
            return Err(Error::InvalidComponentCount {
                requested: n_components,
                available: features,
            });
        }

        // Center the data and form the covariance matrix.
        let mean = x.as_array().mean_axis(Axis(0)).unwrap();
        let centered = x.as_array() - &mean.view().insert_axis(Axis(0));
        let covariance = centered.t().dot(&centered) / (samples as f64 - 1.0);

        let mut rng: Box<dyn rand::RngCore> = match self.random_state {
            Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
            None => Box::new(rand::thread_rng()),
        };

        // Full eigen-decomposition: extract the dominant pair, deflate, repeat.
        let mut deflated = covariance;
        let mut pairs: Vec<(f64, Array1<f64>)> = Vec::with_capacity(features);
        for _ in 0..features {
            let pair = Matrix::from_array_unchecked(deflated.clone())
                .power_iteration_with_rng(POWER_MAX_ITERATIONS, POWER_TOLERANCE, &mut *rng)?;
            let vector = pair.eigenvector.as_array().column(0).to_owned();
            let outer = vector
                .view()
                .insert_axis(Axis(1))
                .dot(&vector.view().insert_axis(Axis(0)));
            deflated -= &(outer * pair.eigenvalue);
            pairs.push((pair.eigenvalue, vector));
        }
        pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        // Ratios are taken against the full spectrum before truncation.
        let total: f64 = pairs.iter().map(|(value, _)| value).sum();
        let explained_variance: Vec<f64> = pairs
            .iter()
            .take(n_components)
            .map(|(value, _)| *value)
            .collect();
        let explained_variance_ratio: Vec<f64> = if total > 0.0 {
            explained_variance.iter().map(|value| value / total).collect()
        } else {
            vec![0.0; n_components]
        };

        let mut components = Array2::<f64>::zeros((n_components, features));
        for (i, (_, vector)) in pairs.iter().take(n_components).enumerate() {
            components.row_mut(i).assign(vector);
        }

        debug!("pca fit kept {n_components} of {features} components");

        self.components = Some(Matrix::from_array_unchecked(components));
        self.explained_variance = Some(explained_variance);
        self.explained_variance_ratio = Some(explained_variance_ratio);
        self.mean = Some(Matrix::from_array_unchecked(mean.insert_axis(Axis(0))));
        Ok(())
    }

    /// Centers with the stored mean and projects onto the components.
    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let components = self.components.as_ref().ok_or(Error::NotFitted)?;
        let mean = self.mean.as_ref().ok_or(Error::NotFitted)?;
        if x.cols() != mean.cols() {
            return Err(Error::FeatureMismatch {
                expected: mean.cols(),
                got: x.cols(),
            });
        }

        let centered = x.as_array() - mean.as_array();
        Ok(Matrix::from_array_unchecked(
            centered.dot(&components.as_array().t()),
        ))
    }

    pub fn fit_transform(&mut self, x: &Matrix) -> Result<Matrix> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Maps component-space scores back to the original feature space.
    pub fn inverse_transform(&self, x: &Matrix) -> Result<Matrix> {
        let components = self.components.as_ref().ok_or(Error::NotFitted)?;
        let mean = self.mean.as_ref().ok_or(Error::NotFitted)?;
        if x.cols() != components.rows() {
            return Err(Error::FeatureMismatch {
                expected: components.rows(),
                got: x.cols(),
            });
        }

        let reconstructed = x.as_array().dot(components.as_array()) + mean.as_array();
        Ok(Matrix::from_array_unchecked(reconstructed))
    }

    /// Component matrix (`n_components x features`), rows sorted by
    /// descending eigenvalue.
    pub fn components(&self) -> Option<&Matrix> {
        self.components.as_ref()
    }

    /// Column means of the training data as a `1 x features` row.
    pub fn mean(&self) -> Option<&Matrix> {
        self.mean.as_ref()
    }

    pub fn explained_variance(&self) -> Option<&[f64]> {
        self.explained_variance.as_deref()
    }

    pub fn explained_variance_ratio(&self) -> Option<&[f64]> {
        self.explained_variance_ratio.as_deref()
    }
}

impl Default for Pca {
    fn default() -> Self {
        Self::new()
    }
}
