use num_traits::{Float, Zero};
use std::iter::Sum;
use std::ops::AddAssign;

/// Running statistics that accepts sparse input one observation at
/// a time but stores sufficient statistics in dense vectors, one
/// entry per feature.
///
/// Each observation carries a scalar covariate `y`; the
/// cross-products `sum x*y` are tracked so that every feature can be
/// correlated with the covariate in a single pass.
///
#[derive(Clone)]
pub struct SparseRunningStatistics<T>
where
    T: Float,
{
    nfeatures: usize,
    nobs: usize,
    s1: Vec<T>,
    s2: Vec<T>,
    sxy: Vec<T>,
    sy: T,
    syy: T,
}

impl<T> SparseRunningStatistics<T>
where
    T: Float + AddAssign + Sum + Zero,
{
    /// Create a new SparseRunningStatistics object
    ///
    /// # Arguments
    /// * `nfeatures` - Number of features (e.g., genes)
    ///
    pub fn new(nfeatures: usize) -> Self {
        SparseRunningStatistics {
            nfeatures,
            nobs: 0,
            s1: vec![T::zero(); nfeatures],
            s2: vec![T::zero(); nfeatures],
            sxy: vec![T::zero(); nfeatures],
            sy: T::zero(),
            syy: T::zero(),
        }
    }

    /// Add one sparse observation together with its covariate value
    ///
    /// # Arguments
    /// * `indices` - Feature indices of non-zero values
    /// * `values` - Non-zero values
    /// * `y` - Covariate of this observation
    ///
    pub fn add_sparse_with_covariate(&mut self, indices: &[usize], values: &[T], y: T) {
        debug_assert_eq!(indices.len(), values.len());

        for (&g, &val) in indices.iter().zip(values.iter()) {
            if val.is_finite() {
                self.s1[g] += val;
                self.s2[g] += val * val;
                self.sxy[g] += val * y;
            }
        }
        self.sy += y;
        self.syy += y * y;
        self.nobs += 1;
    }

    /// Combine statistics accumulated over disjoint sets of observations
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.nfeatures, other.nfeatures);
        for g in 0..self.nfeatures {
            self.s1[g] += other.s1[g];
            self.s2[g] += other.s2[g];
            self.sxy[g] += other.sxy[g];
        }
        self.sy += other.sy;
        self.syy += other.syy;
        self.nobs += other.nobs;
    }

    /// Number of observations processed so far
    pub fn nobs(&self) -> usize {
        self.nobs
    }

    /// Pearson correlation of each feature with the covariate.
    ///
    /// Features (or a covariate) without variance yield `NaN`.
    pub fn correlation_with_covariate(&self) -> Vec<T> {
        let nan = T::nan();
        if self.nobs < 2 {
            return vec![nan; self.nfeatures];
        }

        let n = self.denom();
        let mu_y = self.sy / n;
        let var_y = self.syy / n - mu_y * mu_y;

        if !Self::has_variance(var_y, self.syy / n) {
            return vec![nan; self.nfeatures];
        }

        (0..self.nfeatures)
            .map(|g| {
                let mu_x = self.s1[g] / n;
                let var_x = self.s2[g] / n - mu_x * mu_x;
                if !Self::has_variance(var_x, self.s2[g] / n) {
                    return nan;
                }
                let cov = self.sxy[g] / n - mu_x * mu_y;
                let r = cov / (var_x * var_y).sqrt();
                r.max(-T::one()).min(T::one())
            })
            .collect()
    }

    /// Single-pass variance is only trusted above the rounding error
    /// of the second moment, relative to its own scale
    fn has_variance(var: T, second_moment: T) -> bool {
        let tol = T::epsilon() * T::from(16.0).unwrap_or(T::one()) * second_moment;
        var.is_finite() && var > tol
    }

    fn denom(&self) -> T {
        let n = T::from(self.nobs).unwrap_or(T::one());
        if n > T::zero() {
            n
        } else {
            T::one()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn accumulate(
        nfeatures: usize,
        rows: &[(&[usize], &[f64])],
        y: &[f64],
    ) -> SparseRunningStatistics<f64> {
        let mut stat = SparseRunningStatistics::<f64>::new(nfeatures);
        for ((idx, val), &y_i) in rows.iter().zip(y.iter()) {
            stat.add_sparse_with_covariate(idx, val, y_i);
        }
        stat
    }

    #[test]
    fn test_correlation_with_covariate() {
        // x0 = y, x1 = -y + 5, x2 constant
        let y = [1.0, 2.0, 3.0, 4.0];
        let mut stat = SparseRunningStatistics::<f64>::new(3);
        for &y_i in y.iter() {
            stat.add_sparse_with_covariate(&[0, 1, 2], &[y_i, 5.0 - y_i, 7.0], y_i);
        }
        let r = stat.correlation_with_covariate();
        assert_abs_diff_eq!(r[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r[1], -1.0, epsilon = 1e-12);
        assert!(r[2].is_nan());
    }

    #[test]
    fn test_correlation_is_scale_free() {
        let y = [1.0, 2.0, 3.0, 4.0];
        for scale in [1e-12, 1e-8, 1.0, 1e8] {
            let mut stat = SparseRunningStatistics::<f64>::new(3);
            for &y_i in y.iter() {
                stat.add_sparse_with_covariate(&[0, 1, 2], &[y_i * scale, y_i, scale], y_i);
            }
            let r = stat.correlation_with_covariate();
            assert_abs_diff_eq!(r[0], 1.0, epsilon = 1e-9);
            assert_abs_diff_eq!(r[1], 1.0, epsilon = 1e-12);
            // constant at any scale
            assert!(r[2].is_nan());
        }

        // an all-zero feature has no variance either
        let rows: [(&[usize], &[f64]); 2] = [(&[1], &[1.0]), (&[1], &[2.0])];
        let stat = accumulate(2, &rows, &[1.0, 2.0]);
        let r = stat.correlation_with_covariate();
        assert!(r[0].is_nan());
        assert_abs_diff_eq!(r[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_merge_equals_single_pass() {
        // rows of a 3 x 2 matrix: [1, 0], [2, 5], [0, 1]
        let rows: [(&[usize], &[f64]); 3] =
            [(&[0], &[1.0]), (&[0, 1], &[2.0, 5.0]), (&[1], &[1.0])];
        let y = [1.0, 2.0, 3.0];

        let whole = accumulate(2, &rows, &y);

        let mut left = accumulate(2, &rows[..1], &y[..1]);
        let right = accumulate(2, &rows[1..], &y[1..]);
        left.merge(&right);

        assert_eq!(whole.nobs(), left.nobs());
        for (a, b) in whole
            .correlation_with_covariate()
            .iter()
            .zip(left.correlation_with_covariate().iter())
        {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }
}
