//! Row-wise summaries of dense and sparse matrices.
//!
//! Degenerate inputs have defined outputs: empty rows give `NaN`,
//! geometric and harmonic means of rows containing a zero are zero,
//! and negative entries make those two means `NaN`.

use nalgebra_sparse::CsrMatrix;
use ndarray::ArrayView2;
use statrs::statistics::Statistics;

/// Arithmetic mean
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Median; the average of the two middle values for even lengths
pub fn median(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Geometric mean `exp(mean(log x))`
pub fn gmean(x: &[f64]) -> f64 {
    if x.iter().any(|&v| v < 0.0) {
        return f64::NAN;
    }
    x.iter().geometric_mean()
}

/// Harmonic mean `n / sum(1/x)`
pub fn hmean(x: &[f64]) -> f64 {
    if x.iter().any(|&v| v < 0.0) {
        return f64::NAN;
    }
    x.iter().harmonic_mean()
}

/// Apply `summary` to every row of a dense matrix
pub fn dense_rows_apply<F>(mat: &ArrayView2<f64>, summary: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    mat.rows()
        .into_iter()
        .map(|row| {
            let row = row.to_vec();
            summary(&row)
        })
        .collect()
}

/// Row means of a sparse matrix (implicit zeros count)
pub fn csr_row_mean(csr: &CsrMatrix<f64>) -> Vec<f64> {
    let ncols = csr.ncols();
    csr.row_iter()
        .map(|row| {
            if ncols == 0 {
                f64::NAN
            } else {
                row.values().iter().sum::<f64>() / ncols as f64
            }
        })
        .collect()
}

/// Row medians of a sparse matrix (implicit zeros count)
pub fn csr_row_median(csr: &CsrMatrix<f64>) -> Vec<f64> {
    let ncols = csr.ncols();
    csr.row_iter()
        .map(|row| {
            let mut full = vec![0.0; ncols - row.nnz()];
            full.extend_from_slice(row.values());
            median(&full)
        })
        .collect()
}

/// Keep the given columns of a sparse matrix, in the given order
pub fn csr_select_columns(csr: &CsrMatrix<f64>, columns: &[usize]) -> anyhow::Result<CsrMatrix<f64>> {
    let mut new_index = vec![None; csr.ncols()];
    for (k, &j) in columns.iter().enumerate() {
        if j >= csr.ncols() {
            anyhow::bail!("column {} out of bounds ({} columns)", j, csr.ncols());
        }
        new_index[j] = Some(k);
    }

    let mut offsets = Vec::with_capacity(csr.nrows() + 1);
    let mut indices = vec![];
    let mut values = vec![];
    offsets.push(0);

    for row in csr.row_iter() {
        let mut entries: Vec<(usize, f64)> = row
            .col_indices()
            .iter()
            .zip(row.values())
            .filter_map(|(&j, &x)| new_index[j].map(|k| (k, x)))
            .collect();
        entries.sort_by_key(|&(k, _)| k);
        for (k, x) in entries {
            indices.push(k);
            values.push(x);
        }
        offsets.push(indices.len());
    }

    CsrMatrix::try_from_csr_data(csr.nrows(), columns.len(), offsets, indices, values)
        .map_err(|e| anyhow::anyhow!("invalid CSR data: {}", e))
}

/// Densify a sparse matrix
pub fn csr_to_dense(csr: &CsrMatrix<f64>) -> ndarray::Array2<f64> {
    let mut dense = ndarray::Array2::<f64>::zeros((csr.nrows(), csr.ncols()));
    for (i, j, &x) in csr.triplet_iter() {
        dense[(i, j)] = x;
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MatTriplets;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_scalar_summaries() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_abs_diff_eq!(gmean(&[1.0, 4.0]), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hmean(&[1.0, 4.0]), 1.6, epsilon = 1e-12);
        assert_eq!(gmean(&[0.0, 4.0]), 0.0);
        assert_eq!(hmean(&[0.0, 4.0]), 0.0);
        assert!(gmean(&[-1.0, 4.0]).is_nan());
        assert!(hmean(&[-1.0, 4.0]).is_nan());
        assert!(gmean(&[]).is_nan());
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_sparse_rows_match_dense_rows() {
        let dense = array![[0.0, 1.0, 3.0, 0.0], [2.0, 0.0, 0.0, 0.0], [1.0, 2.0, 3.0, 4.0]];
        let (nrow, ncol, triplets) = dense.to_nonzero_triplets().unwrap();
        let csr = CsrMatrix::<f64>::from_nonzero_triplets(nrow, ncol, triplets).unwrap();

        let dense_mean = dense_rows_apply(&dense.view(), mean);
        let dense_median = dense_rows_apply(&dense.view(), median);

        for (a, b) in dense_mean.iter().zip(csr_row_mean(&csr).iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        for (a, b) in dense_median.iter().zip(csr_row_median(&csr).iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_select_columns_reorders() {
        let dense = array![[0.0, 1.0, 3.0], [2.0, 0.0, 5.0]];
        let (nrow, ncol, triplets) = dense.to_nonzero_triplets().unwrap();
        let csr = CsrMatrix::<f64>::from_nonzero_triplets(nrow, ncol, triplets).unwrap();

        let sub = csr_select_columns(&csr, &[2, 0]).unwrap();
        assert_eq!(csr_to_dense(&sub), array![[3.0, 0.0], [5.0, 2.0]]);
        assert!(csr_select_columns(&csr, &[3]).is_err());
    }
}
