pub mod capability;
pub mod connectivity_kernel;
pub mod cytotrace_kernel;
pub mod projection;
pub mod pseudotime_kernel;
pub mod threshold_scheme;

use crate::error::{KernelError, Result};
use crate::keys::{params_key, transition_key};
use crate::logging::Logger;
use capability::{Connectivity, Direction};

use anno_beans::AnnoStore;
use matrix_util::sparse_graph::normalize_rows;
use matrix_util::traits::MatTriplets;
use nalgebra::DMatrix;
use nalgebra_sparse::convert::serial::convert_csr_dense;
use nalgebra_sparse::CsrMatrix;
use serde_json::{Map, Value};

/// A kNN-based kernel producing a cell x cell transition matrix
pub trait Kernel {
    fn connectivity(&self) -> &Connectivity;

    fn direction(&self) -> Direction;

    /// `None` until computed
    fn transition_matrix(&self) -> Option<&CsrMatrix<f64>>;

    /// Parameters of the last computation
    fn params(&self) -> &Map<String, Value>;

    fn n_obs(&self) -> usize {
        self.connectivity().n_obs()
    }

    fn backward(&self) -> Option<bool> {
        self.direction().backward()
    }

    /// `T_bwd` for backward kernels, `T_fwd` otherwise
    fn default_key(&self) -> &'static str {
        transition_key(self.backward().unwrap_or(false))
    }

    fn require_transition_matrix(&self) -> Result<&CsrMatrix<f64>> {
        self.transition_matrix().ok_or_else(|| {
            KernelError::invalid_value("transition matrix has not been computed yet")
        })
    }

    /// Condition number (2-norm) of the transition matrix. This takes
    /// a dense singular value decomposition.
    fn compute_cond_num(&self) -> Result<f64> {
        let dense: DMatrix<f64> = convert_csr_dense(self.require_transition_matrix()?);
        let sv = dense.singular_values();
        let max = sv.iter().cloned().fold(0.0_f64, f64::max);
        let min = sv.iter().cloned().fold(f64::INFINITY, f64::min);
        Ok(if min > 0.0 { max / min } else { f64::INFINITY })
    }

    /// Save the transition matrix in `obsp[key]` and its parameters in
    /// `uns[key_params]`, where `key` defaults to [`Kernel::default_key`]
    fn write_to_store(&self, store: &mut AnnoStore, key_added: Option<&str>) -> Result<()> {
        let tmat = self.require_transition_matrix()?;
        let key = key_added.unwrap_or(self.default_key());

        store.add_obsp(key, tmat.clone())?;

        let mut params = self.params().clone();
        params.insert(
            "backward".into(),
            self.backward().map(Value::Bool).unwrap_or(Value::Null),
        );
        params.insert("conn_key".into(), self.connectivity().key().into());
        store
            .uns_mut()
            .insert(params_key(key), Value::Object(params));
        Ok(())
    }
}

/// Row-normalize `mat`; rows without mass get a unit self-loop so
/// that the result is row-stochastic
pub fn row_stochastic(mat: &CsrMatrix<f64>, logger: &Logger) -> Result<CsrMatrix<f64>> {
    let (normalized, empty) = normalize_rows(mat)?;
    if empty.is_empty() {
        return Ok(normalized);
    }

    logger.warning(&format!(
        "{} cells have no outgoing transitions; adding self-loops",
        empty.len()
    ));

    let (nrow, ncol, mut triplets) = normalized.to_nonzero_triplets()?;
    triplets.extend(empty.into_iter().map(|i| (i, i, 1.0)));
    Ok(CsrMatrix::<f64>::from_nonzero_triplets(nrow, ncol, triplets)?)
}

/// Replace the values of `conn` with `weights` computed row by row
pub(crate) fn reweight_rows<F>(conn: &CsrMatrix<f64>, mut row_weights: F) -> Result<CsrMatrix<f64>>
where
    F: FnMut(usize, &[usize], &[f64]) -> Vec<f64>,
{
    let mut values = Vec::with_capacity(conn.nnz());
    for (i, row) in conn.row_iter().enumerate() {
        let w = row_weights(i, row.col_indices(), row.values());
        debug_assert_eq!(w.len(), row.nnz());
        values.extend(w);
    }
    CsrMatrix::try_from_csr_data(
        conn.nrows(),
        conn.ncols(),
        conn.row_offsets().to_vec(),
        conn.col_indices().to_vec(),
        values,
    )
    .map_err(|e| KernelError::invalid_value(format!("invalid CSR data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_row_stochastic_adds_self_loops() {
        let mat =
            CsrMatrix::<f64>::from_nonzero_triplets(3, 3, vec![(0, 1, 2.0), (0, 2, 2.0), (2, 0, 5.0)])
                .unwrap();
        let out = row_stochastic(&mat, &Logger::default()).unwrap();
        let sums = matrix_util::sparse_graph::row_sums(&out);
        for s in sums {
            assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
        }
        assert_eq!(out.get_entry(1, 1).map(|e| e.into_value()), Some(1.0));
    }
}
