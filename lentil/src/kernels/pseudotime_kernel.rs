use super::capability::{Connectivity, Direction, Invertible};
use super::threshold_scheme::ThresholdScheme;
use super::{reweight_rows, row_stochastic, Kernel};
use crate::error::{KernelError, Result};
use crate::logging::Logger;

use anno_beans::AnnoStore;
use nalgebra_sparse::CsrMatrix;
use serde_json::{Map, Value};
use std::time::Instant;

/// Directs the kNN graph along a pseudotime stored in `obs`.
///
/// Edges pointing into the past of a cell are removed or
/// down-weighted by a [`ThresholdScheme`]; a backward kernel runs on
/// the reversed pseudotime `max(t) - t`.
#[derive(Clone, Debug)]
pub struct PseudotimeKernel {
    conn: Connectivity,
    direction: Direction,
    time_key: Box<str>,
    // normalized to [0, 1], before reversal
    time: Vec<f64>,
    pseudotime: Vec<f64>,
    transition: Option<CsrMatrix<f64>>,
    params: Map<String, Value>,
    logger: Logger,
}

fn min_max(x: &[f64]) -> (f64, f64) {
    x.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Min-max normalize to [0, 1]; all-equal values map to zeros
pub fn min_max_normalize(x: &[f64]) -> Vec<f64> {
    let (lo, hi) = min_max(x);
    let range = hi - lo;
    if range > 0.0 && range.is_finite() {
        x.iter().map(|&v| (v - lo) / range).collect()
    } else {
        vec![0.0; x.len()]
    }
}

fn oriented(time: &[f64], backward: bool) -> Vec<f64> {
    if backward {
        let (_, hi) = min_max(time);
        time.iter().map(|&t| hi - t).collect()
    } else {
        time.to_vec()
    }
}

impl PseudotimeKernel {
    /// Read connectivities and `obs[time_key]` from the store
    pub fn new(
        store: &AnnoStore,
        time_key: &str,
        backward: bool,
        conn_key: Option<&str>,
        check_connectivity: bool,
        logger: &Logger,
    ) -> Result<Self> {
        let conn = Connectivity::read(store, conn_key, check_connectivity, logger)?;
        let time = store
            .obs()
            .get_f64("obs", time_key)
            .map_err(|e| match e {
                anno_beans::StoreError::MissingKey { .. } => KernelError::missing_key("obs", time_key),
                other => other.into(),
            })?;
        Self::from_parts(conn, time_key, time, backward, logger)
    }

    pub fn from_parts(
        conn: Connectivity,
        time_key: &str,
        time: Vec<f64>,
        backward: bool,
        logger: &Logger,
    ) -> Result<Self> {
        if time.len() != conn.n_obs() {
            return Err(KernelError::ShapeMismatch {
                what: format!("obs[{}]", time_key).into_boxed_str(),
                expected: (conn.n_obs(), 1),
                found: (time.len(), 1),
            });
        }

        let n_bad = time.iter().filter(|t| !t.is_finite()).count();
        if n_bad > 0 {
            return Err(KernelError::invalid_value(format!(
                "detected `{}` non-finite values in `obs[{}]`",
                n_bad, time_key
            )));
        }

        let (lo, hi) = min_max(&time);
        let time = if lo < 0.0 || hi > 1.0 {
            logger.warning(&format!(
                "Pseudotime `obs[{}]` is not in [0, 1] (min = {}, max = {}); normalizing",
                time_key, lo, hi
            ));
            min_max_normalize(&time)
        } else {
            time
        };

        let pseudotime = oriented(&time, backward);

        Ok(PseudotimeKernel {
            conn,
            direction: Direction::directed(backward),
            time_key: time_key.into(),
            time,
            pseudotime,
            transition: None,
            params: Map::new(),
            logger: *logger,
        })
    }

    pub fn time_key(&self) -> &str {
        &self.time_key
    }

    /// Pseudotime in the direction of the kernel
    pub fn pseudotime(&self) -> &[f64] {
        &self.pseudotime
    }

    /// Bias the kNN graph towards increasing pseudotime.
    ///
    /// * `scheme` - treatment of edges into the past
    /// * `density_normalize` - rescale by the kNN degree first
    ///
    pub fn compute_transition_matrix(
        &mut self,
        scheme: ThresholdScheme,
        density_normalize: bool,
    ) -> Result<&CsrMatrix<f64>> {
        scheme.validate()?;
        let start = Instant::now();
        self.logger.info(&format!(
            "Computing transition matrix based on pseudotime `{}`",
            self.time_key
        ));

        let t = &self.pseudotime;
        let biased = reweight_rows(self.conn.matrix(), |i, nbrs, conn| {
            let t_nbrs: Vec<f64> = nbrs.iter().map(|&j| t[j]).collect();
            scheme.bias_row(t[i], &t_nbrs, conn)
        })?;

        let biased = if density_normalize {
            self.logger.debug("Density normalizing the transition matrix");
            self.conn.density_normalize(&biased)?
        } else {
            biased
        };

        let tmat = row_stochastic(&biased, &self.logger)?;

        let mut params = match scheme.to_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        params.insert("dnorm".into(), Value::Bool(density_normalize));
        params.insert("time_key".into(), self.time_key.as_ref().into());
        self.params = params;

        self.logger.finish("Finish", start);
        Ok(self.transition.insert(tmat))
    }
}

impl Kernel for PseudotimeKernel {
    fn connectivity(&self) -> &Connectivity {
        &self.conn
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn transition_matrix(&self) -> Option<&CsrMatrix<f64>> {
        self.transition.as_ref()
    }

    fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

impl Invertible for PseudotimeKernel {
    fn invert(&self) -> Self {
        let direction = self.direction.flipped();
        let backward = direction.backward().unwrap_or(false);
        PseudotimeKernel {
            conn: self.conn.clone(),
            direction,
            time_key: self.time_key.clone(),
            time: self.time.clone(),
            pseudotime: oriented(&self.time, backward),
            transition: None,
            params: Map::new(),
            logger: self.logger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use matrix_util::sparse_graph::row_sums;
    use matrix_util::traits::MatTriplets;

    // path graph 0 - 1 - 2 - 3
    fn path_conn() -> Connectivity {
        let triplets = vec![
            (0, 1, 1.0),
            (1, 0, 1.0),
            (1, 2, 1.0),
            (2, 1, 1.0),
            (2, 3, 1.0),
            (3, 2, 1.0),
        ];
        let csr = CsrMatrix::<f64>::from_nonzero_triplets(4, 4, triplets).unwrap();
        Connectivity::from_matrix("connectivities", csr, true, &Logger::default()).unwrap()
    }

    fn entry(mat: &CsrMatrix<f64>, i: usize, j: usize) -> f64 {
        mat.get_entry(i, j).map(|e| e.into_value()).unwrap_or(0.0)
    }

    #[test]
    fn test_forward_points_to_the_future() {
        let time = vec![0.0, 0.3, 0.6, 1.0];
        let mut kernel =
            PseudotimeKernel::from_parts(path_conn(), "t", time, false, &Logger::default()).unwrap();
        let tmat = kernel
            .compute_transition_matrix(ThresholdScheme::Hard { frac_to_keep: 0.0 }, false)
            .unwrap()
            .clone();

        for s in row_sums(&tmat) {
            assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(entry(&tmat, 1, 2), 1.0);
        assert_abs_diff_eq!(entry(&tmat, 1, 0), 0.0);
        // the terminal cell only keeps a self-loop
        assert_abs_diff_eq!(entry(&tmat, 3, 3), 1.0);
    }

    #[test]
    fn test_invert_flips_direction() {
        let time = vec![0.0, 0.3, 0.6, 1.0];
        let mut kernel =
            PseudotimeKernel::from_parts(path_conn(), "t", time, false, &Logger::default()).unwrap();
        kernel.compute_transition_matrix(ThresholdScheme::hard(), false).unwrap();

        let mut inverted = kernel.invert();
        assert_eq!(inverted.backward(), Some(true));
        assert!(inverted.transition_matrix().is_none());
        assert_eq!(inverted.connectivity().matrix(), kernel.connectivity().matrix());
        assert_abs_diff_eq!(inverted.pseudotime()[0], 1.0);

        let tmat = inverted
            .compute_transition_matrix(ThresholdScheme::Hard { frac_to_keep: 0.0 }, false)
            .unwrap();
        assert_abs_diff_eq!(entry(tmat, 2, 1), 1.0);

        assert_eq!(inverted.invert().backward(), Some(false));
    }

    #[test]
    fn test_out_of_range_time_is_normalized() {
        let time = vec![2.0, 4.0, 6.0, 10.0];
        let kernel =
            PseudotimeKernel::from_parts(path_conn(), "t", time, false, &Logger::default()).unwrap();
        assert_eq!(kernel.pseudotime(), &[0.0, 0.25, 0.5, 1.0]);

        let bad = vec![0.0, f64::NAN, 0.5, 1.0];
        let err = PseudotimeKernel::from_parts(path_conn(), "t", bad, false, &Logger::default())
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidValue(_)));
    }

    #[test]
    fn test_soft_scheme_with_density_normalization() {
        let time = vec![0.0, 0.3, 0.6, 1.0];
        let mut kernel =
            PseudotimeKernel::from_parts(path_conn(), "t", time, false, &Logger::default()).unwrap();
        let tmat = kernel
            .compute_transition_matrix(ThresholdScheme::soft(), true)
            .unwrap()
            .clone();
        for s in row_sums(&tmat) {
            assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
        }
        assert!(entry(&tmat, 1, 2) > entry(&tmat, 1, 0));
        assert_eq!(kernel.params()["scheme"], "soft");
        assert_eq!(kernel.params()["dnorm"], true);
    }
}
