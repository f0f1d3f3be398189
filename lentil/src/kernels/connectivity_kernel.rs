use super::capability::{Connectivity, Direction};
use super::{row_stochastic, Kernel};
use crate::error::Result;
use crate::logging::Logger;

use anno_beans::AnnoStore;
use nalgebra_sparse::CsrMatrix;
use serde_json::{Map, Value};
use std::time::Instant;

/// Undirected kernel: a random walk on the kNN graph itself
#[derive(Clone, Debug)]
pub struct ConnectivityKernel {
    conn: Connectivity,
    transition: Option<CsrMatrix<f64>>,
    params: Map<String, Value>,
    logger: Logger,
}

impl ConnectivityKernel {
    pub fn new(
        store: &AnnoStore,
        conn_key: Option<&str>,
        check_connectivity: bool,
        logger: &Logger,
    ) -> Result<Self> {
        let conn = Connectivity::read(store, conn_key, check_connectivity, logger)?;
        Ok(Self::from_connectivity(conn, logger))
    }

    pub fn from_connectivity(conn: Connectivity, logger: &Logger) -> Self {
        ConnectivityKernel {
            conn,
            transition: None,
            params: Map::new(),
            logger: *logger,
        }
    }

    pub fn compute_transition_matrix(&mut self, density_normalize: bool) -> Result<&CsrMatrix<f64>> {
        let start = Instant::now();
        self.logger.info(&format!(
            "Computing transition matrix based on `{}`",
            self.conn.key()
        ));

        let tmat = if density_normalize {
            self.logger.debug("Density normalizing the transition matrix");
            let dnorm = self.conn.density_normalize(self.conn.matrix())?;
            row_stochastic(&dnorm, &self.logger)?
        } else {
            row_stochastic(self.conn.matrix(), &self.logger)?
        };

        self.params = Map::new();
        self.params.insert("dnorm".into(), Value::Bool(density_normalize));
        self.params.insert("key".into(), self.conn.key().into());

        self.logger.finish("Finish", start);
        Ok(self.transition.insert(tmat))
    }
}

impl Kernel for ConnectivityKernel {
    fn connectivity(&self) -> &Connectivity {
        &self.conn
    }

    fn direction(&self) -> Direction {
        Direction::Undirected
    }

    fn transition_matrix(&self) -> Option<&CsrMatrix<f64>> {
        self.transition.as_ref()
    }

    fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use matrix_util::traits::MatTriplets;

    #[test]
    fn test_undirected_random_walk() {
        let csr = CsrMatrix::<f64>::from_nonzero_triplets(
            3,
            3,
            vec![(0, 1, 1.0), (1, 0, 1.0), (1, 2, 3.0), (2, 1, 3.0)],
        )
        .unwrap();
        let logger = Logger::default();
        let conn = Connectivity::from_matrix("connectivities", csr, false, &logger).unwrap();
        let mut kernel = ConnectivityKernel::from_connectivity(conn, &logger);
        assert_eq!(kernel.backward(), None);
        assert_eq!(kernel.default_key(), "T_fwd");

        let tmat = kernel.compute_transition_matrix(false).unwrap();
        let row1: Vec<f64> = tmat.row(1).values().to_vec();
        assert_abs_diff_eq!(row1[0], 0.25);
        assert_abs_diff_eq!(row1[1], 0.75);

        // q = [1, 4, 3]: row 1 becomes [1/4, 3/12] before normalization
        let tmat = kernel.compute_transition_matrix(true).unwrap();
        let row1: Vec<f64> = tmat.row(1).values().to_vec();
        assert_abs_diff_eq!(row1[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(row1[1], 0.5, epsilon = 1e-12);
    }
}
