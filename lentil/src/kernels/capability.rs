//! Capabilities shared by the kernels: kNN connectivities with
//! density normalization, and the direction of the process.

use crate::error::{KernelError, Result};
use crate::keys::CONNECTIVITIES;
use crate::logging::Logger;

use anno_beans::AnnoStore;
use matrix_util::sparse_graph::*;
use nalgebra_sparse::CsrMatrix;
use serde_json::Value;

/// Frobenius-norm tolerance of `A - A^T` for a symmetric graph
pub const SYMMETRY_TOL: f64 = 1e-4;

/// Outcome of the graph checks done when reading connectivities
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphDiagnostics {
    pub symmetric: bool,
    /// `None` unless connectivity was checked
    pub connected: Option<bool>,
}

/// kNN connectivities read from the store
#[derive(Clone, Debug)]
pub struct Connectivity {
    key: Box<str>,
    conn: CsrMatrix<f64>,
    diagnostics: GraphDiagnostics,
}

impl Connectivity {
    /// Read `obsp[key]` (default `connectivities`) and check the graph.
    ///
    /// Asymmetry is always reported; disconnection only if
    /// `check_connectivity`. Both are warnings, not errors.
    pub fn read(
        store: &AnnoStore,
        key: Option<&str>,
        check_connectivity: bool,
        logger: &Logger,
    ) -> Result<Self> {
        let key = key.unwrap_or(CONNECTIVITIES);
        let conn = store
            .obsp(key)
            .map_err(|_| KernelError::missing_key("obsp", key))?;

        if conn.nrows() != store.n_obs() {
            return Err(KernelError::ShapeMismatch {
                what: format!("obsp[{}]", key).into_boxed_str(),
                expected: (store.n_obs(), store.n_obs()),
                found: (conn.nrows(), conn.ncols()),
            });
        }

        Self::from_matrix(key, conn.clone(), check_connectivity, logger)
    }

    pub fn from_matrix(
        key: &str,
        conn: CsrMatrix<f64>,
        check_connectivity: bool,
        logger: &Logger,
    ) -> Result<Self> {
        if conn.nrows() != conn.ncols() {
            return Err(KernelError::ShapeMismatch {
                what: key.into(),
                expected: (conn.nrows(), conn.nrows()),
                found: (conn.nrows(), conn.ncols()),
            });
        }

        let connected = if check_connectivity {
            let connected = is_connected(&conn);
            if !connected {
                logger.warning("kNN graph is not connected");
            }
            Some(connected)
        } else {
            None
        };

        let symmetric = is_symmetric(&conn, SYMMETRY_TOL);
        if !symmetric {
            logger.warning("kNN graph is not symmetric");
        }

        Ok(Connectivity {
            key: key.into(),
            conn,
            diagnostics: GraphDiagnostics {
                symmetric,
                connected,
            },
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn matrix(&self) -> &CsrMatrix<f64> {
        &self.conn
    }

    pub fn diagnostics(&self) -> GraphDiagnostics {
        self.diagnostics
    }

    pub fn n_obs(&self) -> usize {
        self.conn.nrows()
    }

    /// Degree of each cell in the kNN graph
    pub fn degree(&self) -> Vec<f64> {
        row_sums(&self.conn)
    }

    /// `diag(1/q) * matrix * diag(1/q)` with `q` the kNN degree.
    ///
    /// Isolated cells (`q = 0`) are an error.
    pub fn density_normalize(&self, matrix: &CsrMatrix<f64>) -> Result<CsrMatrix<f64>> {
        let n = self.n_obs();
        if matrix.nrows() != n || matrix.ncols() != n {
            return Err(KernelError::ShapeMismatch {
                what: "matrix to density normalize".into(),
                expected: (n, n),
                found: (matrix.nrows(), matrix.ncols()),
            });
        }

        let q = self.degree();
        let zero = zero_degree_nodes(&q);
        if !zero.is_empty() {
            return Err(KernelError::ZeroDegree { nodes: zero });
        }

        let q_inv: Vec<f64> = q.iter().map(|&x| 1.0 / x).collect();
        Ok(scale_both_sides(matrix, &q_inv)?)
    }
}

/// Direction of a kernel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// no notion of forward or backward
    Undirected,
    Directed { backward: bool },
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Directed { backward: false }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Direction {
    pub fn directed(backward: bool) -> Self {
        Direction::Directed { backward }
    }

    /// `None` for undirected kernels
    pub fn backward(&self) -> Option<bool> {
        match self {
            Direction::Undirected => None,
            Direction::Directed { backward } => Some(*backward),
        }
    }

    /// Directed variant from a loosely typed flag, e.g., a parameter
    /// read back from JSON; anything but a boolean is a type error
    pub fn from_flag(flag: &Value) -> Result<Self> {
        match flag {
            Value::Bool(backward) => Ok(Direction::Directed {
                backward: *backward,
            }),
            other => Err(KernelError::Type {
                name: "backward",
                expected: "bool",
                found: json_type_name(other).into(),
            }),
        }
    }

    /// The backward flag of a directed kernel
    pub fn require_directed(&self) -> Result<bool> {
        self.backward().ok_or_else(|| KernelError::Type {
            name: "backward",
            expected: "bool",
            found: "undirected".into(),
        })
    }

    /// Flip forward and backward; undirected stays undirected
    pub fn flipped(&self) -> Self {
        match self {
            Direction::Undirected => Direction::Undirected,
            Direction::Directed { backward } => Direction::Directed {
                backward: !backward,
            },
        }
    }
}

/// Kernels that can reverse the direction of every edge
pub trait Invertible {
    /// A kernel with the opposite direction, the same connectivities
    /// and no transition matrix yet
    fn invert(&self) -> Self;
}
