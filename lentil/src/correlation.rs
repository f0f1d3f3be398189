//! One-vs-many Pearson correlation test.
//!
//! Every gene (column) of a cell x gene matrix is correlated with a
//! per-cell covariate. Sufficient statistics are accumulated over
//! minibatches of cells, possibly in parallel, and merged; the
//! p-values and confidence intervals follow from Fisher's z-transform.

use crate::error::{KernelError, Result};
use crate::parallel::parallelize;

use anno_beans::ExprMatrix;
use matrix_util::sparse_stat::SparseRunningStatistics;
use matrix_util::utils::generate_minibatch_intervals;
use statrs::distribution::{ContinuousCDF, Normal};

const CELL_BLOCK_SIZE: usize = 1000;

/// Per-gene output of [`correlation_test`]
#[derive(Debug, Clone)]
pub struct CorrelationTest {
    pub gene_names: Vec<Box<str>>,
    pub corr: Vec<f64>,
    pub pvalue: Vec<f64>,
    pub qvalue: Vec<f64>,
    pub ci_low: Vec<f64>,
    pub ci_high: Vec<f64>,
    pub confidence_level: f64,
}

impl CorrelationTest {
    pub fn len(&self) -> usize {
        self.corr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corr.is_empty()
    }
}

/// Correlate each column of `x` with `y`.
///
/// * `x` - cells x genes
/// * `y` - one value per cell
/// * `gene_names` - one name per column of `x`
/// * `confidence_level` - in (0, 1), e.g., 0.95
/// * `n_jobs` - worker threads; all cores if `None`
///
/// Genes without variance get `NaN` correlation, p-value and
/// interval. With three or fewer cells only the correlation is
/// defined.
pub fn correlation_test(
    x: &ExprMatrix,
    y: &[f64],
    gene_names: &[Box<str>],
    confidence_level: f64,
    n_jobs: Option<usize>,
) -> Result<CorrelationTest> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(KernelError::invalid_value(format!(
            "expected `confidence_level` to be in (0, 1), found `{}`",
            confidence_level
        )));
    }
    if y.len() != x.nrows() {
        return Err(KernelError::ShapeMismatch {
            what: "covariate".into(),
            expected: (x.nrows(), 1),
            found: (y.len(), 1),
        });
    }
    if gene_names.len() != x.ncols() {
        return Err(KernelError::ShapeMismatch {
            what: "gene names".into(),
            expected: (x.ncols(), 1),
            found: (gene_names.len(), 1),
        });
    }

    let ngenes = x.ncols();
    let blocks = generate_minibatch_intervals(x.nrows(), CELL_BLOCK_SIZE);

    let partial = parallelize(&blocks, n_jobs, "cell blocks", false, |chunk, tx| {
        let mut stat = SparseRunningStatistics::<f64>::new(ngenes);
        for &(lb, ub) in chunk {
            for i in lb..ub {
                x.visit_row(i, |indices, values| {
                    stat.add_sparse_with_covariate(indices, values, y[i])
                });
            }
            let _ = tx.send(1);
        }
        stat
    })?;

    let mut stat = SparseRunningStatistics::<f64>::new(ngenes);
    for s in partial.iter() {
        stat.merge(s);
    }

    let corr = stat.correlation_with_covariate();
    let nobs = stat.nobs();

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| KernelError::invalid_value(format!("standard normal: {}", e)))?;
    let z_crit = normal.inverse_cdf((1.0 + confidence_level) / 2.0);

    let mut pvalue = vec![f64::NAN; ngenes];
    let mut ci_low = vec![f64::NAN; ngenes];
    let mut ci_high = vec![f64::NAN; ngenes];

    if nobs > 3 {
        let se = 1.0 / ((nobs - 3) as f64).sqrt();
        for (g, &r) in corr.iter().enumerate() {
            if r.is_nan() {
                continue;
            }
            let z = r.atanh();
            pvalue[g] = 2.0 * normal.cdf(-z.abs() / se);
            ci_low[g] = (z - z_crit * se).tanh();
            ci_high[g] = (z + z_crit * se).tanh();
        }
    }

    let qvalue = benjamini_hochberg(&pvalue);

    Ok(CorrelationTest {
        gene_names: gene_names.to_vec(),
        corr,
        pvalue,
        qvalue,
        ci_low,
        ci_high,
        confidence_level,
    })
}

/// Benjamini-Hochberg adjusted p-values; `NaN` entries are skipped
/// and stay `NaN`
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..pvalues.len())
        .filter(|&i| !pvalues[i].is_nan())
        .collect();
    order.sort_by(|&a, &b| pvalues[a].total_cmp(&pvalues[b]));

    let m = order.len() as f64;
    let mut qvalues = vec![f64::NAN; pvalues.len()];
    let mut running_min = 1.0_f64;

    for (rank, &i) in order.iter().enumerate().rev() {
        let q = pvalues[i] * m / (rank + 1) as f64;
        running_min = running_min.min(q);
        qvalues[i] = running_min;
    }
    qvalues
}
