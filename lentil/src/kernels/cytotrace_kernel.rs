//! CytoTRACE: differentiation potential from the number of genes
//! expressed per cell.
//!
//! Genes are ranked by their correlation with the number of
//! expressed genes; the (imputed) expression of the top correlates is
//! aggregated into a per-cell score. High scores mark naive, plastic
//! cells, so the pseudotime is `1 - score`. The kernel then directs
//! the kNN graph along that pseudotime.

use super::capability::{Connectivity, Direction, Invertible};
use super::pseudotime_kernel::{min_max_normalize, PseudotimeKernel};
use super::threshold_scheme::ThresholdScheme;
use super::Kernel;
use crate::aggregation::Aggregation;
use crate::correlation::correlation_test;
use crate::error::{KernelError, Result};
use crate::keys::*;
use crate::logging::Logger;

use anno_beans::{AnnoStore, Column, ExprMatrix, Frame};
use nalgebra_sparse::CsrMatrix;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::time::Instant;

const RECOMMENDED_MIN_GENES: usize = 10000;

#[derive(Clone, Debug)]
pub struct CytoTraceParams {
    /// layer aggregated into the score; `None` or `X` for the primary matrix
    pub layer: Option<Box<str>>,
    pub aggregation: Aggregation,
    /// count expressed genes and correlate on the raw matrix
    pub use_raw: bool,
    pub n_pos_genes: usize,
    /// `None` to use positive correlates only
    pub n_neg_genes: Option<usize>,
    /// threads of the correlation test; all cores if `None`
    pub n_jobs: Option<usize>,
}

impl Default for CytoTraceParams {
    fn default() -> Self {
        CytoTraceParams {
            layer: Some("Ms".into()),
            aggregation: Aggregation::Mean,
            use_raw: false,
            n_pos_genes: 200,
            n_neg_genes: None,
            n_jobs: Some(1),
        }
    }
}

/// Everything `compute_cytotrace` writes to the store
#[derive(Clone, Debug)]
pub struct CytoTraceScore {
    pub score: Vec<f64>,
    pub pseudotime: Vec<f64>,
    pub num_exp_genes: Vec<usize>,
    /// aligned with the genes of the primary matrix
    pub gene_corr: Vec<f64>,
    pub pos_genes: Vec<Box<str>>,
    pub neg_genes: Vec<Box<str>>,
    pub params: Map<String, Value>,
}

fn modifier(ascending: bool) -> &'static str {
    if ascending {
        "negatively"
    } else {
        "positively"
    }
}

/// `NaN` sorts last in either direction
fn compare_corr(a: f64, b: f64, ascending: bool) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) if ascending => a.total_cmp(&b),
        (false, false) => b.total_cmp(&a),
    }
}

/// Top `n_top` genes by correlation, restricted to the genes of `var`.
///
/// Ties keep the original gene order. Any `NaN` correlation within
/// the selection, or an empty selection, is an error; a selection
/// shorter than requested is only a warning.
pub fn select_top_genes(
    gene_corr: &[f64],
    gene_names: &[Box<str>],
    var: &Frame,
    ascending: bool,
    n_top: usize,
    logger: &Logger,
) -> Result<Vec<Box<str>>> {
    let modifier = modifier(ascending);
    if n_top == 0 {
        return Err(KernelError::invalid_value(format!(
            "expected number of {} correlated genes to be positive, found `0`",
            modifier
        )));
    }
    debug_assert_eq!(gene_corr.len(), gene_names.len());

    let mut order: Vec<usize> = (0..gene_corr.len()).collect();
    order.sort_by(|&a, &b| compare_corr(gene_corr[a], gene_corr[b], ascending));

    let selected: Vec<usize> = order
        .into_iter()
        .filter(|&g| var.contains_name(&gene_names[g]))
        .take(n_top)
        .collect();

    let n_nan = selected.iter().filter(|&&g| gene_corr[g].is_nan()).count();
    if n_nan > 0 {
        return Err(KernelError::NanInSelection {
            modifier,
            n_selected: selected.len(),
            n_nan,
        });
    }
    if selected.is_empty() {
        return Err(KernelError::EmptySelection { modifier });
    }
    if selected.len() < n_top {
        logger.warning(&format!(
            "Unable to get requested top {} correlated `{}`. Using top `{}` genes",
            modifier,
            n_top,
            selected.len()
        ));
    }

    Ok(selected.into_iter().map(|g| gene_names[g].clone()).collect())
}

fn aggregate_genes(
    mat: &ExprMatrix,
    var: &Frame,
    genes: &[Box<str>],
    aggregation: Aggregation,
) -> Result<Vec<f64>> {
    let columns = genes
        .iter()
        .map(|g| {
            var.position(g)
                .ok_or_else(|| KernelError::missing_key("var_names", g))
        })
        .collect::<Result<Vec<usize>>>()?;
    Ok(aggregation.aggregate(&mat.select_columns(&columns)?))
}

/// The matrix behind `layer`: a named layer, or the primary matrix
/// for `None` and `X`
fn resolve_layer<'a>(store: &'a AnnoStore, layer: Option<&str>) -> Result<&'a ExprMatrix> {
    match layer {
        None | Some(X_LAYER) => Ok(store.x()),
        Some(name) if store.has_layer(name) => Ok(store.layer(name)?),
        Some(name) => {
            let mut valid: Vec<Box<str>> = vec![X_LAYER.into()];
            valid.extend(store.layer_names().into_iter().map(Box::from));
            valid.sort();
            Err(KernelError::MissingKey {
                slot: "layers",
                key: name.into(),
                valid,
            })
        }
    }
}

/// Compute the CytoTRACE score and write it to the store:
///
/// * `obs`: `ct_score`, `ct_pseudotime`, `ct_num_exp_genes`
/// * `var`: `ct_gene_corr`, `ct_pos_correlates`, `ct_neg_correlates`
/// * `uns`: `ct_params`
///
/// The store is left untouched if anything fails.
pub fn compute_cytotrace(
    store: &mut AnnoStore,
    params: &CytoTraceParams,
    logger: &Logger,
) -> Result<CytoTraceScore> {
    if params.n_pos_genes == 0 {
        return Err(KernelError::invalid_value(
            "expected number of positively correlated genes to be positive, found `0`",
        ));
    }
    if params.n_neg_genes == Some(0) {
        return Err(KernelError::invalid_value(
            "expected number of negatively correlated genes to be positive, found `0`",
        ));
    }

    let mut use_raw = params.use_raw;
    if use_raw && store.raw().is_none() {
        logger.warning("`raw` is missing. Setting `use_raw=false`");
        use_raw = false;
    }

    let layer = params.layer.as_deref();
    let layer_mat = resolve_layer(store, layer)?;

    let (count_mat, count_genes) = match store.raw() {
        Some(raw) if use_raw => (&raw.x, raw.var.names()),
        _ => (store.x(), store.var_names()),
    };

    let mut msg = format!("Computing CytoTRACE score with `{}` genes", count_genes.len());
    if count_genes.len() < RECOMMENDED_MIN_GENES {
        msg.push_str(&format!(
            ". Consider using more than `{}` genes",
            RECOMMENDED_MIN_GENES
        ));
    }
    logger.info(&msg);
    let start = Instant::now();

    let num_exp_genes = count_mat.count_positive_per_row();

    logger.debug("Correlating all genes with number of genes expressed per cell");
    let y: Vec<f64> = num_exp_genes.iter().map(|&n| n as f64).collect();
    let corr = correlation_test(count_mat, &y, count_genes, 0.95, params.n_jobs)?.corr;

    let var = store.var();
    let aggregation = params.aggregation;

    let pos_genes = select_top_genes(&corr, count_genes, var, false, params.n_pos_genes, logger)?;
    let mut score = aggregate_genes(layer_mat, var, &pos_genes, aggregation)?;

    let neg_genes = match params.n_neg_genes {
        Some(n_neg) => {
            let neg_genes = select_top_genes(&corr, count_genes, var, true, n_neg, logger)?;
            let inv_score = aggregate_genes(layer_mat, var, &neg_genes, aggregation)?;
            let inv_max = inv_score.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            for (s, inv) in score.iter_mut().zip(inv_score.iter()) {
                *s += inv_max - inv;
            }
            neg_genes
        }
        None => vec![],
    };

    if score.iter().any(|s| !s.is_finite()) {
        return Err(KernelError::NonFinite(CT_SCORE.into()));
    }

    let score = min_max_normalize(&score);
    let pseudotime: Vec<f64> = score.iter().map(|s| 1.0 - s).collect();

    // correlations were computed over `count_genes`; align by name
    let gene_corr: Vec<f64> = if use_raw {
        let raw_var = store.raw().map(|raw| &raw.var);
        var.names()
            .iter()
            .map(|g| {
                raw_var
                    .and_then(|rv| rv.position(g))
                    .map_or(f64::NAN, |k| corr[k])
            })
            .collect()
    } else {
        corr
    };

    let flags = |genes: &[Box<str>]| -> Vec<bool> {
        let mut flag = vec![false; var.len()];
        for g in genes {
            if let Some(k) = var.position(g) {
                flag[k] = true;
            }
        }
        flag
    };
    let pos_flags = flags(&pos_genes);
    let neg_flags = flags(&neg_genes);

    let mut ct_params = Map::new();
    ct_params.insert("aggregation".into(), aggregation.as_str().into());
    ct_params.insert("layer".into(), json!(layer));
    ct_params.insert("use_raw".into(), Value::Bool(use_raw));
    ct_params.insert("n_pos_genes".into(), pos_genes.len().into());
    ct_params.insert("n_neg_genes".into(), neg_genes.len().into());

    let result = CytoTraceScore {
        score,
        pseudotime,
        num_exp_genes,
        gene_corr,
        pos_genes,
        neg_genes,
        params: ct_params,
    };

    let obs = store.obs_mut();
    obs.insert(CT_SCORE, Column::Float(result.score.clone()))?;
    obs.insert(CT_PSEUDOTIME, Column::Float(result.pseudotime.clone()))?;
    obs.insert(
        CT_NUM_EXP_GENES,
        Column::Int(result.num_exp_genes.iter().map(|&n| n as i64).collect()),
    )?;

    let var = store.var_mut();
    var.insert(CT_GENE_CORR, Column::Float(result.gene_corr.clone()))?;
    var.insert(CT_POS_CORRELATES, Column::Bool(pos_flags))?;
    var.insert(CT_NEG_CORRELATES, Column::Bool(neg_flags))?;

    store
        .uns_mut()
        .insert(CT_PARAMS.into(), Value::Object(result.params.clone()));

    logger.finish(
        &format!(
            "Adding `obs['{}']`\n       `obs['{}']`\n       `obs['{}']`\n       \
             `var['{}']`\n       `var['{}']`\n       `var['{}']`\n       `uns['{}']`\n    Finish",
            CT_SCORE,
            CT_PSEUDOTIME,
            CT_NUM_EXP_GENES,
            CT_GENE_CORR,
            CT_POS_CORRELATES,
            CT_NEG_CORRELATES,
            CT_PARAMS
        ),
        start,
    );

    Ok(result)
}

/// Pseudotime kernel on the CytoTRACE-derived pseudotime
#[derive(Clone, Debug)]
pub struct CytoTraceKernel {
    inner: PseudotimeKernel,
    cytotrace: CytoTraceScore,
}

impl CytoTraceKernel {
    /// Score the cells, persist the score and build the pseudotime
    /// kernel on `obs[ct_pseudotime]`
    pub fn new(
        store: &mut AnnoStore,
        params: &CytoTraceParams,
        backward: bool,
        conn_key: Option<&str>,
        check_connectivity: bool,
        logger: &Logger,
    ) -> Result<Self> {
        let conn = Connectivity::read(store, conn_key, check_connectivity, logger)?;
        let cytotrace = compute_cytotrace(store, params, logger)?;
        let time = store.obs().get_f64("obs", CT_PSEUDOTIME)?;
        let inner = PseudotimeKernel::from_parts(conn, CT_PSEUDOTIME, time, backward, logger)?;
        Ok(CytoTraceKernel { inner, cytotrace })
    }

    pub fn cytotrace(&self) -> &CytoTraceScore {
        &self.cytotrace
    }

    pub fn pseudotime_kernel(&self) -> &PseudotimeKernel {
        &self.inner
    }

    pub fn compute_transition_matrix(
        &mut self,
        scheme: ThresholdScheme,
        density_normalize: bool,
    ) -> Result<&CsrMatrix<f64>> {
        self.inner.compute_transition_matrix(scheme, density_normalize)
    }
}

impl Kernel for CytoTraceKernel {
    fn connectivity(&self) -> &Connectivity {
        self.inner.connectivity()
    }

    fn direction(&self) -> Direction {
        self.inner.direction()
    }

    fn transition_matrix(&self) -> Option<&CsrMatrix<f64>> {
        self.inner.transition_matrix()
    }

    fn params(&self) -> &Map<String, Value> {
        self.inner.params()
    }
}

impl Invertible for CytoTraceKernel {
    fn invert(&self) -> Self {
        CytoTraceKernel {
            inner: self.inner.invert(),
            cytotrace: self.cytotrace.clone(),
        }
    }
}
