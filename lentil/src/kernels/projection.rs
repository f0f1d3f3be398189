use super::Kernel;
use crate::error::{KernelError, Result};
use crate::keys::{params_key, projection_key};
use crate::logging::Logger;

use anno_beans::AnnoStore;
use ndarray::{Array1, Array2, ArrayView2};
use serde_json::{Map, Value};
use std::time::Instant;

/// Strip the conventional `X_` prefix of embedding names
pub fn basis_name(basis: &str) -> &str {
    basis.strip_prefix("X_").unwrap_or(basis)
}

/// Look up `obsm[X_<basis>]`, falling back to `obsm[<basis>]`
fn read_basis<'a>(store: &'a AnnoStore, basis: &str) -> Result<&'a Array2<f64>> {
    let name = basis_name(basis);
    let prefixed = format!("X_{}", name);
    if store.has_obsm(&prefixed) {
        Ok(store.obsm(&prefixed)?)
    } else if store.has_obsm(name) {
        Ok(store.obsm(name)?)
    } else {
        Err(KernelError::missing_key("obsm", &prefixed))
    }
}

/// Expected displacement of each cell in the embedding.
///
/// For cell `i` with kNN neighbours `N(i)`, the unit vectors
/// `(e_j - e_i) / |e_j - e_i|` are averaged with transition
/// probabilities as weights, minus their uniform average. A `NaN`
/// coordinate in the neighbourhood, or a cell without neighbours,
/// makes the whole row `NaN`.
pub fn project_transitions<K: Kernel + ?Sized>(kernel: &K, emb: &ArrayView2<f64>) -> Result<Array2<f64>> {
    let tmat = kernel.require_transition_matrix()?;
    let conn = kernel.connectivity().matrix();
    let (n, d) = emb.dim();

    if n != conn.nrows() {
        return Err(KernelError::ShapeMismatch {
            what: "embedding".into(),
            expected: (conn.nrows(), d),
            found: (n, d),
        });
    }

    let mut out = Array2::<f64>::zeros((n, d));

    for i in 0..n {
        let conn_row = conn.row(i);
        let nbrs = conn_row.col_indices();
        let e_i = emb.row(i);

        if nbrs.is_empty()
            || e_i.iter().any(|x| x.is_nan())
            || nbrs.iter().any(|&j| emb.row(j).iter().any(|x| x.is_nan()))
        {
            out.row_mut(i).fill(f64::NAN);
            continue;
        }

        let t_row = tmat.row(i);
        let mut weighted = Array1::<f64>::zeros(d);
        let mut uniform = Array1::<f64>::zeros(d);

        for &j in nbrs {
            let mut dx = &emb.row(j) - &e_i;
            let norm = dx.dot(&dx).sqrt();
            if norm > 0.0 {
                dx /= norm;
            } else {
                dx.fill(0.0);
            }

            let p_ij = t_row.get_entry(j).map(|e| e.into_value()).unwrap_or(0.0);
            weighted.scaled_add(p_ij, &dx);
            uniform += &dx;
        }

        uniform /= nbrs.len() as f64;
        out.row_mut(i).assign(&(weighted - uniform));
    }

    Ok(out)
}

/// Project the transition matrix of `kernel` onto `obsm[basis]`.
///
/// The result goes to `obsm[<key>_<basis>]` where `key` is
/// `key_added` or the kernel's transition key; the basis is recorded
/// in `uns[<key>_params]["embeddings"]`. An existing projection is
/// kept unless `recompute`.
pub fn project<K: Kernel + ?Sized>(
    kernel: &K,
    store: &mut AnnoStore,
    basis: &str,
    key_added: Option<&str>,
    recompute: bool,
    logger: &Logger,
) -> Result<String> {
    let name = basis_name(basis).to_string();
    let key = key_added.unwrap_or(kernel.default_key()).to_string();
    let obsm_key = projection_key(&key, &name);

    if !recompute && store.has_obsm(&obsm_key) {
        logger.info(&format!("Using precomputed projection `obsm['{}']`", obsm_key));
        return Ok(obsm_key);
    }

    let start = Instant::now();
    logger.info(&format!("Projecting transition matrix onto `{}`", name));

    let emb = read_basis(store, &name)?;
    let projected = project_transitions(kernel, &emb.view())?;

    store.add_obsm(&obsm_key, projected)?;

    let ukey = params_key(&key);
    let uns = store.uns_mut();
    let entry = uns
        .entry(ukey)
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(params) = entry {
        let embeddings = params
            .entry("embeddings")
            .or_insert_with(|| Value::Array(vec![]));
        if !embeddings.is_array() {
            *embeddings = Value::Array(vec![]);
        }
        if let Value::Array(list) = embeddings {
            if !list.iter().any(|v| v.as_str() == Some(name.as_str())) {
                list.push(Value::String(name.clone()));
            }
        }
    }

    logger.finish(&format!("Adding `obsm['{}']`\n    Finish", obsm_key), start);
    Ok(obsm_key)
}
