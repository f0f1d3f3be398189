use fnv::FnvHashMap as HashMap;
use log::debug;
use nalgebra_sparse::CsrMatrix;

/// Weighted degree of every node: `q[i] = sum_j A[i,j]`
pub fn row_sums(adj: &CsrMatrix<f64>) -> Vec<f64> {
    adj.row_iter().map(|row| row.values().iter().sum()).collect()
}

/// Nodes whose weighted degree is zero (or not finite)
pub fn zero_degree_nodes(degree: &[f64]) -> Vec<usize> {
    degree
        .iter()
        .enumerate()
        .filter_map(|(i, &q)| if q == 0.0 || !q.is_finite() { Some(i) } else { None })
        .collect()
}

/// Frobenius norm of `A - A^T`
pub fn asymmetry_norm(adj: &CsrMatrix<f64>) -> f64 {
    let mut diff: HashMap<(usize, usize), f64> = HashMap::default();
    for (i, j, &a_ij) in adj.triplet_iter() {
        if i == j {
            continue;
        }
        // accumulate a_ij - a_ji on the canonical pair (lo, hi)
        let (key, sign) = if i < j { ((i, j), 1.0) } else { ((j, i), -1.0) };
        *diff.entry(key).or_insert(0.0) += sign * a_ij;
    }
    // each unordered pair appears twice in A - A^T
    (2.0 * diff.values().map(|d| d * d).sum::<f64>()).sqrt()
}

/// Check if the matrix equals its own transpose within `tol` in the
/// Frobenius norm
pub fn is_symmetric(adj: &CsrMatrix<f64>, tol: f64) -> bool {
    adj.nrows() == adj.ncols() && asymmetry_norm(adj) < tol
}

/// Connected components of the underlying undirected graph
/// (an edge `i -- j` exists if `A[i,j] != 0` or `A[j,i] != 0`).
///
/// Returns the number of components and a component label per node
pub fn connected_components(adj: &CsrMatrix<f64>) -> (usize, Vec<usize>) {
    let nn = adj.nrows().max(adj.ncols());
    let mut parent: Vec<usize> = (0..nn).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for (i, j, &a_ij) in adj.triplet_iter() {
        if a_ij == 0.0 {
            continue;
        }
        let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
        if ri != rj {
            parent[ri.max(rj)] = ri.min(rj);
        }
    }

    let mut label_of_root: HashMap<usize, usize> = HashMap::default();
    let mut labels = Vec::with_capacity(nn);
    for x in 0..nn {
        let root = find(&mut parent, x);
        let next = label_of_root.len();
        labels.push(*label_of_root.entry(root).or_insert(next));
    }

    debug!("{} connected components over {} nodes", label_of_root.len(), nn);
    (label_of_root.len(), labels)
}

/// Check if the underlying undirected graph is fully connected
pub fn is_connected(adj: &CsrMatrix<f64>) -> bool {
    connected_components(adj).0 <= 1
}

/// Scale both sides of a square matrix by a diagonal:
/// `diag(d) * M * diag(d)`
pub fn scale_both_sides(mat: &CsrMatrix<f64>, d: &[f64]) -> anyhow::Result<CsrMatrix<f64>> {
    if mat.nrows() != d.len() || mat.ncols() != d.len() {
        anyhow::bail!(
            "cannot scale {} x {} matrix by a diagonal of size {}",
            mat.nrows(),
            mat.ncols(),
            d.len()
        );
    }

    let offsets = mat.row_offsets();
    let cols = mat.col_indices();
    let mut values = mat.values().to_vec();

    for i in 0..mat.nrows() {
        for idx in offsets[i]..offsets[i + 1] {
            values[idx] *= d[i] * d[cols[idx]];
        }
    }

    Ok(CsrMatrix::try_from_csr_data(
        mat.nrows(),
        mat.ncols(),
        offsets.to_vec(),
        cols.to_vec(),
        values,
    )
    .map_err(|e| anyhow::anyhow!("invalid CSR data: {}", e))?)
}

/// Normalize each row to sum to one. Rows without any mass are left
/// untouched and reported.
///
/// Returns the normalized matrix and the indices of empty rows
pub fn normalize_rows(mat: &CsrMatrix<f64>) -> anyhow::Result<(CsrMatrix<f64>, Vec<usize>)> {
    let offsets = mat.row_offsets();
    let mut values = mat.values().to_vec();
    let mut empty = vec![];

    for i in 0..mat.nrows() {
        let (lb, ub) = (offsets[i], offsets[i + 1]);
        let tot: f64 = values[lb..ub].iter().sum();
        if tot > 0.0 {
            values[lb..ub].iter_mut().for_each(|v| *v /= tot);
        } else {
            empty.push(i);
        }
    }

    let normalized = CsrMatrix::try_from_csr_data(
        mat.nrows(),
        mat.ncols(),
        offsets.to_vec(),
        mat.col_indices().to_vec(),
        values,
    )
    .map_err(|e| anyhow::anyhow!("invalid CSR data: {}", e))?;
    Ok((normalized, empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MatTriplets;
    use approx::assert_abs_diff_eq;

    /// Two triangles {0,1,2} and {3,4,5}, symmetric
    fn two_triangles() -> CsrMatrix<f64> {
        let mut triplets = vec![];
        for &(i, j) in &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)] {
            triplets.push((i, j, 1.0));
            triplets.push((j, i, 1.0));
        }
        CsrMatrix::<f64>::from_nonzero_triplets(6, 6, triplets).unwrap()
    }

    #[test]
    fn test_symmetry() {
        let sym = two_triangles();
        assert!(is_symmetric(&sym, 1e-4));

        let asym = CsrMatrix::<f64>::from_nonzero_triplets(2, 2, vec![(0, 1, 1.0)]).unwrap();
        assert!(!is_symmetric(&asym, 1e-4));
        assert_abs_diff_eq!(asymmetry_norm(&asym), 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_connected_components() {
        let adj = two_triangles();
        let (ncomp, labels) = connected_components(&adj);
        assert_eq!(ncomp, 2);
        assert_eq!(labels[0], labels[2]);
        assert_ne!(labels[0], labels[3]);
        assert!(!is_connected(&adj));

        // a one-directional edge still connects in the undirected sense
        let chain =
            CsrMatrix::<f64>::from_nonzero_triplets(3, 3, vec![(0, 1, 1.0), (2, 1, 1.0)]).unwrap();
        assert!(is_connected(&chain));
    }

    #[test]
    fn test_scale_both_sides_identity() {
        let adj = two_triangles();
        let scaled = scale_both_sides(&adj, &[1.0; 6]).unwrap();
        assert_eq!(scaled, adj);

        let halved = scale_both_sides(&adj, &[0.5; 6]).unwrap();
        for (_, _, &v) in halved.triplet_iter() {
            assert_abs_diff_eq!(v, 0.25);
        }
    }

    #[test]
    fn test_normalize_rows_reports_empty() {
        let mat =
            CsrMatrix::<f64>::from_nonzero_triplets(3, 3, vec![(0, 1, 2.0), (0, 2, 2.0), (2, 0, 1.0)])
                .unwrap();
        let (normalized, empty) = normalize_rows(&mat).unwrap();
        assert_eq!(empty, vec![1]);
        assert_eq!(row_sums(&normalized), vec![1.0, 0.0, 1.0]);
        assert_eq!(zero_degree_nodes(&row_sums(&mat)), vec![1]);
    }
}
