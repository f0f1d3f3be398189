use anno_beans::io::{load_store, write_frame, StoreFiles};
use anno_beans::{Column, ExprMatrix};
use matrix_util::common_io::{read_lines, write_lines};
use matrix_util::mtx_io::write_mtx_csr;
use matrix_util::traits::MatTriplets;
use nalgebra_sparse::CsrMatrix;

fn path(dir: &tempfile::TempDir, name: &str) -> Box<str> {
    dir.path().join(name).to_str().unwrap().into()
}

#[test]
fn load_store_from_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    // 3 genes x 2 cells, 10x orientation
    let gene_by_cell =
        CsrMatrix::<f64>::from_nonzero_triplets(3, 2, vec![(0, 0, 1.0), (2, 0, 4.0), (1, 1, 2.0)])?;
    write_mtx_csr(&gene_by_cell, &path(&dir, "x.mtx.gz"))?;
    write_lines(&["cell_a", "cell_b"], &path(&dir, "cells.txt"))?;
    write_lines(&["g1", "g2", "g3"], &path(&dir, "genes.txt"))?;

    let knn = CsrMatrix::<f64>::from_nonzero_triplets(2, 2, vec![(0, 1, 1.0), (1, 0, 1.0)])?;
    write_mtx_csr(&knn, &path(&dir, "knn.mtx"))?;

    let files = StoreFiles {
        x: path(&dir, "x.mtx.gz"),
        cells: path(&dir, "cells.txt"),
        genes: path(&dir, "genes.txt"),
        genes_by_cells: true,
        obsp: vec![("connectivities".into(), path(&dir, "knn.mtx"))],
        ..Default::default()
    };

    let mut store = load_store(&files)?;
    assert_eq!((store.n_obs(), store.n_vars()), (2, 3));
    assert!(matches!(store.x(), ExprMatrix::Sparse(_)));
    assert_eq!(store.x().count_positive_per_row(), vec![2, 1]);
    assert_eq!(store.obsp("connectivities")?.nnz(), 2);

    store
        .obs_mut()
        .insert("score", Column::Float(vec![1.0, 0.0]))?;
    write_frame(store.obs(), &path(&dir, "obs.tsv.gz"))?;

    let lines = read_lines(&path(&dir, "obs.tsv.gz"))?;
    assert_eq!(lines[0].as_ref(), "name\tscore");
    assert_eq!(lines[2].as_ref(), "cell_b\t0");

    Ok(())
}
