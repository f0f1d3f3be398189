use anno_beans::io::{load_store, write_frame, write_uns, StoreFiles};
use anno_beans::{AnnoStore, Column};
use approx::assert_abs_diff_eq;
use lentil::kernels::projection::project;
use lentil::{
    ConnectivityKernel, Invertible, Kernel, KernelError, Logger, PseudotimeKernel, ThresholdScheme,
};
use matrix_util::common_io::{read_lines, write_lines};
use matrix_util::mtx_io::{read_mtx_csr, write_mtx_csr};
use matrix_util::ndarray_io::write_dense_tsv;
use matrix_util::traits::MatTriplets;
use nalgebra_sparse::CsrMatrix;
use ndarray::{array, Array2};

fn path(dir: &tempfile::TempDir, name: &str) -> Box<str> {
    dir.path().join(name).to_str().unwrap().into()
}

// path graph 0 - 1 - 2 - 3
fn path_knn() -> CsrMatrix<f64> {
    let triplets = vec![
        (0, 1, 1.0),
        (1, 0, 1.0),
        (1, 2, 1.0),
        (2, 1, 1.0),
        (2, 3, 1.0),
        (3, 2, 1.0),
    ];
    CsrMatrix::<f64>::from_nonzero_triplets(4, 4, triplets).unwrap()
}

fn entry(mat: &CsrMatrix<f64>, i: usize, j: usize) -> f64 {
    mat.get_entry(i, j).map(|e| e.into_value()).unwrap_or(0.0)
}

fn store_on_path() -> AnnoStore {
    let x = Array2::<f64>::ones((4, 2));
    let cells = vec!["a".into(), "b".into(), "c".into(), "d".into()];
    let genes = vec!["g0".into(), "g1".into()];
    let mut store = AnnoStore::new(x.into(), cells, genes).unwrap();
    store.add_obsp("connectivities", path_knn()).unwrap();
    store
}

#[test]
fn missing_inputs_are_reported_by_slot() {
    let logger = Logger::default();
    let store = store_on_path();

    match ConnectivityKernel::new(&store, Some("distances"), false, &logger) {
        Err(KernelError::MissingKey { slot, key, .. }) => {
            assert_eq!(slot, "obsp");
            assert_eq!(key.as_ref(), "distances");
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }

    match PseudotimeKernel::new(&store, "dpt_pseudotime", false, None, false, &logger) {
        Err(KernelError::MissingKey { slot, .. }) => assert_eq!(slot, "obs"),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }

    let kernel = ConnectivityKernel::new(&store, None, true, &logger).unwrap();
    assert!(kernel.transition_matrix().is_none());
    assert!(matches!(
        kernel.write_to_store(&mut store_on_path(), None),
        Err(KernelError::InvalidValue(_))
    ));
}

#[test]
fn pseudotime_kernel_from_store() {
    let logger = Logger::default();
    let mut store = store_on_path();
    store
        .obs_mut()
        .insert("dpt", Column::Float(vec![0.0, 1.0, 2.0, 3.0]))
        .unwrap();

    // out of [0, 1]: normalized with a warning
    let mut kernel = PseudotimeKernel::new(&store, "dpt", false, None, true, &logger).unwrap();
    assert_eq!(kernel.pseudotime(), &[0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0]);
    assert_eq!(kernel.connectivity().diagnostics().connected, Some(true));

    let tmat = kernel
        .compute_transition_matrix(ThresholdScheme::Hard { frac_to_keep: 0.0 }, false)
        .unwrap();
    assert_eq!(entry(tmat, 1, 2), 1.0);
    assert_eq!(entry(tmat, 1, 0), 0.0);
    assert_eq!(entry(tmat, 3, 3), 1.0);

    let mut backward = kernel.invert();
    assert_eq!(backward.default_key(), "T_bwd");
    let tmat = backward
        .compute_transition_matrix(ThresholdScheme::Hard { frac_to_keep: 0.0 }, false)
        .unwrap();
    assert_eq!(entry(tmat, 1, 0), 1.0);
    assert_eq!(entry(tmat, 0, 0), 1.0);

    backward.write_to_store(&mut store, None).unwrap();
    let params = &store.uns()["T_bwd_params"];
    assert_eq!(params["backward"], true);
    assert_eq!(params["time_key"], "dpt");
    assert_eq!(params["conn_key"], "connectivities");
    assert_eq!(params["dnorm"], false);
}

#[test]
fn connectivity_kernel_round_trip_through_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let logger = Logger::default();

    let x = Array2::<f64>::ones((4, 2));
    write_dense_tsv(&x.view(), &path(&dir, "x.tsv.gz"))?;
    write_lines(&["a", "b", "c", "d"], &path(&dir, "cells.txt"))?;
    write_lines(&["g0", "g1"], &path(&dir, "genes.txt"))?;
    write_mtx_csr(&path_knn(), &path(&dir, "knn.mtx.gz"))?;
    let umap = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
    write_dense_tsv(&umap.view(), &path(&dir, "umap.tsv"))?;

    let files = StoreFiles {
        x: path(&dir, "x.tsv.gz"),
        cells: path(&dir, "cells.txt"),
        genes: path(&dir, "genes.txt"),
        obsp: vec![("connectivities".into(), path(&dir, "knn.mtx.gz"))],
        obsm: vec![("X_umap".into(), path(&dir, "umap.tsv"))],
        ..Default::default()
    };
    let mut store = load_store(&files)?;

    let mut kernel = ConnectivityKernel::new(&store, None, true, &logger)?;
    assert_eq!(kernel.backward(), None);
    assert_eq!(kernel.default_key(), "T_fwd");

    // degrees [1, 2, 2, 1]
    let tmat = kernel.compute_transition_matrix(true)?;
    assert_abs_diff_eq!(entry(tmat, 0, 1), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(entry(tmat, 1, 0), 2.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(entry(tmat, 1, 2), 1.0 / 3.0, epsilon = 1e-12);
    assert!(kernel.compute_cond_num()?.is_finite());

    kernel.write_to_store(&mut store, None)?;
    assert_eq!(store.uns()["T_fwd_params"]["dnorm"], true);
    assert!(store.uns()["T_fwd_params"]["backward"].is_null());

    let key = project(&kernel, &mut store, "umap", None, false, &logger)?;
    assert_eq!(key, "T_fwd_umap");
    let proj = store.obsm(&key)?;
    assert_abs_diff_eq!(proj[[0, 0]], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(proj[[1, 0]], -1.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(proj[[1, 1]], 0.0, epsilon = 1e-12);

    // a second projection under the same key is not recorded twice
    project(&kernel, &mut store, "X_umap", None, true, &logger)?;
    assert_eq!(
        store.uns()["T_fwd_params"]["embeddings"],
        serde_json::json!(["umap"])
    );

    write_mtx_csr(store.obsp("T_fwd")?, &path(&dir, "out.T_fwd.mtx.gz"))?;
    write_frame(store.obs(), &path(&dir, "out.obs.tsv.gz"))?;
    write_uns(store.uns(), &path(&dir, "out.params.json"))?;

    let reread = read_mtx_csr(&path(&dir, "out.T_fwd.mtx.gz"))?;
    assert_eq!(reread.nnz(), 6);
    assert_abs_diff_eq!(entry(&reread, 2, 3), 2.0 / 3.0, epsilon = 1e-9);

    let json = read_lines(&path(&dir, "out.params.json"))?.join("\n");
    let uns: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(uns["T_fwd_params"]["conn_key"], "connectivities");
    Ok(())
}
