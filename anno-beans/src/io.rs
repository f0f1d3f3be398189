use crate::expr_matrix::ExprMatrix;
use crate::frame::Frame;
use crate::store::AnnoStore;

use log::info;
use matrix_util::common_io::{open_buf_writer, read_names, write_lines};
use matrix_util::mtx_io::read_mtx_csr;
use matrix_util::ndarray_io::read_dense_tsv;
use serde_json::{Map, Value};
use std::io::Write;

/// Files that make up an `AnnoStore`
#[derive(Debug, Clone, Default)]
pub struct StoreFiles {
    /// primary matrix: `.mtx[.gz]` (sparse) or a dense TSV
    pub x: Box<str>,
    /// one cell name per line
    pub cells: Box<str>,
    /// one gene name per line
    pub genes: Box<str>,
    /// matrix files are stored as gene x cell (e.g., 10x output)
    pub genes_by_cells: bool,
    /// raw matrix and its gene names
    pub raw: Option<(Box<str>, Box<str>)>,
    /// (name, file) pairs of layers
    pub layers: Vec<(Box<str>, Box<str>)>,
    /// (key, file) pairs of cell x cell sparse matrices
    pub obsp: Vec<(Box<str>, Box<str>)>,
    /// (key, file) pairs of dense cell embeddings
    pub obsm: Vec<(Box<str>, Box<str>)>,
}

fn is_mtx(file: &str) -> bool {
    file.ends_with(".mtx") || file.ends_with(".mtx.gz")
}

/// Read an expression matrix so that rows are cells
pub fn read_expr_matrix(file: &str, genes_by_cells: bool) -> anyhow::Result<ExprMatrix> {
    let mat = if is_mtx(file) {
        let csr = read_mtx_csr(file)?;
        ExprMatrix::Sparse(if genes_by_cells { csr.transpose() } else { csr })
    } else {
        let dense = read_dense_tsv(file, None)?;
        ExprMatrix::Dense(if genes_by_cells {
            dense.reversed_axes()
        } else {
            dense
        })
    };
    info!("read {} x {} matrix from {}", mat.nrows(), mat.ncols(), file);
    Ok(mat)
}

/// Assemble a store from its files
pub fn load_store(files: &StoreFiles) -> anyhow::Result<AnnoStore> {
    let x = read_expr_matrix(&files.x, files.genes_by_cells)?;
    let cells = read_names(&files.cells)?;
    let genes = read_names(&files.genes)?;

    let mut store = AnnoStore::new(x, cells, genes)?;

    if let Some((raw_file, raw_genes)) = &files.raw {
        let raw = read_expr_matrix(raw_file, files.genes_by_cells)?;
        store.set_raw(raw, read_names(raw_genes)?)?;
    }

    for (name, file) in files.layers.iter() {
        store.add_layer(name, read_expr_matrix(file, files.genes_by_cells)?)?;
    }

    for (key, file) in files.obsp.iter() {
        store.add_obsp(key, read_mtx_csr(file)?)?;
    }

    for (key, file) in files.obsm.iter() {
        store.add_obsm(key, read_dense_tsv(file, None)?)?;
    }

    Ok(store)
}

/// Write a frame as a tab-separated table (gzipped if `.gz`)
pub fn write_frame(frame: &Frame, file: &str) -> anyhow::Result<()> {
    write_lines(&frame.to_tsv_lines(), file)
}

/// Write unstructured parameters as pretty JSON
pub fn write_uns(uns: &Map<String, Value>, file: &str) -> anyhow::Result<()> {
    let mut buf = open_buf_writer(file)?;
    serde_json::to_writer_pretty(&mut buf, uns)?;
    writeln!(buf)?;
    buf.flush()?;
    Ok(())
}
