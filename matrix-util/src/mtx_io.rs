use crate::common_io::*;
use crate::traits::MatTriplets;
use nalgebra_sparse::CsrMatrix;
use std::io::Write;

/// Write a sparse matrix into a MatrixMarket file with 1-based indices
/// * `mat` - CSR matrix (e.g., a transition matrix)
/// * `mtx_file` - the output file (e.g., "matrix.mtx.gz")
pub fn write_mtx_csr(mat: &CsrMatrix<f64>, mtx_file: &str) -> anyhow::Result<()> {
    let mut buf = open_buf_writer(mtx_file)?;

    writeln!(buf, "%%MatrixMarket matrix coordinate real general")?;
    writeln!(buf, "{}\t{}\t{}", mat.nrows(), mat.ncols(), mat.nnz())?;

    for (row, col, val) in mat.triplet_iter() {
        writeln!(buf, "{}\t{}\t{}", row + 1, col + 1, val)?;
    }

    buf.flush()?;
    Ok(())
}

/// Read a MatrixMarket file and return a vector of 0-based triplets
/// (row, col, val) with the declared shape (nrow, ncol, nnz)
/// * `mtx_file` - Path to the matrix market file
pub fn read_mtx_triplets(
    mtx_file: &str,
) -> anyhow::Result<(Vec<(usize, usize, f64)>, (usize, usize, usize))> {
    let (lines, hdr) = read_lines_of_words(mtx_file, 0)?;

    if hdr.len() != 3 {
        anyhow::bail!("failed to parse mtx header in {}", mtx_file);
    }

    let nrow = hdr[0].parse::<usize>()?;
    let ncol = hdr[1].parse::<usize>()?;
    let nnz = hdr[2].parse::<usize>()?;

    fn parse_row_col_val(triplet: &[Box<str>]) -> Option<(usize, usize, f64)> {
        if triplet.len() != 3 {
            return None;
        }
        let row = triplet[0].parse::<usize>().ok()?.checked_sub(1)?;
        let col = triplet[1].parse::<usize>().ok()?.checked_sub(1)?;
        let val = triplet[2].parse::<f64>().ok()?;
        Some((row, col, val))
    }

    let triplets: Vec<_> = lines
        .iter()
        .filter_map(|words| parse_row_col_val(words))
        .collect();

    if triplets.len() != nnz {
        log::warn!(
            "{}: header declares {} non-zeros, but {} were parsed",
            mtx_file,
            nnz,
            triplets.len()
        );
    }

    Ok((triplets, (nrow, ncol, nnz)))
}

/// Read a MatrixMarket file into a CSR matrix (duplicates are summed)
pub fn read_mtx_csr(mtx_file: &str) -> anyhow::Result<CsrMatrix<f64>> {
    let (triplets, (nrow, ncol, _)) = read_mtx_triplets(mtx_file)?;
    CsrMatrix::<f64>::from_nonzero_triplets(nrow, ncol, triplets)
}
