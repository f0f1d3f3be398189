use crate::common_io::{read_lines_of_words, write_lines};
use ndarray::prelude::*;

/// Read a whitespace-delimited dense matrix, one row per line
/// * `tsv_file` - file name--either gzipped or not
/// * `skip` - header line to skip, if any
pub fn read_dense_tsv(tsv_file: &str, skip: Option<usize>) -> anyhow::Result<Array2<f64>> {
    let hdr_line = skip.map(|s| s as i64).unwrap_or(-1);
    let (lines_of_words, _) = read_lines_of_words(tsv_file, hdr_line)?;

    let lines_of_words: Vec<_> = lines_of_words.into_iter().filter(|w| !w.is_empty()).collect();

    if lines_of_words.is_empty() {
        anyhow::bail!("no data in {}", tsv_file);
    }

    let nrows = lines_of_words.len();
    let ncols = lines_of_words[0].len();

    let mut data = Vec::with_capacity(nrows * ncols);
    for (i, words) in lines_of_words.iter().enumerate() {
        if words.len() != ncols {
            anyhow::bail!(
                "{}: line {} has {} fields, expected {}",
                tsv_file,
                i + 1,
                words.len(),
                ncols
            );
        }
        for w in words {
            data.push(w.parse::<f64>()?);
        }
    }

    Ok(Array2::from_shape_vec((nrows, ncols), data)?)
}

/// Write a dense matrix as tab-separated lines
pub fn write_dense_tsv(mat: &ArrayView2<f64>, tsv_file: &str) -> anyhow::Result<()> {
    let lines: Vec<Box<str>> = mat
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|x| format!("{}", *x))
                .collect::<Vec<String>>()
                .join("\t")
                .into_boxed_str()
        })
        .collect();
    write_lines(&lines, tsv_file)
}
