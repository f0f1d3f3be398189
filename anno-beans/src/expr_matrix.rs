use crate::store::StoreError;
use matrix_util::row_stat::{csr_select_columns, csr_to_dense};
use nalgebra_sparse::CsrMatrix;
use ndarray::{Array2, Axis};

/// Cell x gene expression, either dense or compressed by rows
#[derive(Clone, Debug, PartialEq)]
pub enum ExprMatrix {
    Dense(Array2<f64>),
    Sparse(CsrMatrix<f64>),
}

impl From<Array2<f64>> for ExprMatrix {
    fn from(mat: Array2<f64>) -> Self {
        ExprMatrix::Dense(mat)
    }
}

impl From<CsrMatrix<f64>> for ExprMatrix {
    fn from(mat: CsrMatrix<f64>) -> Self {
        ExprMatrix::Sparse(mat)
    }
}

impl ExprMatrix {
    pub fn nrows(&self) -> usize {
        match self {
            ExprMatrix::Dense(x) => x.nrows(),
            ExprMatrix::Sparse(x) => x.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            ExprMatrix::Dense(x) => x.ncols(),
            ExprMatrix::Sparse(x) => x.ncols(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, ExprMatrix::Sparse(_))
    }

    /// Number of strictly positive entries in each row, e.g., the
    /// number of genes expressed per cell
    pub fn count_positive_per_row(&self) -> Vec<usize> {
        match self {
            ExprMatrix::Dense(x) => x
                .rows()
                .into_iter()
                .map(|row| row.iter().filter(|&&v| v > 0.0).count())
                .collect(),
            ExprMatrix::Sparse(x) => x
                .row_iter()
                .map(|row| row.values().iter().filter(|&&v| v > 0.0).count())
                .collect(),
        }
    }

    /// Visit the non-zero entries of row `i` as (column indices, values)
    pub fn visit_row<F>(&self, i: usize, mut visitor: F)
    where
        F: FnMut(&[usize], &[f64]),
    {
        match self {
            ExprMatrix::Dense(x) => {
                let (indices, values): (Vec<usize>, Vec<f64>) = x
                    .row(i)
                    .iter()
                    .enumerate()
                    .filter(|&(_, &v)| v != 0.0)
                    .map(|(j, &v)| (j, v))
                    .unzip();
                visitor(&indices, &values);
            }
            ExprMatrix::Sparse(x) => {
                let row = x.row(i);
                visitor(row.col_indices(), row.values());
            }
        }
    }

    /// Subset of columns, kept in the given order and storage type
    pub fn select_columns(&self, columns: &[usize]) -> Result<ExprMatrix, StoreError> {
        let ncols = self.ncols();
        if let Some(&j) = columns.iter().find(|&&j| j >= ncols) {
            return Err(StoreError::IndexOutOfBounds {
                index: j,
                len: ncols,
            });
        }
        Ok(match self {
            ExprMatrix::Dense(x) => ExprMatrix::Dense(x.select(Axis(1), columns)),
            ExprMatrix::Sparse(x) => ExprMatrix::Sparse(
                csr_select_columns(x, columns)
                    .map_err(|e| StoreError::Invalid(e.to_string().into_boxed_str()))?,
            ),
        })
    }

    /// Dense copy
    pub fn to_dense(&self) -> Array2<f64> {
        match self {
            ExprMatrix::Dense(x) => x.clone(),
            ExprMatrix::Sparse(x) => csr_to_dense(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_util::traits::MatTriplets;
    use ndarray::array;

    fn dense_and_sparse() -> (ExprMatrix, ExprMatrix) {
        let dense = array![[0.0, 1.0, 2.0], [3.0, 0.0, 0.0]];
        let (nr, nc, triplets) = dense.to_nonzero_triplets().unwrap();
        let sparse = CsrMatrix::<f64>::from_nonzero_triplets(nr, nc, triplets).unwrap();
        (dense.into(), sparse.into())
    }

    #[test]
    fn test_count_positive_per_row() {
        let (dense, sparse) = dense_and_sparse();
        assert_eq!(dense.count_positive_per_row(), vec![2, 1]);
        assert_eq!(sparse.count_positive_per_row(), vec![2, 1]);
    }

    #[test]
    fn test_visit_row_agrees() {
        let (dense, sparse) = dense_and_sparse();
        let mut from_dense = vec![];
        let mut from_sparse = vec![];
        dense.visit_row(0, |idx, val| from_dense.push((idx.to_vec(), val.to_vec())));
        sparse.visit_row(0, |idx, val| from_sparse.push((idx.to_vec(), val.to_vec())));
        assert_eq!(from_dense, from_sparse);
        assert_eq!(from_dense[0], (vec![1, 2], vec![1.0, 2.0]));
    }

    #[test]
    fn test_select_columns() {
        let (dense, sparse) = dense_and_sparse();
        let expected = array![[2.0, 0.0], [0.0, 3.0]];
        assert_eq!(dense.select_columns(&[2, 0]).unwrap().to_dense(), expected);
        assert_eq!(sparse.select_columns(&[2, 0]).unwrap().to_dense(), expected);
        assert!(dense.select_columns(&[5]).is_err());
    }
}
