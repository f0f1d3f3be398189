use crate::error::KernelError;

use anno_beans::ExprMatrix;
use clap::ValueEnum;
use matrix_util::row_stat::*;
use std::fmt;
use std::str::FromStr;

/// How expression of the selected genes is summarized per cell
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[clap(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Median,
    Gmean,
    Hmean,
}

impl Aggregation {
    pub const VALID: [&'static str; 4] = ["mean", "median", "gmean", "hmean"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
            Aggregation::Gmean => "gmean",
            Aggregation::Hmean => "hmean",
        }
    }

    /// Summarize each row (cell) of `mat`.
    ///
    /// Mean and median read sparse rows directly; the geometric and
    /// harmonic means need every zero, so sparse input is densified.
    pub fn aggregate(&self, mat: &ExprMatrix) -> Vec<f64> {
        match (self, mat) {
            (Aggregation::Mean, ExprMatrix::Sparse(x)) => csr_row_mean(x),
            (Aggregation::Median, ExprMatrix::Sparse(x)) => csr_row_median(x),
            (Aggregation::Mean, ExprMatrix::Dense(x)) => dense_rows_apply(&x.view(), mean),
            (Aggregation::Median, ExprMatrix::Dense(x)) => dense_rows_apply(&x.view(), median),
            (Aggregation::Gmean, ExprMatrix::Dense(x)) => dense_rows_apply(&x.view(), gmean),
            (Aggregation::Hmean, ExprMatrix::Dense(x)) => dense_rows_apply(&x.view(), hmean),
            (Aggregation::Gmean, ExprMatrix::Sparse(x)) => {
                dense_rows_apply(&csr_to_dense(x).view(), gmean)
            }
            (Aggregation::Hmean, ExprMatrix::Sparse(x)) => {
                dense_rows_apply(&csr_to_dense(x).view(), hmean)
            }
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            "gmean" => Ok(Aggregation::Gmean),
            "hmean" => Ok(Aggregation::Hmean),
            _ => Err(KernelError::InvalidEnum {
                name: "aggregation",
                value: s.into(),
                valid: Aggregation::VALID.to_vec(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use matrix_util::traits::MatTriplets;
    use nalgebra_sparse::CsrMatrix;
    use ndarray::array;

    fn dense_and_sparse() -> (ExprMatrix, ExprMatrix) {
        let dense = array![[0.0, 1.0, 2.0, 5.0], [3.0, 0.0, 0.0, 0.0], [1.0, 2.0, 4.0, 8.0]];
        let (nr, nc, triplets) = dense.to_nonzero_triplets().unwrap();
        let sparse = CsrMatrix::<f64>::from_nonzero_triplets(nr, nc, triplets).unwrap();
        (dense.into(), sparse.into())
    }

    #[test]
    fn test_dense_and_sparse_agree() {
        let (dense, sparse) = dense_and_sparse();
        for agg in [
            Aggregation::Mean,
            Aggregation::Median,
            Aggregation::Gmean,
            Aggregation::Hmean,
        ] {
            let a = agg.aggregate(&dense);
            let b = agg.aggregate(&sparse);
            for (x, y) in a.iter().zip(b.iter()) {
                assert_abs_diff_eq!(x, y, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_row_summaries() {
        let (dense, _) = dense_and_sparse();
        assert_eq!(Aggregation::Mean.aggregate(&dense), vec![2.0, 0.75, 3.75]);
        assert_eq!(Aggregation::Median.aggregate(&dense), vec![1.5, 0.0, 3.0]);
        let g = Aggregation::Gmean.aggregate(&dense);
        assert_eq!(g[0], 0.0);
        assert_abs_diff_eq!(g[2], 64f64.powf(0.25), epsilon = 1e-12);
    }

    #[test]
    fn test_parse() {
        assert_eq!("hmean".parse::<Aggregation>().unwrap(), Aggregation::Hmean);
        let err = "mode".parse::<Aggregation>().unwrap_err();
        assert!(matches!(err, KernelError::InvalidEnum { .. }));
        assert!(err.to_string().contains("mean, median, gmean, hmean"));
    }
}
