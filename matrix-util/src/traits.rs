use nalgebra_sparse::{CooMatrix, CsrMatrix};
use ndarray::Array2;

/// Convert to and from the vector of triplets
pub trait MatTriplets {
    type Mat;
    type Scalar;

    fn from_nonzero_triplets<I>(
        nrow: usize,
        ncol: usize,
        triplets: Vec<(I, I, Self::Scalar)>,
    ) -> anyhow::Result<Self::Mat>
    where
        I: TryInto<usize> + Copy,
        <I as TryInto<usize>>::Error: std::fmt::Debug;

    fn to_nonzero_triplets(
        &self,
    ) -> anyhow::Result<(usize, usize, Vec<(usize, usize, Self::Scalar)>)>;
}

fn checked_index<I>(nrow: usize, ncol: usize, ii: I, jj: I) -> anyhow::Result<(usize, usize)>
where
    I: TryInto<usize> + Copy,
    <I as TryInto<usize>>::Error: std::fmt::Debug,
{
    let i: usize = ii
        .try_into()
        .map_err(|e| anyhow::anyhow!("invalid row index: {:?}", e))?;
    let j: usize = jj
        .try_into()
        .map_err(|e| anyhow::anyhow!("invalid column index: {:?}", e))?;
    if i >= nrow || j >= ncol {
        anyhow::bail!("triplet ({}, {}) out of bounds for {} x {}", i, j, nrow, ncol);
    }
    Ok((i, j))
}

impl MatTriplets for CsrMatrix<f64> {
    type Mat = Self;
    type Scalar = f64;

    /// Duplicated (row, column) pairs are summed up
    fn from_nonzero_triplets<I>(
        nrow: usize,
        ncol: usize,
        triplets: Vec<(I, I, f64)>,
    ) -> anyhow::Result<Self::Mat>
    where
        I: TryInto<usize> + Copy,
        <I as TryInto<usize>>::Error: std::fmt::Debug,
    {
        let mut coo = CooMatrix::<f64>::new(nrow, ncol);
        for (ii, jj, x_ij) in triplets {
            let (i, j) = checked_index(nrow, ncol, ii, jj)?;
            coo.push(i, j, x_ij);
        }
        Ok(CsrMatrix::from(&coo))
    }

    fn to_nonzero_triplets(&self) -> anyhow::Result<(usize, usize, Vec<(usize, usize, f64)>)> {
        Ok((
            self.nrows(),
            self.ncols(),
            self.triplet_iter()
                .filter(|&(_, _, &x)| x != 0.0)
                .map(|(i, j, &x)| (i, j, x))
                .collect(),
        ))
    }
}

impl MatTriplets for Array2<f64> {
    type Mat = Self;
    type Scalar = f64;

    fn from_nonzero_triplets<I>(
        nrow: usize,
        ncol: usize,
        triplets: Vec<(I, I, f64)>,
    ) -> anyhow::Result<Self::Mat>
    where
        I: TryInto<usize> + Copy,
        <I as TryInto<usize>>::Error: std::fmt::Debug,
    {
        let mut array = Array2::<f64>::zeros((nrow, ncol));
        for (ii, jj, x_ij) in triplets {
            let (i, j) = checked_index(nrow, ncol, ii, jj)?;
            array[(i, j)] += x_ij;
        }
        Ok(array)
    }

    fn to_nonzero_triplets(&self) -> anyhow::Result<(usize, usize, Vec<(usize, usize, f64)>)> {
        let (rows, cols) = self.dim();
        Ok((
            rows,
            cols,
            self.indexed_iter()
                .filter(|&(_, &x)| x != 0.0)
                .map(|((i, j), &x)| (i, j, x))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_triplets_sum_duplicates() {
        let csr =
            CsrMatrix::<f64>::from_nonzero_triplets(2, 3, vec![(0, 1, 1.0), (0, 1, 2.0), (1, 2, 4.0)])
                .unwrap();
        let (nrow, ncol, triplets) = csr.to_nonzero_triplets().unwrap();
        assert_eq!((nrow, ncol), (2, 3));
        assert_eq!(triplets, vec![(0, 1, 3.0), (1, 2, 4.0)]);
    }

    #[test]
    fn test_out_of_bounds_triplet() {
        let res = Array2::<f64>::from_nonzero_triplets(2, 2, vec![(2_usize, 0_usize, 1.0)]);
        assert!(res.is_err());
    }
}
