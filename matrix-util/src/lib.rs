pub mod common_io; // gzip-aware line readers and writers
pub mod mtx_io; // MatrixMarket triplets <-> CSR
pub mod ndarray_io; // dense TSV matrices
pub mod row_stat; // row-wise aggregations of dense and sparse rows
pub mod sparse_graph; // symmetry, connectivity, degree scaling of kNN graphs
pub mod sparse_stat; // running statistics over sparse rows
pub mod traits;
pub mod utils;
