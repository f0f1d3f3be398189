pub mod expr_matrix; // dense or sparse cell x gene matrix
pub mod frame; // named per-cell and per-gene columns
pub mod io; // loading from MatrixMarket/TSV files and writing frames
pub mod store; // the annotated store itself

pub use expr_matrix::ExprMatrix;
pub use frame::{Column, Frame};
pub use store::{AnnoStore, RawData, StoreError};
