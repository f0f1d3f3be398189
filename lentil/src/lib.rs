pub mod aggregation; // mean/median/gmean/hmean over cell rows
pub mod correlation; // gene-vs-covariate correlation test
pub mod error;
pub mod keys; // names of persisted results
pub mod kernels;
pub mod logging;
pub mod model_spec; // wildcard resolution of per-key settings
pub mod parallel; // chunked fan-out with a progress bar

pub use aggregation::Aggregation;
pub use error::{KernelError, Result};
pub use kernels::capability::{Connectivity, Direction, GraphDiagnostics, Invertible};
pub use kernels::connectivity_kernel::ConnectivityKernel;
pub use kernels::cytotrace_kernel::{CytoTraceKernel, CytoTraceParams};
pub use kernels::pseudotime_kernel::PseudotimeKernel;
pub use kernels::threshold_scheme::ThresholdScheme;
pub use kernels::Kernel;
pub use logging::{LogConfig, Logger, Verbosity};
