use crate::common::*;

use clap::Parser;
use lentil::kernels::cytotrace_kernel::{CytoTraceKernel, CytoTraceParams};
use lentil::logging::init_logging;
use lentil::{Aggregation, Kernel};
use log::info;

#[derive(Parser, Debug, Clone)]
pub struct CytoTraceArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// layer aggregated into the score (`X` for the primary matrix)
    #[arg(long, default_value = "X")]
    pub layer: Box<str>,

    /// how expression of the top correlated genes is aggregated
    #[arg(long, value_enum, default_value = "mean")]
    pub aggregation: Aggregation,

    /// count expressed genes and correlate on the raw matrix
    #[arg(long, default_value_t = false)]
    pub use_raw: bool,

    /// number of positively correlated genes
    #[arg(long, default_value_t = 200)]
    pub n_pos_genes: usize,

    /// number of negatively correlated genes (none if unset)
    #[arg(long)]
    pub n_neg_genes: Option<usize>,

    #[command(flatten)]
    pub scheme: SchemeArgs,

    /// reverse the pseudotime
    #[arg(long, default_value_t = false)]
    pub backward: bool,

    /// density normalize by the kNN degree
    #[arg(long, default_value_t = false)]
    pub density_normalize: bool,

    /// check if the kNN graph is connected
    #[arg(long, default_value_t = false)]
    pub check_connectivity: bool,

    /// report the condition number of the transition matrix
    #[arg(long, default_value_t = false)]
    pub cond_num: bool,

    /// embeddings to project the transition matrix onto
    /// (comma-separated `obsm` names)
    #[arg(long, value_delimiter(','))]
    pub project: Vec<Box<str>>,

    /// number of threads for the correlation test (all cores if unset)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
}

/// Score cells by CytoTRACE and direct the kNN graph along it
pub fn run_cytotrace(args: CytoTraceArgs) -> anyhow::Result<()> {
    let log_config = args.input.log_config();
    init_logging(&log_config)?;
    let logger = log_config.logger("lentil::cytotrace");

    let mut store = args.input.load()?;

    let params = CytoTraceParams {
        layer: Some(args.layer.clone()),
        aggregation: args.aggregation,
        use_raw: args.use_raw,
        n_pos_genes: args.n_pos_genes,
        n_neg_genes: args.n_neg_genes,
        n_jobs: args.jobs,
    };

    let mut kernel = CytoTraceKernel::new(
        &mut store,
        &params,
        args.backward,
        None,
        args.check_connectivity,
        &logger,
    )?;

    kernel.compute_transition_matrix(args.scheme.scheme(), args.density_normalize)?;

    if args.cond_num {
        let cond = kernel.compute_cond_num()?;
        info!("condition number: {:.3e}", cond);
    }

    write_kernel_outputs(&kernel, &mut store, &args.input.out, &args.project, &logger)?;

    info!("done");
    Ok(())
}
