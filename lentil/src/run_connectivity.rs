use crate::common::*;

use clap::Parser;
use lentil::logging::init_logging;
use lentil::{ConnectivityKernel, Kernel};
use log::info;

#[derive(Parser, Debug, Clone)]
pub struct ConnectivityArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// density normalize by the kNN degree
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
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
}

/// Random walk on the kNN graph
pub fn run_connectivity(args: ConnectivityArgs) -> anyhow::Result<()> {
    let log_config = args.input.log_config();
    init_logging(&log_config)?;
    let logger = log_config.logger("lentil::connectivity");

    let mut store = args.input.load()?;

    let mut kernel = ConnectivityKernel::new(&store, None, args.check_connectivity, &logger)?;
    kernel.compute_transition_matrix(args.density_normalize)?;

    if args.cond_num {
        let cond = kernel.compute_cond_num()?;
        info!("condition number: {:.3e}", cond);
    }

    write_kernel_outputs(&kernel, &mut store, &args.input.out, &args.project, &logger)?;

    info!("done");
    Ok(())
}
