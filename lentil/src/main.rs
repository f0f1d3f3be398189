mod common;
mod run_connectivity;
mod run_cytotrace;

use crate::run_connectivity::*;
use crate::run_cytotrace::*;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LENTIL",
    long_about = "Lineage kErNel Transitions In Latent time\n\
		  Transition matrices over kNN graphs of single cells.\n\
		  Expression data in `.mtx[.gz]` or dense `.tsv[.gz]` with\n\
		  one-name-per-line cell and gene files."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Direct the kNN graph by the CytoTRACE pseudotime",
        long_about = "Estimate differentiation potential by CytoTRACE in three stages:\n\
		      (1) Correlate genes with the number of genes expressed per cell\n\
		      (2) Aggregate the top correlated genes into a score\n\
		      (3) Bias the kNN graph along the pseudotime `1 - score`.\n"
    )]
    Cytotrace(CytoTraceArgs),

    /// Random walk on the (density normalized) kNN graph
    Connectivity(ConnectivityArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.commands {
        Commands::Cytotrace(args) => {
            run_cytotrace(args)?;
        }
        Commands::Connectivity(args) => {
            run_connectivity(args)?;
        }
    }

    Ok(())
}
