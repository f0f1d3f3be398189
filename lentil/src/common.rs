use anno_beans::io::{load_store, write_frame, write_uns, StoreFiles};
use anno_beans::AnnoStore;
use clap::{Args, ValueEnum};
use lentil::kernels::projection::project;
use lentil::{Kernel, LogConfig, Logger, ThresholdScheme};
use log::info;
use matrix_util::mtx_io::write_mtx_csr;
use matrix_util::ndarray_io::write_dense_tsv;

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// cell x gene expression: `.mtx[.gz]` (sparse) or a dense
    /// tab-separated matrix
    #[arg(required = true)]
    pub data_file: Box<str>,

    /// cell names, one per line
    #[arg(long, short = 'c', required = true)]
    pub cells: Box<str>,

    /// gene names, one per line
    #[arg(long, short = 'g', required = true)]
    pub genes: Box<str>,

    /// matrix files are stored as gene x cell (e.g., 10x output)
    #[arg(long, default_value_t = false)]
    pub genes_by_cells: bool,

    /// raw expression matrix with the same cells
    #[arg(long)]
    pub raw: Option<Box<str>>,

    /// gene names of the raw matrix (default: `--genes`)
    #[arg(long)]
    pub raw_genes: Option<Box<str>>,

    /// alternative layers as `name=file` (comma-separated), e.g.,
    /// `Ms=imputed.mtx.gz`
    #[arg(long, value_delimiter(','))]
    pub layers: Vec<Box<str>>,

    /// cell x cell kNN connectivities in `.mtx[.gz]`
    #[arg(long, short = 'k', required = true)]
    pub knn: Box<str>,

    /// embeddings as `name=file` (comma-separated), e.g.,
    /// `X_umap=umap.tsv.gz`
    #[arg(long, value_delimiter(','))]
    pub obsm: Vec<Box<str>>,

    /// output header
    #[arg(long, short, required = true)]
    pub out: Box<str>,

    /// more messages (repeat for more)
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// only errors
    #[arg(long, short, default_value_t = false)]
    pub quiet: bool,
}

fn parse_named(spec: &str) -> anyhow::Result<(Box<str>, Box<str>)> {
    match spec.split_once('=') {
        Some((name, file)) if !name.is_empty() && !file.is_empty() => Ok((name.into(), file.into())),
        _ => anyhow::bail!("expected `name=file`, found `{}`", spec),
    }
}

impl InputArgs {
    pub fn log_config(&self) -> LogConfig {
        LogConfig::from_flags(self.verbose, self.quiet)
    }

    pub fn load(&self) -> anyhow::Result<AnnoStore> {
        let raw = self.raw.as_ref().map(|raw| {
            let genes = self.raw_genes.clone().unwrap_or_else(|| self.genes.clone());
            (raw.clone(), genes)
        });

        let files = StoreFiles {
            x: self.data_file.clone(),
            cells: self.cells.clone(),
            genes: self.genes.clone(),
            genes_by_cells: self.genes_by_cells,
            raw,
            layers: self
                .layers
                .iter()
                .map(|s| parse_named(s))
                .collect::<anyhow::Result<Vec<_>>>()?,
            obsp: vec![(lentil::keys::CONNECTIVITIES.into(), self.knn.clone())],
            obsm: self
                .obsm
                .iter()
                .map(|s| parse_named(s))
                .collect::<anyhow::Result<Vec<_>>>()?,
        };

        let store = load_store(&files)?;
        info!(
            "{} cells x {} genes; layers: {:?}",
            store.n_obs(),
            store.n_vars(),
            store.layer_names()
        );
        Ok(store)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[clap(rename_all = "lowercase")]
pub enum SchemeArg {
    Hard,
    Soft,
}

#[derive(Args, Debug, Clone)]
pub struct SchemeArgs {
    /// how edges into the past are treated
    #[arg(long, value_enum, default_value = "hard")]
    pub scheme: SchemeArg,

    /// hard scheme: fraction of the closest neighbours kept
    /// regardless of pseudotime
    #[arg(long, default_value_t = 0.3)]
    pub frac_to_keep: f64,

    /// soft scheme: steepness of the logistic down-weighting
    #[arg(long, default_value_t = 10.0)]
    pub b: f64,

    /// soft scheme: asymmetry of the logistic down-weighting
    #[arg(long, default_value_t = 0.5)]
    pub nu: f64,
}

impl SchemeArgs {
    pub fn scheme(&self) -> ThresholdScheme {
        match self.scheme {
            SchemeArg::Hard => ThresholdScheme::Hard {
                frac_to_keep: self.frac_to_keep,
            },
            SchemeArg::Soft => ThresholdScheme::Soft {
                b: self.b,
                nu: self.nu,
            },
        }
    }
}

/// Write the transition matrix, the frames, `uns` and projections
/// of `kernel` under the `out` header
pub fn write_kernel_outputs<K: Kernel>(
    kernel: &K,
    store: &mut AnnoStore,
    out: &str,
    bases: &[Box<str>],
    logger: &Logger,
) -> anyhow::Result<()> {
    kernel.write_to_store(store, None)?;

    let key = kernel.default_key();
    let tmat_file = format!("{}.{}.mtx.gz", out, key);
    write_mtx_csr(kernel.require_transition_matrix()?, &tmat_file)?;
    info!("wrote transition matrix: {}", tmat_file);

    for basis in bases {
        let obsm_key = project(kernel, store, basis, None, true, logger)?;
        let proj_file = format!("{}.{}.tsv.gz", out, obsm_key);
        write_dense_tsv(&store.obsm(&obsm_key)?.view(), &proj_file)?;
        info!("wrote projection: {}", proj_file);
    }

    write_frame(store.obs(), &format!("{}.obs.tsv.gz", out))?;
    write_frame(store.var(), &format!("{}.var.tsv.gz", out))?;
    write_uns(store.uns(), &format!("{}.params.json", out))?;
    Ok(())
}
