use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use rstsr_rccsd::prelude::*;
use rstsr_rccsd::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct CliParser {
    #[clap(subcommand)]
    command: Command,
}

/// Overrides applied on top of the configuration file.
#[derive(Args, Debug)]
struct CliConfig {
    #[clap(short, long, help = "Path to a JSON file with solver configuration")]
    config: Option<String>,

    #[clap(long, help = "Override maximum number of coupled iterations")]
    max_cycle: Option<usize>,

    #[clap(long, help = "Override energy convergence threshold")]
    conv_tol_e: Option<f64>,

    #[clap(long, help = "Override amplitude rms convergence threshold")]
    conv_tol_rms: Option<f64>,

    #[clap(long, help = "Override damping ratio in [0, 1)")]
    damping: Option<f64>,

    #[clap(long, help = "Disable DIIS acceleration")]
    no_diis: bool,

    #[clap(long, help = "Pre-converge singles with doubles held fixed")]
    t1_preconverge: bool,

    #[clap(long, help = "Override number of frozen occupied orbitals")]
    frozen_occ: Option<usize>,

    #[clap(long, help = "Override number of frozen virtual orbitals")]
    frozen_vir: Option<usize>,
}

impl CliConfig {
    fn to_ccsd_config(&self) -> Result<CCSDConfig> {
        let mut cc_config = match &self.config {
            Some(path) => {
                let content = std::fs::read_to_string(path).wrap_err_with(|| format!("reading {path}"))?;
                CCSDConfig::from_json(&content)?
            },
            None => CCSDConfig::default(),
        };
        if let Some(max_cycle) = self.max_cycle {
            cc_config.max_cycle = max_cycle;
        }
        if let Some(conv_tol_e) = self.conv_tol_e {
            cc_config.conv_tol_e = conv_tol_e;
        }
        if let Some(conv_tol_rms) = self.conv_tol_rms {
            cc_config.conv_tol_rms = conv_tol_rms;
        }
        if let Some(damping) = self.damping {
            cc_config.damping = damping;
        }
        if let Some(frozen_occ) = self.frozen_occ {
            cc_config.frozen_occ = frozen_occ;
        }
        if let Some(frozen_vir) = self.frozen_vir {
            cc_config.frozen_vir = frozen_vir;
        }
        cc_config.diis &= !self.no_diis;
        cc_config.t1_preconverge |= self.t1_preconverge;
        cc_config.check()?;
        Ok(cc_config)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    #[clap(name = "run", about = "Run RCCSD on integrals stored as .npy files")]
    Run {
        #[clap(short, long, help = "Directory holding foo.npy, fov.npy, fvv.npy, oooo.npy, ..., vvvv.npy")]
        dir: String,

        #[clap(long, default_value_t = 0.0, help = "Reference (mean-field) total energy")]
        e_ref: f64,

        #[clap(flatten)]
        cli_config: CliConfig,
    },

    #[clap(name = "synthetic", about = "Run RCCSD on a deterministic model system")]
    Synthetic {
        #[clap(long, default_value_t = 3)]
        nocc: usize,

        #[clap(long, default_value_t = 5)]
        nvir: usize,

        #[clap(long, default_value_t = 0.1, help = "Scale of the two-electron integrals")]
        coupling: f64,

        #[clap(long, default_value_t = 0.02, help = "Scale of the off-diagonal Fock elements")]
        fock_offdiag: f64,

        #[clap(flatten)]
        cli_config: CliConfig,
    },
}

fn report(results: &RCCSDResults) {
    for diagnostic in &results.diagnostics {
        info!("Diagnostic: {diagnostic:?}");
    }
    println!("Converged: {}", results.converged);
    println!("Iterations: {} (T1 pre-convergence: {})", results.niter, results.niter_t1);
    if results.niter_t1 > 0 {
        println!("T1 pre-convergence converged: {}", results.converged_t1);
    }
    println!("CCSD Corr Energy: {:.12}", results.e_corr);
    println!("CCSD Total Energy: {:.12}", results.e_tot);
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = CliParser::parse();

    match args.command {
        Command::Run { dir, e_ref, cli_config } => {
            let cc_config = cli_config.to_ccsd_config()?;
            let time = std::time::Instant::now();
            let mol_info = util::rccsd_info_from_npy_dir(&dir, e_ref).wrap_err_with(|| format!("loading {dir}"))?;
            info!("Time elapsed (reading integrals): {:.3?}", time.elapsed());
            let results = rccsd_iteration(&mol_info, &cc_config, None)?;
            report(&results);
        },
        Command::Synthetic { nocc, nvir, coupling, fock_offdiag, cli_config } => {
            let cc_config = cli_config.to_ccsd_config()?;
            let mol_info = synthetic::synthetic_system(nocc, nvir, coupling, fock_offdiag).to_rccsd_info();
            let results = rccsd_iteration(&mol_info, &cc_config, None)?;
            report(&results);
        },
    }
    Ok(())
}
