//! convo - apply convolution filters to images
//!
//! Thin driver over `convo-compute`: load, convolve, save, report timings.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use convo_compute::Backend;

mod commands;

#[derive(Parser)]
#[command(name = "convo")]
#[command(author, version, about = "Convolution filters on the CPU or GPU")]
#[command(long_about = "
Applies square convolution kernels to 8-bit RGB/RGBA images.
Border pixels closer to the edge than the kernel margin are left unchanged.

Examples:
  convo apply photo.png -o edges.png -f edge-detect
  convo apply photo.png -o soft.png -f gaussian --backend wgpu
  convo run-all photo.png --out-dir out/      # every standard filter, timed
  convo filters                               # list kernels
  convo backends                              # list compute backends
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of worker threads for the CPU backend (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Compute backend: auto, sequential, cpu, wgpu, cuda
    #[arg(long, global = true, env = "CONVO_BACKEND", default_value = "auto")]
    backend: Backend,

    /// Fail on images too small for the kernel instead of copying them
    #[arg(long, global = true)]
    reject_undersized: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one filter to an image
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// Apply every standard filter and report timings
    #[command(name = "run-all")]
    RunAll(RunAllArgs),

    /// List available filters
    Filters,

    /// List compute backends
    Backends,
}

/// Arguments for the `apply` command.
#[derive(Args)]
struct ApplyArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Filter name (see `convo filters`)
    #[arg(short, long)]
    filter: String,

    /// Quality (1-100, for JPEG output)
    #[arg(short = 'q', long)]
    quality: Option<u8>,
}

/// Arguments for the `run-all` command.
#[derive(Args)]
struct RunAllArgs {
    /// Input image
    input: PathBuf,

    /// Directory for the filtered images (default: next to the input)
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let opts = commands::EngineOptions {
        backend: cli.backend,
        threads: cli.threads,
        reject_undersized: cli.reject_undersized,
    };

    match cli.command {
        Commands::Apply(args) => commands::apply::run(args, &opts, cli.verbose),
        Commands::RunAll(args) => commands::run_all::run(args, &opts, cli.verbose),
        Commands::Filters => commands::filters::run(cli.verbose),
        Commands::Backends => commands::backends::run(),
    }
}
