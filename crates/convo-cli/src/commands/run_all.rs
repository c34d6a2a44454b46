//! Run-all command
//!
//! Applies every standard filter to a fresh copy of the input and prints the
//! time each one took.

use crate::RunAllArgs;
#[allow(unused_imports)]
use tracing::{debug, info, trace};
use anyhow::{Context, Result};
use convo_core::timing::{Stopwatch, format_ms};
use convo_core::{FilterCatalog, STANDARD_FILTERS};

use super::EngineOptions;

pub fn run(args: RunAllArgs, opts: &EngineOptions, verbose: bool) -> Result<()> {
    trace!(input = %args.input.display(), "run_all::run");

    let catalog = FilterCatalog::standard();
    let engine = super::build_engine(opts)?;
    let image = super::load_image(&args.input)?;

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    info!(
        filters = STANDARD_FILTERS.len(),
        width = image.width(),
        height = image.height(),
        backend = engine.backend_name(),
        "Running all filters"
    );

    for name in STANDARD_FILTERS {
        let kernel = catalog.kernel(name)?;

        let watch = Stopwatch::start(name);
        let output = engine
            .apply(&image, kernel)
            .with_context(|| format!("Failed to apply {name}"))?;
        let elapsed = watch.finish();
        println!("Duration for {name} [ms]: {}", format_ms(elapsed));

        let path = super::filtered_path(&args.input, args.out_dir.as_deref(), name);
        super::save_image(&path, &output)?;
        debug!(filter = name, path = %path.display(), "saved");
        if verbose {
            println!("  -> {}", path.display());
        }
    }

    Ok(())
}
