//! Apply command
//!
//! Loads an image, convolves it with one catalog filter and saves the result.

use crate::ApplyArgs;
#[allow(unused_imports)]
use tracing::{debug, info, trace};
use anyhow::{Context, Result};
use convo_core::FilterCatalog;
use convo_core::timing::{Stopwatch, format_ms};
use convo_io::WriteOptions;

use super::EngineOptions;

pub fn run(args: ApplyArgs, opts: &EngineOptions, verbose: bool) -> Result<()> {
    trace!(input = %args.input.display(), filter = %args.filter, "apply::run");

    let catalog = FilterCatalog::standard();
    let kernel = catalog.kernel(&args.filter)?;
    let engine = super::build_engine(opts)?;

    let image = super::load_image(&args.input)?;
    info!(
        filter = %args.filter,
        width = image.width(),
        height = image.height(),
        backend = engine.backend_name(),
        "Applying filter"
    );

    let watch = Stopwatch::start(args.filter.as_str());
    let output = engine
        .apply(&image, kernel)
        .with_context(|| format!("Failed to apply {}", args.filter))?;
    let elapsed = watch.finish();

    match args.quality {
        Some(q) => {
            let options = WriteOptions { jpeg_quality: q };
            convo_io::write_with_options(&args.output, &output, &options)
                .with_context(|| format!("Failed to save: {}", args.output.display()))?;
        }
        None => super::save_image(&args.output, &output)?,
    }

    if verbose {
        println!("Wrote {}", args.output.display());
    }
    println!("Duration for {} [ms]: {}", args.filter, format_ms(elapsed));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_compute::{Backend, ConvolutionEngine};
    use convo_core::PixelBuffer;
    use std::path::Path;

    fn opts() -> EngineOptions {
        EngineOptions { backend: Backend::Cpu, threads: 2, reject_undersized: false }
    }

    fn card(path: &Path) -> PixelBuffer {
        let img = PixelBuffer::from_fn(24, 24, 3, |x, y| [(x * 10) as u8, (y * 10) as u8, ((x * y) % 256) as u8, 255]).unwrap();
        convo_io::write(path, &img).unwrap();
        img
    }

    fn args(input: &Path, output: &Path, filter: &str, quality: Option<u8>) -> ApplyArgs {
        ApplyArgs {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            filter: filter.to_string(),
            quality,
        }
    }

    #[test]
    fn test_apply_writes_filtered_image() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let img = card(&input);
        let output = dir.path().join("out.png");

        run(args(&input, &output, "EdgeDetection", None), &opts(), false).unwrap();

        let expected = ConvolutionEngine::sequential()
            .apply_filter(&img, &FilterCatalog::standard(), "edge-detect")
            .unwrap();
        assert_eq!(convo_io::read(&output).unwrap(), expected);
    }

    #[test]
    fn test_apply_honors_quality() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        card(&input);
        let low = dir.path().join("low.jpg");
        let high = dir.path().join("high.jpg");

        run(args(&input, &low, "blur", Some(5)), &opts(), false).unwrap();
        run(args(&input, &high, "blur", Some(100)), &opts(), false).unwrap();

        let low_len = std::fs::metadata(&low).unwrap().len();
        let high_len = std::fs::metadata(&high).unwrap().len();
        assert!(low_len < high_len, "q5 {low_len} bytes, q100 {high_len} bytes");
    }

    #[test]
    fn test_apply_unknown_filter() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        card(&input);
        let output = dir.path().join("out.png");

        let err = run(args(&input, &output, "glow", None), &opts(), false).unwrap_err();
        assert!(err.to_string().contains("glow"));
        assert!(!output.exists());
    }
}
