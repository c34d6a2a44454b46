//! CLI command implementations

pub mod apply;
pub mod backends;
pub mod filters;
pub mod run_all;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use convo_compute::{Backend, ConvolutionEngine, UndersizedPolicy};
use convo_core::PixelBuffer;

/// Engine settings shared by every command.
pub struct EngineOptions {
    pub backend: Backend,
    pub threads: usize,
    pub reject_undersized: bool,
}

/// Build the engine from global flags.
pub fn build_engine(opts: &EngineOptions) -> Result<ConvolutionEngine> {
    let undersized = if opts.reject_undersized {
        UndersizedPolicy::Reject
    } else {
        UndersizedPolicy::BorderCopy
    };
    ConvolutionEngine::builder()
        .backend(opts.backend)
        .threads(opts.threads)
        .undersized(undersized)
        .build()
        .with_context(|| format!("Failed to initialize backend: {}", opts.backend))
}

/// Load image from path
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    convo_io::read(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path
pub fn save_image(path: &Path, image: &PixelBuffer) -> Result<()> {
    convo_io::write(path, image).with_context(|| format!("Failed to save: {}", path.display()))
}

/// `<dir>/<stem>_<filter>.<ext>`, with `dir` defaulting to the input's directory.
pub fn filtered_path(input: &Path, out_dir: Option<&Path>, filter: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let file_name = match input.extension() {
        Some(ext) => format!("{stem}_{filter}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{filter}.png"),
    };
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_path_next_to_input() {
        let p = filtered_path(Path::new("shots/cat.jpg"), None, "blur");
        assert_eq!(p, PathBuf::from("shots/cat_blur.jpg"));
    }

    #[test]
    fn test_filtered_path_out_dir() {
        let p = filtered_path(Path::new("shots/cat.png"), Some(Path::new("out")), "edge-detect");
        assert_eq!(p, PathBuf::from("out/cat_edge-detect.png"));
    }

    #[test]
    fn test_filtered_path_no_extension() {
        let p = filtered_path(Path::new("cat"), None, "emboss");
        assert_eq!(p, PathBuf::from("cat_emboss.png"));
    }

    #[test]
    fn test_build_engine_sequential() {
        let opts = EngineOptions { backend: Backend::Sequential, threads: 0, reject_undersized: true };
        let engine = build_engine(&opts).unwrap();
        assert_eq!(engine.backend_name(), "sequential");
        assert_eq!(engine.config().undersized, UndersizedPolicy::Reject);
    }
}
