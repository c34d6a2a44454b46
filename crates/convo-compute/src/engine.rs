//! Convolution engine: a strategy plus the policy around it.
//!
//! # Configuration
//!
//! Use [`EngineBuilder`] for fine-grained control:
//!
//! ```
//! use convo_compute::{Backend, ConvolutionEngine, UndersizedPolicy};
//!
//! let engine = ConvolutionEngine::builder()
//!     .backend(Backend::Cpu)
//!     .threads(4)
//!     .undersized(UndersizedPolicy::Reject)
//!     .build()
//!     .unwrap();
//! assert_eq!(engine.backend_name(), "cpu");
//! ```
//!
//! # Undersized Images
//!
//! An image is undersized when either axis is at most `2 * margin`, so the
//! kernel has no interior pixel to visit. [`UndersizedPolicy`] decides what
//! happens then; the default returns an unchanged copy and logs a warning.

use convo_core::timing::measure;
use convo_core::{FilterCatalog, Kernel, PixelBuffer};
use tracing::{debug, info, warn};

use crate::backend::{Backend, ConvolutionStrategy, create_strategy};
use crate::{ComputeError, ComputeResult};

// ============================================================================
// Configuration
// ============================================================================

/// What to do with an image that has no interior for the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndersizedPolicy {
    /// Return a copy of the source and log a warning.
    #[default]
    BorderCopy,
    /// Fail with [`ComputeError::ImageTooSmall`].
    Reject,
}

/// Engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Worker threads for the CPU strategy (0 = one per hardware thread).
    pub threads: usize,
    /// Handling of images smaller than the kernel.
    pub undersized: UndersizedPolicy,
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ConvolutionEngine`].
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    backend: Backend,
    config: EngineConfig,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Create new builder with default settings.
    pub fn new() -> Self {
        Self {
            backend: Backend::Auto,
            config: EngineConfig::default(),
        }
    }

    /// Set compute backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Set CPU worker count (0 = hardware parallelism).
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    /// Set undersized image policy.
    pub fn undersized(mut self, policy: UndersizedPolicy) -> Self {
        self.config.undersized = policy;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine.
    ///
    /// # Errors
    ///
    /// Dispatch errors from bringing the backend up. [`Backend::Auto`] falls
    /// back to the CPU instead of failing.
    pub fn build(self) -> ComputeResult<ConvolutionEngine> {
        let strategy = create_strategy(self.backend, self.config.threads)?;
        info!(requested = %self.backend, backend = strategy.name(), "convolution engine ready");
        Ok(ConvolutionEngine::from_strategy(strategy, self.config))
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Applies kernels to pixel buffers with a fixed strategy.
///
/// The engine holds no per-call state; one instance can serve any number of
/// calls, from any number of threads.
pub struct ConvolutionEngine {
    strategy: Box<dyn ConvolutionStrategy>,
    config: EngineConfig,
}

impl ConvolutionEngine {
    /// Create with specified backend and default config.
    pub fn new(backend: Backend) -> ComputeResult<Self> {
        EngineBuilder::new().backend(backend).build()
    }

    /// Create with backend and custom config.
    pub fn with_config(backend: Backend, config: EngineConfig) -> ComputeResult<Self> {
        EngineBuilder::new().backend(backend).config(config).build()
    }

    /// Wrap an already constructed strategy.
    pub fn from_strategy(strategy: Box<dyn ConvolutionStrategy>, config: EngineConfig) -> Self {
        Self { strategy, config }
    }

    /// Create builder for fine-grained configuration.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Create with auto-selected backend (GPU if available, else CPU).
    pub fn auto() -> ComputeResult<Self> {
        Self::new(Backend::Auto)
    }

    /// Create with the rayon CPU backend.
    pub fn cpu() -> ComputeResult<Self> {
        Self::new(Backend::Cpu)
    }

    /// Create with the single-threaded backend.
    pub fn sequential() -> Self {
        Self::from_strategy(Box::new(crate::backend::Sequential), EngineConfig::default())
    }

    /// Name of the running strategy ("sequential", "cpu", "wgpu", "cuda").
    pub fn backend_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Convolves `source` with `kernel` into a new buffer.
    ///
    /// Interior color samples are convolved and clamped; border pixels and
    /// alpha are copied. `source` is never modified.
    ///
    /// # Errors
    ///
    /// - [`ComputeError::ImageTooSmall`] for undersized images under
    ///   [`UndersizedPolicy::Reject`]
    /// - Device errors from GPU strategies
    pub fn apply(&self, source: &PixelBuffer, kernel: &Kernel) -> ComputeResult<PixelBuffer> {
        let (width, height, channels) = source.dimensions();
        let margin = kernel.margin();

        if !source.fits_margin(margin) {
            return match self.config.undersized {
                UndersizedPolicy::Reject => Err(ComputeError::ImageTooSmall {
                    width,
                    height,
                    size: kernel.size(),
                    min: 2 * margin + 1,
                }),
                UndersizedPolicy::BorderCopy => {
                    warn!(width, height, size = kernel.size(), "image smaller than kernel, returning copy");
                    Ok(source.clone())
                }
            };
        }

        let (result, elapsed) = measure(|| self.strategy.apply(source, kernel));
        debug!(
            backend = self.strategy.name(),
            width,
            height,
            channels,
            size = kernel.size(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "convolved"
        );
        result
    }

    /// Looks `name` up in `catalog` and applies it.
    pub fn apply_filter(&self, source: &PixelBuffer, catalog: &FilterCatalog, name: &str) -> ComputeResult<PixelBuffer> {
        let kernel = catalog.kernel(name)?;
        self.apply(source, kernel)
    }
}

impl std::fmt::Debug for ConvolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvolutionEngine")
            .field("backend", &self.strategy.name())
            .field("config", &self.config)
            .finish()
    }
}
