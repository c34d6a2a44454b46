//! Convolution engine for 8-bit RGB(A) rasters.
//!
//! Applies a square [`Kernel`](convo_core::Kernel) to a
//! [`PixelBuffer`](convo_core::PixelBuffer) with one of several
//! interchangeable strategies, all producing byte-identical output.
//!
//! # Architecture
//!
//! ```text
//! ConvolutionEngine (config, undersized policy, fallback)
//!     └── ConvolutionStrategy trait
//!             ├── Sequential       (single thread)
//!             ├── DataParallelCpu  (rayon, disjoint rows)
//!             └── DeviceStrategy<P: DevicePrimitives>
//!                     ├── WgpuPrimitives (compute shaders)
//!                     └── CudaPrimitives (NVRTC kernels)
//! ```
//!
//! Every strategy funnels through the same per-row accumulator in
//! [`stencil`], or mirrors it operation for operation on the device.
//!
//! # Example
//!
//! ```
//! use convo_compute::{Backend, ConvolutionEngine};
//! use convo_core::{Kernel, PixelBuffer};
//!
//! let engine = ConvolutionEngine::builder()
//!     .backend(Backend::Cpu)
//!     .build()
//!     .unwrap();
//! let img = PixelBuffer::filled(8, 8, 3, &[10, 20, 30]).unwrap();
//! let out = engine.apply(&img, &Kernel::identity(3)).unwrap();
//! assert_eq!(out, img);
//! ```

pub mod backend;
pub mod engine;
pub mod stencil;
mod shaders;

pub use backend::{
    Backend, BackendInfo, ConvolutionStrategy, DataParallelCpu, DeviceImage, DeviceLimits, DevicePrimitives,
    DeviceStrategy, Sequential, create_strategy, describe_backends, detect_backends,
    select_best_backend,
};
pub use engine::{ConvolutionEngine, EngineBuilder, EngineConfig, UndersizedPolicy};

use convo_core::CoreError;
use thiserror::Error;

/// Convolution errors.
///
/// Split into two families, see [`is_dispatch`](Self::is_dispatch):
/// dispatch errors mean the chosen strategy could not be brought up and a
/// CPU strategy would still work; the rest are failures of the computation
/// itself.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// No GPU adapter matched the request.
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    /// Backend compiled out or not present on this system.
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    /// Device or context creation failed.
    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    /// Shader or kernel compilation failed.
    #[error("Failed to compile shader: {0}")]
    ShaderCompilation(String),

    /// Worker pool could not be built.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),

    /// Device buffer allocation or upload failed.
    #[error("Failed to create buffer: {0}")]
    BufferCreation(String),

    /// Image exceeds a device limit.
    #[error("Image too large: {width}x{height} needs {bytes} bytes, device limit is {limit}")]
    ImageTooLarge {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Bytes needed per device buffer.
        bytes: u64,
        /// Largest buffer the device accepts.
        limit: u64,
    },

    /// Image has no interior for the kernel and the policy rejects it.
    #[error("Image too small: {width}x{height} needs at least {min}x{min} for a {size}x{size} kernel")]
    ImageTooSmall {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Kernel side.
        size: usize,
        /// Smallest accepted extent on each axis (`2 * margin + 1`).
        min: usize,
    },

    /// Device dispatch or readback failed.
    #[error("GPU operation failed: {0}")]
    OperationFailed(String),

    /// Malformed buffer or kernel.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ComputeError {
    /// `true` for errors raised while bringing a strategy up.
    ///
    /// Callers can retry the same request on a CPU strategy.
    pub fn is_dispatch(&self) -> bool {
        matches!(
            self,
            Self::NoAdapter
                | Self::BackendNotAvailable(_)
                | Self::DeviceCreation(_)
                | Self::ShaderCompilation(_)
                | Self::ThreadPool(_)
        )
    }
}

/// Result alias for compute operations.
pub type ComputeResult<T> = Result<T, ComputeError>;
