//! Convolution strategies and backend selection.
//!
//! Provides sequential, rayon, wgpu and CUDA strategies behind one trait.
//!
//! # Architecture
//!
//! ```text
//! ConvolutionStrategy
//!     +-- Sequential                      (single thread)
//!     +-- DataParallelCpu                 (rayon, one task per row)
//!     +-- DeviceStrategy<WgpuPrimitives>  (Vulkan/Metal/DX12)
//!     +-- DeviceStrategy<CudaPrimitives>  (NVIDIA CUDA)
//! ```
//!
//! All strategies produce byte-identical output for the same input.

mod cpu_backend;
mod detect;
mod device;
mod sequential;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

#[cfg(feature = "cuda")]
mod cuda_backend;

pub use cpu_backend::DataParallelCpu;
pub use detect::{BackendInfo, describe_backends, detect_backends, select_best_backend};
pub use device::{DeviceImage, DeviceLimits, DevicePrimitives, DeviceStrategy};
pub use sequential::Sequential;

#[cfg(feature = "wgpu")]
pub use wgpu_backend::{WgpuImage, WgpuPrimitives};

#[cfg(feature = "cuda")]
pub use cuda_backend::{CudaImage, CudaPrimitives};

use std::fmt;
use std::str::FromStr;

use convo_core::{Kernel, PixelBuffer};
use tracing::{debug, warn};

use crate::ComputeResult;
#[cfg(not(all(feature = "wgpu", feature = "cuda")))]
use crate::ComputeError;

/// One way of running a convolution.
///
/// `apply` reads `source` only and returns a new buffer of the same shape.
/// Pixels closer than `kernel.margin()` to any edge, and alpha samples, are
/// copied from the source. An image with no interior comes back as a plain
/// copy; rejecting such images is the engine's job.
pub trait ConvolutionStrategy: Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Convolves `source` with `kernel`.
    fn apply(&self, source: &PixelBuffer, kernel: &Kernel) -> ComputeResult<PixelBuffer>;
}

impl<S: ConvolutionStrategy + ?Sized> ConvolutionStrategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply(&self, source: &PixelBuffer, kernel: &Kernel) -> ComputeResult<PixelBuffer> {
        (**self).apply(source, kernel)
    }
}

/// Available compute backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// Auto-select best available (CUDA > wgpu > CPU).
    #[default]
    Auto,
    /// Single-threaded reference implementation.
    Sequential,
    /// CPU backend using rayon for parallelization.
    Cpu,
    /// wgpu backend (Vulkan/Metal/DX12).
    Wgpu,
    /// NVIDIA CUDA backend.
    Cuda,
}

impl Backend {
    /// Every backend, in CLI listing order.
    pub const ALL: [Backend; 5] = [
        Backend::Auto,
        Backend::Sequential,
        Backend::Cpu,
        Backend::Wgpu,
        Backend::Cuda,
    ];

    /// Check if this backend is available on current system.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Auto | Self::Sequential | Self::Cpu => true,
            #[cfg(feature = "wgpu")]
            Self::Wgpu => WgpuPrimitives::is_available(),
            #[cfg(not(feature = "wgpu"))]
            Self::Wgpu => false,
            #[cfg(feature = "cuda")]
            Self::Cuda => CudaPrimitives::is_available(),
            #[cfg(not(feature = "cuda"))]
            Self::Cuda => false,
        }
    }

    /// Get human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Sequential => "sequential",
            Self::Cpu => "cpu",
            Self::Wgpu => "wgpu",
            Self::Cuda => "cuda",
        }
    }

    /// `true` for the GPU backends.
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Wgpu | Self::Cuda)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "sequential" | "seq" | "single" => Ok(Self::Sequential),
            "cpu" | "rayon" | "parallel" => Ok(Self::Cpu),
            "wgpu" | "gpu" => Ok(Self::Wgpu),
            "cuda" => Ok(Self::Cuda),
            other => Err(format!(
                "unknown backend '{other}' (expected auto, sequential, cpu, wgpu or cuda)"
            )),
        }
    }
}

/// Create a strategy for the given backend.
///
/// `threads` sizes the rayon pool of [`Backend::Cpu`]; `0` uses the global
/// pool. [`Backend::Auto`] picks the best available backend and falls back to
/// the CPU strategy if the device cannot be brought up.
pub fn create_strategy(backend: Backend, threads: usize) -> ComputeResult<Box<dyn ConvolutionStrategy>> {
    match backend {
        Backend::Auto => {
            let best = select_best_backend();
            match create_strategy(best, threads) {
                Ok(strategy) => Ok(strategy),
                Err(e) if e.is_dispatch() && best != Backend::Cpu => {
                    warn!(backend = %best, error = %e, "device unavailable, falling back to cpu");
                    create_strategy(Backend::Cpu, threads)
                }
                Err(e) => Err(e),
            }
        }
        Backend::Sequential => Ok(Box::new(Sequential::new())),
        Backend::Cpu => {
            let cpu = DataParallelCpu::with_threads(threads)?;
            debug!(threads = cpu.threads(), "cpu strategy ready");
            Ok(Box::new(cpu))
        }
        Backend::Wgpu => {
            #[cfg(feature = "wgpu")]
            {
                let gpu = WgpuPrimitives::new()?;
                Ok(Box::new(DeviceStrategy::new(gpu)))
            }
            #[cfg(not(feature = "wgpu"))]
            {
                Err(ComputeError::BackendNotAvailable(
                    "wgpu feature not enabled".to_string()
                ))
            }
        }
        Backend::Cuda => {
            #[cfg(feature = "cuda")]
            {
                let gpu = CudaPrimitives::new()?;
                Ok(Box::new(DeviceStrategy::new(gpu)))
            }
            #[cfg(not(feature = "cuda"))]
            {
                Err(ComputeError::BackendNotAvailable(
                    "cuda feature not enabled".to_string()
                ))
            }
        }
    }
}
