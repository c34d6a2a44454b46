//! CUDA GPU compute backend for convolution.
//!
//! Requires the `cuda` feature and NVIDIA GPU with CUDA support.

use std::sync::Arc;

use convo_core::Kernel;
use cudarc::driver::{CudaContext, CudaFunction, CudaModule, CudaSlice, CudaStream, LaunchConfig, PushKernelArg};
use tracing::debug;

use super::device::{DeviceImage, DeviceLimits, DevicePrimitives};
use crate::{ComputeError, ComputeResult};

// =============================================================================
// CUDA Kernel Source
// =============================================================================

/// CUDA kernel source, compiled at runtime via NVRTC.
///
/// `__fmul_rn` keeps each product a separately rounded `f32` multiply so the
/// truncated terms match the CPU accumulator bit for bit.
const CUDA_KERNELS: &str = r#"
extern "C" {

__global__ void convolve_kernel(
    const unsigned char* __restrict__ src,
    unsigned char* __restrict__ dst,
    const float* __restrict__ weights,
    int w, int h, int c, int n
) {
    int x = blockIdx.x * blockDim.x + threadIdx.x;
    int y = blockIdx.y * blockDim.y + threadIdx.y;
    int m = n / 2;
    if (x < m || y < m || x >= w - m || y >= h - m) return;

    int acc_r = 0, acc_g = 0, acc_b = 0;
    for (int kx = 0; kx < n; kx++) {
        int sx = x + kx - m;
        for (int ky = 0; ky < n; ky++) {
            int sy = y + ky - m;
            float weight = weights[kx * n + ky];
            long long base = ((long long)sy * w + sx) * c;
            acc_r += (int)__fmul_rn((float)src[base],     weight);
            acc_g += (int)__fmul_rn((float)src[base + 1], weight);
            acc_b += (int)__fmul_rn((float)src[base + 2], weight);
        }
    }

    long long base = ((long long)y * w + x) * c;
    dst[base]     = (unsigned char)min(max(acc_r, 0), 255);
    dst[base + 1] = (unsigned char)min(max(acc_g, 0), 255);
    dst[base + 2] = (unsigned char)min(max(acc_b, 0), 255);
}

} // extern "C"
"#;

// =============================================================================
// CUDA Handle
// =============================================================================

/// CUDA buffer handle for image data.
///
/// Memory is managed by cudarc and freed when this handle is dropped.
pub struct CudaImage {
    /// Device-side interleaved 8-bit samples.
    buffer: CudaSlice<u8>,
    width: u32,
    height: u32,
    channels: u32,
}

impl DeviceImage for CudaImage {
    fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.channels)
    }

    fn size_bytes(&self) -> u64 {
        (self.width as u64) * (self.height as u64) * (self.channels as u64)
    }
}

// =============================================================================
// CudaPrimitives
// =============================================================================

/// CUDA device primitives.
pub struct CudaPrimitives {
    /// CUDA context - kept alive for the lifetime of primitives.
    #[allow(dead_code)]
    ctx: Arc<CudaContext>,
    stream: Arc<CudaStream>,
    /// Compiled CUDA module - kept alive for kernel lifetime.
    #[allow(dead_code)]
    module: Arc<CudaModule>,
    k_convolve: CudaFunction,
    limits: DeviceLimits,
}

impl CudaPrimitives {
    /// Create new CUDA primitives.
    pub fn new() -> ComputeResult<Self> {
        let ctx = CudaContext::new(0).map_err(|e| {
            ComputeError::DeviceCreation(format!("CUDA init failed: {e:?}"))
        })?;

        let stream = ctx.default_stream();
        let available = query_available_memory();
        let limits = DeviceLimits::from_memory(available, 65535 * 16);

        let ptx = cudarc::nvrtc::compile_ptx(CUDA_KERNELS).map_err(|e| {
            ComputeError::ShaderCompilation(format!("CUDA kernel compile failed: {e:?}"))
        })?;

        let module = ctx.load_module(ptx).map_err(|e| {
            ComputeError::ShaderCompilation(format!("CUDA module load failed: {e:?}"))
        })?;

        let k_convolve = module.load_function("convolve_kernel").map_err(|e| {
            ComputeError::ShaderCompilation(format!("Failed to load convolve_kernel: {e:?}"))
        })?;

        debug!(available_memory = available, "CUDA context ready");

        Ok(Self {
            ctx,
            stream,
            module,
            k_convolve,
            limits,
        })
    }

    /// Check if CUDA is available.
    pub fn is_available() -> bool {
        CudaContext::new(0).is_ok()
    }

    /// Create launch config for 2D kernel (image-parallel).
    ///
    /// Uses 16x16 thread blocks.
    fn launch_2d(&self, w: u32, h: u32) -> LaunchConfig {
        let block = 16u32;
        LaunchConfig {
            block_dim: (block, block, 1),
            grid_dim: (w.div_ceil(block), h.div_ceil(block), 1),
            shared_mem_bytes: 0,
        }
    }
}

impl DevicePrimitives for CudaPrimitives {
    type Handle = CudaImage;

    fn upload(&self, samples: &[u8], width: u32, height: u32, channels: u32) -> ComputeResult<Self::Handle> {
        let buffer = self.stream.clone_htod(samples).map_err(|e| {
            ComputeError::BufferCreation(format!("Upload failed: {e:?}"))
        })?;
        Ok(CudaImage { buffer, width, height, channels })
    }

    fn download(&self, handle: &Self::Handle) -> ComputeResult<Vec<u8>> {
        self.stream.clone_dtoh(&handle.buffer).map_err(|e| {
            ComputeError::OperationFailed(format!("Download failed: {e:?}"))
        })
    }

    fn exec_convolve(&self, src: &Self::Handle, dst: &mut Self::Handle, kernel: &Kernel) -> ComputeResult<()> {
        let (w, h, c) = (src.width as i32, src.height as i32, src.channels as i32);
        let n = kernel.size() as i32;

        let weights = self.stream.clone_htod(kernel.weights()).map_err(|e| {
            ComputeError::BufferCreation(format!("Kernel upload failed: {e:?}"))
        })?;

        let cfg = self.launch_2d(src.width, src.height);
        let mut builder = self.stream.launch_builder(&self.k_convolve);
        builder.arg(&src.buffer);
        builder.arg(&dst.buffer);
        builder.arg(&weights);
        builder.arg(&w); builder.arg(&h); builder.arg(&c); builder.arg(&n);

        #[allow(unsafe_code)]
        unsafe { builder.launch(cfg) }.map_err(|e| {
            ComputeError::OperationFailed(format!("Convolve failed: {e:?}"))
        })?;

        self.stream.synchronize().map_err(|e| {
            ComputeError::OperationFailed(format!("Synchronize failed: {e:?}"))
        })?;
        Ok(())
    }

    fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    fn name(&self) -> &'static str {
        "cuda"
    }
}

// =============================================================================
// VRAM Detection
// =============================================================================

/// Query available VRAM from CUDA driver.
///
/// Returns 60% of free memory. Falls back to 4GB if query fails.
fn query_available_memory() -> u64 {
    use cudarc::driver::sys as cuda_sys;

    let mut free: usize = 0;
    let mut total: usize = 0;

    #[allow(unsafe_code)]
    let result = unsafe {
        cuda_sys::cuMemGetInfo_v2(&raw mut free, &raw mut total)
    };

    if result == cuda_sys::CUresult::CUDA_SUCCESS {
        (free as f64 * 0.6) as u64
    } else {
        4 * 1024 * 1024 * 1024 // 4GB fallback
    }
}
