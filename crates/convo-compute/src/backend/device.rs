//! Device abstraction shared by the GPU strategies.
//!
//! A device backend only has to move samples and run one kernel; the
//! host-side protocol lives in [`DeviceStrategy`]:
//!
//! 1. Upload the source samples.
//! 2. Upload them again as the destination, so borders and alpha already
//!    hold their final values.
//! 3. Dispatch one invocation per interior pixel and wait.
//! 4. Download the destination.

use convo_core::{Kernel, PixelBuffer};
use tracing::{debug, trace};

use super::ConvolutionStrategy;
use crate::{ComputeError, ComputeResult};

const DEFAULT_MAX_DIM: u32 = 65535 * 16;
const DEFAULT_MAX_BUFFER_BYTES: u64 = 256 * 1024 * 1024; // 256 MB
const DEFAULT_MEMORY_BYTES: u64 = 2 * 1024 * 1024 * 1024; // 2 GB

/// Largest buffer whose sample offsets fit a signed 32-bit device index.
pub const MAX_I32_INDEXED_BYTES: u64 = i32::MAX as u64;

/// Handle to an image in device memory.
pub trait DeviceImage: Send + Sync {
    /// Image dimensions (width, height, channels).
    fn dimensions(&self) -> (u32, u32, u32);

    /// Size in bytes of device memory used.
    fn size_bytes(&self) -> u64;
}

/// Device resource limits.
#[derive(Debug, Clone)]
pub struct DeviceLimits {
    /// Largest width or height one dispatch can cover.
    pub max_dim: u32,
    /// Maximum size of a single buffer in bytes.
    pub max_buffer_bytes: u64,
    /// Device memory usable for one convolution (two image buffers).
    pub available_memory: u64,
    /// Device bytes per 8-bit sample.
    pub bytes_per_sample: u64,
    /// Whether values were queried from the device vs defaults.
    pub detected: bool,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_dim: DEFAULT_MAX_DIM,
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            available_memory: DEFAULT_MEMORY_BYTES,
            bytes_per_sample: 1,
            detected: false,
        }
    }
}

impl DeviceLimits {
    /// Limits for a device that addresses samples with 32-bit signed
    /// offsets and has `available` bytes of free memory.
    ///
    /// One buffer is capped at [`MAX_I32_INDEXED_BYTES`] whatever the memory.
    pub fn from_memory(available: u64, max_dim: u32) -> Self {
        Self {
            max_dim,
            max_buffer_bytes: available.min(MAX_I32_INDEXED_BYTES),
            available_memory: available,
            bytes_per_sample: 1,
            detected: true,
        }
    }

    /// Bytes of one device image buffer.
    pub fn buffer_bytes(&self, width: u32, height: u32, channels: u32) -> u64 {
        (width as u64) * (height as u64) * (channels as u64) * self.bytes_per_sample
    }

    /// Checks that source and destination fit on the device.
    ///
    /// # Errors
    ///
    /// [`ComputeError::ImageTooLarge`] when either axis exceeds the dispatch
    /// grid or a buffer exceeds the buffer or memory limit.
    pub fn check(&self, width: u32, height: u32, channels: u32) -> ComputeResult<()> {
        let bytes = self.buffer_bytes(width, height, channels);
        let limit = self.max_buffer_bytes.min(self.available_memory / 2);
        if width > self.max_dim || height > self.max_dim || bytes > limit {
            return Err(ComputeError::ImageTooLarge { width, height, bytes, limit });
        }
        Ok(())
    }
}

/// Core device operations.
pub trait DevicePrimitives: Send + Sync {
    /// Backend-specific image handle type.
    type Handle: DeviceImage;

    /// Upload 8-bit samples to the device.
    fn upload(&self, samples: &[u8], width: u32, height: u32, channels: u32) -> ComputeResult<Self::Handle>;

    /// Download samples from the device.
    fn download(&self, handle: &Self::Handle) -> ComputeResult<Vec<u8>>;

    /// Convolve the interior of `src` into `dst` and wait for completion.
    ///
    /// Only interior color samples of `dst` are written.
    fn exec_convolve(&self, src: &Self::Handle, dst: &mut Self::Handle, kernel: &Kernel) -> ComputeResult<()>;

    /// Device limits.
    fn limits(&self) -> &DeviceLimits;

    /// Backend name.
    fn name(&self) -> &'static str;
}

/// Massively parallel strategy: one device invocation per interior pixel.
pub struct DeviceStrategy<P: DevicePrimitives> {
    device: P,
}

impl<P: DevicePrimitives> DeviceStrategy<P> {
    /// Wraps initialized device primitives.
    pub fn new(device: P) -> Self {
        debug!(backend = device.name(), limits = ?device.limits(), "device strategy ready");
        Self { device }
    }

    /// Underlying device primitives.
    pub fn device(&self) -> &P {
        &self.device
    }
}

impl<P: DevicePrimitives> ConvolutionStrategy for DeviceStrategy<P> {
    fn name(&self) -> &'static str {
        self.device.name()
    }

    fn apply(&self, source: &PixelBuffer, kernel: &Kernel) -> ComputeResult<PixelBuffer> {
        if !source.fits_margin(kernel.margin()) {
            return Ok(source.clone());
        }

        let (width, height, channels) = source.dimensions();
        self.device.limits().check(width, height, channels)?;

        let src = self.device.upload(source.data(), width, height, channels)?;
        let mut dst = self.device.upload(source.data(), width, height, channels)?;
        trace!(
            backend = self.device.name(),
            bytes = src.size_bytes() + dst.size_bytes(),
            "device buffers uploaded"
        );

        self.device.exec_convolve(&src, &mut dst, kernel)?;
        let data = self.device.download(&dst)?;

        Ok(PixelBuffer::from_raw(width, height, channels, data)?)
    }
}
