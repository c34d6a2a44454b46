//! wgpu backend implementation.
//!
//! GPU convolution using a WGSL compute shader.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use convo_core::Kernel;
use tracing::{debug, info};
use wgpu::util::DeviceExt;

use super::device::{DeviceImage, DeviceLimits, DevicePrimitives};
use crate::shaders;
use crate::{ComputeError, ComputeResult};

/// Dimensions uniform: [width, height, channels, kernel size]
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DimsUniform {
    dims: [u32; 4],
}

// =============================================================================
// WgpuImage Handle
// =============================================================================

/// GPU buffer handle for image data, one `u32` per sample.
pub struct WgpuImage {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    channels: u32,
    size_bytes: u64,
}

impl DeviceImage for WgpuImage {
    fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.channels)
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

// =============================================================================
// WgpuPrimitives
// =============================================================================

/// wgpu device primitives.
pub struct WgpuPrimitives {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    convolve: wgpu::ComputePipeline,
    limits: DeviceLimits,
}

impl WgpuPrimitives {
    /// Check if wgpu is available.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Create new wgpu primitives.
    pub fn new() -> ComputeResult<Self> {
        pollster::block_on(Self::new_async())
    }

    /// Create new wgpu primitives asynchronously.
    pub async fn new_async() -> ComputeResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ComputeError::NoAdapter)?;

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("convo_device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter_limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            }, None)
            .await
            .map_err(|e| ComputeError::DeviceCreation(e.to_string()))?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let adapter_info = adapter.get_info();
        info!(adapter = %adapter_info.name, backend = ?adapter_info.backend, "wgpu adapter selected");

        let max_buffer_bytes = adapter_limits
            .max_buffer_size
            .min(adapter_limits.max_storage_buffer_binding_size as u64);
        let limits = DeviceLimits {
            max_dim: adapter_limits
                .max_compute_workgroups_per_dimension
                .saturating_mul(shaders::WORKGROUP_SIZE),
            max_buffer_bytes,
            available_memory: estimate_vram(&adapter_info, adapter_limits.max_buffer_size),
            bytes_per_sample: 4,
            detected: true,
        };

        let convolve = Self::create_pipeline(&device).await?;

        Ok(Self {
            device,
            queue,
            convolve,
            limits,
        })
    }

    async fn create_pipeline(device: &wgpu::Device) -> ComputeResult<wgpu::ComputePipeline> {
        // Capture WGSL validation errors
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("convolve_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::CONVOLVE.into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("convolve_pipeline"),
            layout: None, // Auto layout
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        match device.pop_error_scope().await {
            Some(e) => Err(ComputeError::ShaderCompilation(e.to_string())),
            None => Ok(pipeline),
        }
    }

    /// Create dims uniform buffer.
    fn create_dims_buffer(&self, w: u32, h: u32, c: u32, size: u32) -> wgpu::Buffer {
        let uniform = DimsUniform { dims: [w, h, c, size] };
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("dims_uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }

    /// Execute compute dispatch and wait.
    fn dispatch_and_wait(&self, pipeline: &wgpu::ComputePipeline, bind_group: &wgpu::BindGroup, workgroups: (u32, u32, u32)) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("compute_encoder"),
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(workgroups.0, workgroups.1, workgroups.2);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);
    }
}

impl DevicePrimitives for WgpuPrimitives {
    type Handle = WgpuImage;

    fn upload(&self, samples: &[u8], width: u32, height: u32, channels: u32) -> ComputeResult<Self::Handle> {
        let expected = (width as usize) * (height as usize) * (channels as usize);
        if samples.len() != expected {
            return Err(ComputeError::BufferCreation(format!(
                "expected {expected} samples, got {}",
                samples.len()
            )));
        }

        let widened: Vec<u32> = samples.iter().map(|&s| s as u32).collect();
        let size_bytes = (widened.len() * 4) as u64;

        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("image_buffer"),
            contents: bytemuck::cast_slice(&widened),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
        });

        Ok(WgpuImage { buffer, width, height, channels, size_bytes })
    }

    fn download(&self, handle: &Self::Handle) -> ComputeResult<Vec<u8>> {
        let size = handle.size_bytes;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(&handle.buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| { let _ = tx.send(r); });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ComputeError::OperationFailed("Map channel closed".into()))?
            .map_err(|e| ComputeError::OperationFailed(format!("Map failed: {e}")))?;

        let data = slice.get_mapped_range();
        // Shader output is already clamped to 0..=255
        let result: Vec<u8> = bytemuck::cast_slice::<u8, u32>(&data)
            .iter()
            .map(|&v| v as u8)
            .collect();
        drop(data);
        staging.unmap();

        Ok(result)
    }

    fn exec_convolve(&self, src: &Self::Handle, dst: &mut Self::Handle, kernel: &Kernel) -> ComputeResult<()> {
        let (w, h, c) = src.dimensions();

        let dims_buf = self.create_dims_buffer(w, h, c, kernel.size() as u32);

        let weights_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("weights_buffer"),
            contents: bytemuck::cast_slice(kernel.weights()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let layout = self.convolve.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("convolve_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: src.buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: dst.buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: dims_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: weights_buf.as_entire_binding() },
            ],
        });

        let workgroups = (
            w.div_ceil(shaders::WORKGROUP_SIZE),
            h.div_ceil(shaders::WORKGROUP_SIZE),
            1,
        );
        debug!(width = w, height = h, size = kernel.size(), ?workgroups, "wgpu dispatch");
        self.dispatch_and_wait(&self.convolve, &bind_group, workgroups);
        Ok(())
    }

    fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    fn name(&self) -> &'static str {
        "wgpu"
    }
}

// =============================================================================
// VRAM Detection
// =============================================================================

fn estimate_vram(info: &wgpu::AdapterInfo, max_buffer_bytes: u64) -> u64 {
    // Check env override
    if let Ok(mb) = std::env::var("CONVO_GPU_MEMORY_MB") {
        if let Ok(mb) = mb.parse::<u64>() {
            return mb.saturating_mul(1024 * 1024);
        }
    }

    let from_buffer = max_buffer_bytes.saturating_mul(2);

    let estimated = match info.device_type {
        wgpu::DeviceType::DiscreteGpu => from_buffer.clamp(2u64 << 30, 24u64 << 30),
        wgpu::DeviceType::IntegratedGpu => from_buffer.clamp(512u64 << 20, 4u64 << 30),
        wgpu::DeviceType::VirtualGpu => from_buffer.clamp(1u64 << 30, 8u64 << 30),
        _ => from_buffer.clamp(256u64 << 20, 2u64 << 30),
    };

    // 80% safe margin
    estimated.saturating_mul(80) / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ConvolutionStrategy, DeviceStrategy, Sequential};
    use convo_core::PixelBuffer;

    fn gpu() -> Option<WgpuPrimitives> {
        match WgpuPrimitives::new() {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("skipping wgpu test: {e}");
                None
            }
        }
    }

    #[test]
    fn test_matches_sequential() {
        let Some(gpu) = gpu() else { return };
        let strategy = DeviceStrategy::new(gpu);
        let img = PixelBuffer::from_fn(33, 19, 4, |x, y| {
            [(x * 7) as u8, (y * 13) as u8, ((x * y) % 256) as u8, 90]
        })
        .unwrap();
        for kernel in [Kernel::box_blur(3), Kernel::sharpen(), Kernel::gaussian5(), Kernel::emboss()] {
            assert_eq!(
                strategy.apply(&img, &kernel).unwrap(),
                Sequential.apply(&img, &kernel).unwrap()
            );
        }
    }

    #[test]
    fn test_upload_download_roundtrip() {
        let Some(gpu) = gpu() else { return };
        let samples: Vec<u8> = (0..=255).cycle().take(4 * 5 * 3).collect();
        let handle = gpu.upload(&samples, 4, 5, 3).unwrap();
        assert_eq!(handle.size_bytes(), (samples.len() * 4) as u64);
        assert_eq!(gpu.download(&handle).unwrap(), samples);
    }
}
