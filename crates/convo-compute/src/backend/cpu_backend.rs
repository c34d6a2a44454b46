//! CPU backend using rayon for parallelization.
//!
//! The interior rows of the destination are split with `par_chunks_mut`, so
//! every task owns a disjoint row and no locking is needed. Rayon's work
//! stealing balances the rows across workers; the call returns after all
//! rows are done.

use convo_core::{Kernel, PixelBuffer};
use rayon::prelude::*;
use tracing::trace;

use super::ConvolutionStrategy;
use crate::stencil::convolve_row;
use crate::{ComputeError, ComputeResult};

/// Data-parallel strategy over destination rows.
///
/// Runs on rayon's global pool, or on a dedicated pool when built with
/// [`with_threads`](Self::with_threads).
#[derive(Debug, Default)]
pub struct DataParallelCpu {
    pool: Option<rayon::ThreadPool>,
}

impl DataParallelCpu {
    /// Strategy on the global rayon pool (one worker per hardware thread).
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Strategy on a dedicated pool of `threads` workers. `0` means the
    /// global pool.
    ///
    /// # Errors
    ///
    /// [`ComputeError::ThreadPool`] if the pool cannot be spawned.
    pub fn with_threads(threads: usize) -> ComputeResult<Self> {
        if threads == 0 {
            return Ok(Self::new());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("convo-worker-{i}"))
            .build()
            .map_err(|e| ComputeError::ThreadPool(e.to_string()))?;
        Ok(Self { pool: Some(pool) })
    }

    /// Number of workers rows are spread across.
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, |p| p.current_num_threads())
    }
}

impl ConvolutionStrategy for DataParallelCpu {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn apply(&self, source: &PixelBuffer, kernel: &Kernel) -> ComputeResult<PixelBuffer> {
        let rows = source.interior_rows(kernel.margin());
        if rows.is_empty() {
            return Ok(source.clone());
        }

        trace!(size = kernel.size(), rows = rows.len(), threads = self.threads(), "parallel convolve");

        let (width, height, channels) = source.dimensions();
        let stride = source.row_stride();
        let mut data = source.data().to_vec();

        let first = rows.start;
        let interior = &mut data[rows.start * stride..rows.end * stride];
        let run = |interior: &mut [u8]| {
            interior
                .par_chunks_mut(stride)
                .enumerate()
                .for_each(|(i, row)| convolve_row(source, kernel, first + i, row));
        };

        match &self.pool {
            Some(pool) => pool.install(|| run(interior)),
            None => run(interior),
        }

        Ok(PixelBuffer::from_raw(width, height, channels, data)?)
    }
}
