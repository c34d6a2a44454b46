//! Per-pixel accumulate-and-clamp shared by the CPU strategies.
//!
//! For an interior pixel `(x, y)` and kernel margin `m`, each color channel
//! accumulates
//!
//! ```text
//! acc = Σ_{kx=-m..m} Σ_{ky=-m..m} trunc(kernel[kx+m][ky+m] * src[x+kx, y+ky])
//! ```
//!
//! with `kx` as the outer loop. The kernel row index walks the horizontal
//! offset. Each term is truncated toward zero before it is added, and the sum
//! is clamped to `[0, 255]`. Device kernels repeat these steps in the same
//! order.

use convo_core::{COLOR_CHANNELS, Kernel, PixelBuffer, clamp_channel, weighted_term};

/// Accumulated, unclamped color sums for the interior pixel `(x, y)`.
///
/// The caller guarantees `(x, y)` lies at least `kernel.margin()` pixels from
/// every edge.
#[inline]
pub fn accumulate(src: &PixelBuffer, kernel: &Kernel, x: usize, y: usize) -> [i32; COLOR_CHANNELS] {
    let data = src.data();
    let channels = src.channels() as usize;
    let width = src.width() as usize;
    let size = kernel.size();
    let margin = kernel.margin();
    let weights = kernel.weights();

    let mut acc = [0i32; COLOR_CHANNELS];
    for kx in 0..size {
        let sx = x + kx - margin;
        for ky in 0..size {
            let sy = y + ky - margin;
            let weight = weights[kx * size + ky];
            let base = (sy * width + sx) * channels;
            for (c, sum) in acc.iter_mut().enumerate() {
                *sum += weighted_term(data[base + c], weight);
            }
        }
    }
    acc
}

/// Writes the convolved interior of row `y` into `out`.
///
/// `out` is the full destination row, already holding a copy of the source
/// row; border columns and alpha samples are left as they are.
pub fn convolve_row(src: &PixelBuffer, kernel: &Kernel, y: usize, out: &mut [u8]) {
    let channels = src.channels() as usize;
    for x in src.interior_cols(kernel.margin()) {
        let acc = accumulate(src, kernel, x, y);
        let px = &mut out[x * channels..x * channels + COLOR_CHANNELS];
        for (dst, sum) in px.iter_mut().zip(acc) {
            *dst = clamp_channel(sum);
        }
    }
}
