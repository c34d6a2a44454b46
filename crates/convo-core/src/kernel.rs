//! Convolution kernels.
//!
//! A [`Kernel`] is an immutable `N x N` matrix of `f32` weights with `N` odd,
//! so it always has a center cell. Its [`margin`](Kernel::margin) (`N / 2`)
//! is the width of the border a convolution leaves untouched.
//!
//! Shape is validated once, at construction; an existing kernel is always
//! well formed. Construction also rejects weights whose products with 8-bit
//! samples could sum past `i32::MAX`, so the per-channel accumulator never
//! overflows.
//!
//! # Kernels
//!
//! - [`Kernel::identity`] - Single 1.0 at the center
//! - [`Kernel::box_blur`] - Simple average blur
//! - [`Kernel::gaussian5`] - 5x5 binomial Gaussian
//! - [`Kernel::sharpen`] - 3x3 sharpen
//! - [`Kernel::edge_detect`] - 4-neighbour Laplacian
//! - [`Kernel::emboss`] - Diagonal emboss
//! - [`Kernel::outline`] - 8-neighbour Laplacian
//!
//! # Example
//!
//! ```rust
//! use convo_core::Kernel;
//!
//! let k = Kernel::from_rows(&[
//!     [0.0, -1.0, 0.0],
//!     [-1.0, 5.0, -1.0],
//!     [0.0, -1.0, 0.0],
//! ]).unwrap();
//! assert_eq!(k.size(), 3);
//! assert_eq!(k.margin(), 1);
//! assert_eq!(k.weight(1, 1), 5.0);
//! ```

use crate::pixel::CHANNEL_MAX;
use crate::{CoreError, CoreResult};

/// Square convolution kernel with an odd side length.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Vec<f32>,
    size: usize,
}

impl Kernel {
    /// Creates a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// - [`CoreError::EmptyKernel`] if `size == 0`
    /// - [`CoreError::EvenKernelSize`] if `size` is even
    /// - [`CoreError::NonSquareKernel`] if `weights.len() != size * size`
    /// - [`CoreError::NonFiniteWeight`] if a weight is NaN or infinite
    /// - [`CoreError::AccumulatorOverflow`] if `sum(|255 * w|)` exceeds `i32::MAX`
    pub fn new(weights: Vec<f32>, size: usize) -> CoreResult<Self> {
        if size == 0 || weights.is_empty() {
            return Err(CoreError::EmptyKernel);
        }
        if size % 2 == 0 {
            return Err(CoreError::EvenKernelSize { size });
        }
        if weights.len() != size * size {
            return Err(CoreError::NonSquareKernel {
                len: weights.len(),
                size,
            });
        }
        if let Some(i) = weights.iter().position(|w| !w.is_finite()) {
            return Err(CoreError::NonFiniteWeight {
                row: i / size,
                col: i % size,
            });
        }
        let bound = accumulator_bound(&weights);
        if bound > i32::MAX as f64 {
            return Err(CoreError::AccumulatorOverflow { bound });
        }
        Ok(Self { weights, size })
    }

    /// Creates a kernel from nested rows.
    ///
    /// Every row must have as many weights as there are rows.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> CoreResult<Self> {
        let size = rows.len();
        let mut weights = Vec::with_capacity(size * size);
        for (row, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != size {
                return Err(CoreError::RaggedKernel {
                    row,
                    expected: size,
                    got: r.len(),
                });
            }
            weights.extend_from_slice(r);
        }
        Self::new(weights, size)
    }

    /// Kernel that returns its input unchanged: one 1.0 weight at the center.
    ///
    /// `size` is rounded up to the next odd number.
    pub fn identity(size: usize) -> Self {
        let size = odd(size);
        let mut weights = vec![0.0; size * size];
        weights[size * size / 2] = 1.0;
        Self { weights, size }
    }

    /// Box blur: every weight is `1 / (size * size)`.
    ///
    /// `size` is rounded up to the next odd number.
    ///
    /// # Example
    ///
    /// ```rust
    /// use convo_core::Kernel;
    ///
    /// let k = Kernel::box_blur(3);
    /// assert_eq!(k.size(), 3);
    /// assert!((k.weight(0, 0) - 1.0 / 9.0).abs() < 1e-7);
    /// ```
    pub fn box_blur(size: usize) -> Self {
        let size = odd(size);
        let count = size * size;
        Self {
            weights: vec![1.0 / count as f32; count],
            size,
        }
    }

    /// 5x5 binomial Gaussian approximation (weights / 256).
    pub fn gaussian5() -> Self {
        const ROW: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
        let mut weights = Vec::with_capacity(25);
        for a in ROW {
            for b in ROW {
                weights.push(a * b / 256.0);
            }
        }
        Self { weights, size: 5 }
    }

    /// 3x3 sharpen.
    #[rustfmt::skip]
    pub fn sharpen() -> Self {
        Self::fixed3([
            0.0, -1.0, 0.0,
            -1.0, 5.0, -1.0,
            0.0, -1.0, 0.0,
        ])
    }

    /// 4-neighbour Laplacian edge detector.
    #[rustfmt::skip]
    pub fn edge_detect() -> Self {
        Self::fixed3([
            0.0, -1.0, 0.0,
            -1.0, 4.0, -1.0,
            0.0, -1.0, 0.0,
        ])
    }

    /// Diagonal emboss.
    #[rustfmt::skip]
    pub fn emboss() -> Self {
        Self::fixed3([
            -2.0, -1.0, 0.0,
            -1.0, 1.0, 1.0,
            0.0, 1.0, 2.0,
        ])
    }

    /// 8-neighbour Laplacian outline.
    #[rustfmt::skip]
    pub fn outline() -> Self {
        Self::fixed3([
            -1.0, -1.0, -1.0,
            -1.0, 8.0, -1.0,
            -1.0, -1.0, -1.0,
        ])
    }

    fn fixed3(weights: [f32; 9]) -> Self {
        Self {
            weights: weights.to_vec(),
            size: 3,
        }
    }

    /// Side length (odd, >= 1).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Half the side length; the unprocessed border width.
    #[inline]
    pub fn margin(&self) -> usize {
        self.size / 2
    }

    /// Weight at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is `>= size`.
    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> f32 {
        assert!(row < self.size && col < self.size, "kernel index out of range");
        self.weights[row * self.size + col]
    }

    /// All weights, row-major.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Sum of all weights. 1.0 for brightness-preserving kernels.
    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// `true` when the kernel is a single 1.0 at the center and zeros elsewhere.
    pub fn is_identity(&self) -> bool {
        let center = self.weights.len() / 2;
        self.weights
            .iter()
            .enumerate()
            .all(|(i, &w)| if i == center { w == 1.0 } else { w == 0.0 })
    }
}

/// Largest `|sum|` the per-term products can reach over 8-bit samples.
///
/// Each term is `trunc(s * w)` with `s <= 255`, so its magnitude is at most
/// the `f32` product `255 * |w|`.
fn accumulator_bound(weights: &[f32]) -> f64 {
    weights
        .iter()
        .map(|w| f64::from(CHANNEL_MAX as f32 * w.abs()))
        .sum()
}

#[inline]
fn odd(size: usize) -> usize {
    if size % 2 == 0 { size + 1 } else { size }
}
