//! Error types for convo-core operations.
//!
//! The [`CoreError`] enum covers the two ways a convolution request can be
//! malformed before any pixel work starts:
//! - Buffer shape errors (zero dimensions, unsupported channel count, data length)
//! - Kernel shape errors (empty, even side, ragged or non-square weights)
//!
//! Kernel errors are configuration errors: they are reported when the
//! [`Kernel`](crate::Kernel) is constructed, so a kernel that exists is always
//! square with an odd side.
//!
//! # Usage
//!
//! ```rust
//! use convo_core::{CoreError, Kernel};
//!
//! let err = Kernel::new(vec![1.0; 4], 2).unwrap_err();
//! assert!(matches!(err, CoreError::EvenKernelSize { size: 2 }));
//! assert!(err.is_kernel_error());
//! ```

use thiserror::Error;

/// Result type alias using [`CoreError`] as the error type.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors raised while building pixel buffers, kernels or catalogs.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Width or height is zero, or the sample count overflows `usize`.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Why the dimensions were rejected
        reason: String,
    },

    /// Only RGB and RGBA buffers are supported.
    #[error("unsupported channel count: {0} (expected 3 or 4)")]
    UnsupportedChannels(u32),

    /// Sample data does not match `width * height * channels`.
    #[error("buffer size mismatch: expected {expected} samples, got {actual}")]
    BufferSizeMismatch {
        /// Expected number of samples
        expected: usize,
        /// Provided number of samples
        actual: usize,
    },

    /// Pixel coordinates outside the buffer.
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate
        x: u32,
        /// Y coordinate
        y: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Kernel has no weights.
    #[error("kernel is empty")]
    EmptyKernel,

    /// Kernel side length is even, so it has no center cell.
    #[error("kernel size {size} is even; convolution kernels need an odd side")]
    EvenKernelSize {
        /// Offending side length
        size: usize,
    },

    /// Kernel weight count is not `size * size`.
    #[error("kernel is not square: {len} weights for a {size}x{size} kernel")]
    NonSquareKernel {
        /// Number of weights supplied
        len: usize,
        /// Declared side length
        size: usize,
    },

    /// A row of a nested kernel literal has the wrong length.
    #[error("kernel row {row} has {got} weights, expected {expected}")]
    RaggedKernel {
        /// Row index
        row: usize,
        /// Expected row length
        expected: usize,
        /// Actual row length
        got: usize,
    },

    /// A kernel weight is NaN or infinite.
    #[error("kernel weight at ({row}, {col}) is not finite")]
    NonFiniteWeight {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
    },

    /// Weights large enough to overflow the `i32` channel accumulator.
    #[error("kernel weights can accumulate to {bound:.0}, beyond the i32 accumulator range")]
    AccumulatorOverflow {
        /// Largest possible `|sum|` over 8-bit samples
        bound: f64,
    },

    /// Filter name not present in the catalog.
    #[error("unknown filter '{name}' (available: {available})")]
    UnknownFilter {
        /// Requested name
        name: String,
        /// Comma separated list of known names
        available: String,
    },
}

impl CoreError {
    /// Creates an [`CoreError::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`CoreError::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` for malformed kernel errors.
    #[inline]
    pub fn is_kernel_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyKernel
                | Self::EvenKernelSize { .. }
                | Self::NonSquareKernel { .. }
                | Self::RaggedKernel { .. }
                | Self::NonFiniteWeight { .. }
                | Self::AccumulatorOverflow { .. }
        )
    }

    /// Returns `true` for pixel buffer shape errors.
    #[inline]
    pub fn is_buffer_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimensions { .. }
                | Self::UnsupportedChannels(_)
                | Self::BufferSizeMismatch { .. }
                | Self::OutOfBounds { .. }
        )
    }
}
