//! Pixel buffer type for convolution.
//!
//! [`PixelBuffer`] owns a `width x height` grid of 8-bit RGB or RGBA samples.
//!
//! # Memory Layout
//!
//! Samples are stored in **row-major** order, top-to-bottom, channels
//! interleaved:
//!
//! ```text
//! Memory: [R G B R G B R G B ...]  <- Row 0
//!         [R G B R G B R G B ...]  <- Row 1
//!         ...
//! ```
//!
//! For RGBA buffers alpha is interleaved: `[R G B A R G B A ...]`.
//!
//! # Lifecycle
//!
//! A buffer is immutable once constructed. A convolution pass never edits its
//! source; it produces a whole new buffer which replaces the old one. This is
//! what makes the parallel strategies race free: the source can be shared by
//! any number of readers.
//!
//! # Usage
//!
//! ```rust
//! use convo_core::PixelBuffer;
//!
//! let img = PixelBuffer::filled(4, 3, 3, &[255, 0, 0]).unwrap();
//! assert_eq!(img.dimensions(), (4, 3, 3));
//! assert_eq!(img.pixel(2, 1), &[255, 0, 0]);
//! ```

use std::ops::Range;

use crate::{CoreError, CoreResult};

/// Owned, immutable RGB(A) 8-bit image.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u32,
}

impl PixelBuffer {
    /// Creates a buffer from raw interleaved samples.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidDimensions`] if width or height is zero
    /// - [`CoreError::UnsupportedChannels`] if channels is not 3 or 4
    /// - [`CoreError::BufferSizeMismatch`] if `data.len() != width * height * channels`
    ///
    /// # Example
    ///
    /// ```rust
    /// use convo_core::PixelBuffer;
    ///
    /// let img = PixelBuffer::from_raw(2, 1, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
    /// assert_eq!(img.pixel(1, 0), &[4, 5, 6]);
    /// ```
    pub fn from_raw(width: u32, height: u32, channels: u32, data: Vec<u8>) -> CoreResult<Self> {
        let expected = sample_count(width, height, channels)?;
        if data.len() != expected {
            return Err(CoreError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates a buffer with every pixel set to `pixel`.
    ///
    /// `pixel` must have exactly `channels` samples.
    pub fn filled(width: u32, height: u32, channels: u32, pixel: &[u8]) -> CoreResult<Self> {
        let expected = sample_count(width, height, channels)?;
        if pixel.len() != channels as usize {
            return Err(CoreError::BufferSizeMismatch {
                expected: channels as usize,
                actual: pixel.len(),
            });
        }
        let data = pixel.iter().copied().cycle().take(expected).collect();
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates a buffer by evaluating `f(x, y)` for every pixel.
    ///
    /// `f` returns a 4-sample array; only the first `channels` are kept.
    ///
    /// # Example
    ///
    /// ```rust
    /// use convo_core::PixelBuffer;
    ///
    /// let ramp = PixelBuffer::from_fn(3, 1, 3, |x, _| [x as u8, 0, 0, 255]).unwrap();
    /// assert_eq!(ramp.sample(2, 0, 0), 2);
    /// ```
    pub fn from_fn<F>(width: u32, height: u32, channels: u32, mut f: F) -> CoreResult<Self>
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let expected = sample_count(width, height, channels)?;
        let mut data = Vec::with_capacity(expected);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y)[..channels as usize]);
            }
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel (3 or 4).
    #[inline]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// `(width, height, channels)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.channels)
    }

    /// `true` when the buffer carries an alpha channel.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Number of samples in one row.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// All samples, row-major.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer and returns its samples.
    #[inline]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Size of the sample data in bytes.
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Samples of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.row_stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Samples of pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let idx = self.index(x, y);
        &self.data[idx..idx + c]
    }

    /// Checked variant of [`pixel`](Self::pixel).
    pub fn get_pixel(&self, x: u32, y: u32) -> CoreResult<&[u8]> {
        if x >= self.width || y >= self.height {
            return Err(CoreError::out_of_bounds(x, y, self.width, self.height));
        }
        Ok(self.pixel(x, y))
    }

    /// Single sample of channel `c` at `(x, y)`.
    #[inline]
    pub fn sample(&self, x: u32, y: u32, c: u32) -> u8 {
        self.data[self.index(x, y) + c as usize]
    }

    /// `true` when an interior exists for a kernel of the given margin,
    /// i.e. both axes exceed `2 * margin`.
    #[inline]
    pub fn fits_margin(&self, margin: usize) -> bool {
        (self.width as usize) > 2 * margin && (self.height as usize) > 2 * margin
    }

    /// Rows processed by a kernel of the given margin. Empty if the image is
    /// too small.
    #[inline]
    pub fn interior_rows(&self, margin: usize) -> Range<usize> {
        interior_range(self.height as usize, margin)
    }

    /// Columns processed by a kernel of the given margin. Empty if the image
    /// is too small.
    #[inline]
    pub fn interior_cols(&self, margin: usize) -> Range<usize> {
        interior_range(self.width as usize, margin)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

fn interior_range(extent: usize, margin: usize) -> Range<usize> {
    if extent > 2 * margin {
        margin..extent - margin
    } else {
        margin..margin
    }
}

fn sample_count(width: u32, height: u32, channels: u32) -> CoreResult<usize> {
    if width == 0 || height == 0 {
        return Err(CoreError::invalid_dimensions(
            width,
            height,
            "width and height must be > 0",
        ));
    }
    if channels != 3 && channels != 4 {
        return Err(CoreError::UnsupportedChannels(channels));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels as usize))
        .ok_or_else(|| CoreError::invalid_dimensions(width, height, "sample count overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_validates_length() {
        let err = PixelBuffer::from_raw(2, 2, 3, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::BufferSizeMismatch {
                expected: 12,
                actual: 11
            }
        ));
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(PixelBuffer::from_raw(0, 4, 3, vec![]).is_err());
        assert!(PixelBuffer::filled(4, 0, 4, &[0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_rejects_unsupported_channels() {
        let err = PixelBuffer::from_raw(1, 1, 2, vec![0, 0]).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedChannels(2)));
    }

    #[test]
    fn test_filled_and_pixel_access() {
        let img = PixelBuffer::filled(3, 2, 4, &[10, 20, 30, 40]).unwrap();
        assert_eq!(img.data().len(), 3 * 2 * 4);
        assert_eq!(img.pixel(2, 1), &[10, 20, 30, 40]);
        assert_eq!(img.sample(0, 0, 3), 40);
        assert!(img.has_alpha());
    }

    #[test]
    fn test_from_fn_layout_is_row_major() {
        let img = PixelBuffer::from_fn(3, 2, 3, |x, y| [x as u8, y as u8, 7, 0]).unwrap();
        assert_eq!(img.row(1), &[0, 1, 7, 1, 1, 7, 2, 1, 7]);
        assert_eq!(img.row_stride(), 9);
    }

    #[test]
    fn test_get_pixel_bounds() {
        let img = PixelBuffer::filled(2, 2, 3, &[0, 0, 0]).unwrap();
        assert!(img.get_pixel(1, 1).is_ok());
        assert!(img.get_pixel(2, 0).unwrap_err().is_buffer_error());
    }

    #[test]
    fn test_interior_ranges() {
        let img = PixelBuffer::filled(5, 4, 3, &[0, 0, 0]).unwrap();
        assert!(img.fits_margin(1));
        assert_eq!(img.interior_cols(1), 1..4);
        assert_eq!(img.interior_rows(1), 1..3);

        // 4 rows cannot host a 5x5 kernel
        assert!(!img.fits_margin(2));
        assert!(img.interior_rows(2).is_empty());
        assert!(img.interior_rows(3).is_empty());
    }
}
