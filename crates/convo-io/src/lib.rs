//! # convo-io
//!
//! Image decode/encode for [`PixelBuffer`]s.
//!
//! Codecs are delegated to the `image` crate; this crate only converts
//! between its pixel layouts and the 8-bit RGB/RGBA buffers the convolution
//! engine works on.
//!
//! - [`read`] / [`write`] - Format picked from magic bytes or extension
//! - [`write_with_options`] - JPEG quality control
//! - [`Format`] - Format detection
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use convo_io::{read, write};
//!
//! let image = read("input.png")?;
//! write("output.jpg", &image)?;
//! ```
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Alpha |
//! |--------|------|-------|-------|
//! | PNG | Yes | Yes | Yes |
//! | JPEG | Yes | Yes | Dropped on write |
//! | BMP | Yes | Yes | Yes |
//! | TGA | Yes | Yes | Yes |
//!
//! Gray images are expanded to RGB, gray+alpha to RGBA, and 16-bit or float
//! images are reduced to 8 bits.

#![warn(missing_docs)]

pub mod detect;
pub mod error;

pub use detect::Format;
pub use error::{IoError, IoResult};

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use convo_core::PixelBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, RgbImage, RgbaImage};
use tracing::{debug, warn};

/// Writer options.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Quality for JPEG compression (1-100). Default: 90.
    pub jpeg_quality: u8,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { jpeg_quality: 90 }
    }
}

/// Reads an image file into a pixel buffer.
///
/// # Errors
///
/// - [`IoError::Io`] if the file cannot be opened
/// - [`IoError::UnsupportedFormat`] for formats other than PNG, JPEG, BMP, TGA
/// - [`IoError::DecodeError`] if the codec rejects the data
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<PixelBuffer> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    let image_format = format
        .image_format()
        .ok_or_else(|| IoError::UnsupportedFormat(path.display().to_string()))?;

    let reader = BufReader::new(File::open(path)?);
    let img = ImageReader::with_format(reader, image_format)
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;

    let buffer = from_dynamic(img)?;
    debug!(path = %path.display(), ?format, dims = ?buffer.dimensions(), "read image");
    Ok(buffer)
}

/// Writes a pixel buffer with default options. Format follows the extension.
pub fn write<P: AsRef<Path>>(path: P, image: &PixelBuffer) -> IoResult<()> {
    write_with_options(path, image, &WriteOptions::default())
}

/// Writes a pixel buffer with custom options.
///
/// Alpha is dropped (with a warning) for formats that cannot store it.
pub fn write_with_options<P: AsRef<Path>>(
    path: P,
    image: &PixelBuffer,
    options: &WriteOptions,
) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    let image_format = format
        .image_format()
        .ok_or_else(|| IoError::UnsupportedFormat(path.display().to_string()))?;

    let mut dyn_img = to_dynamic(image)?;
    if image.has_alpha() && !format.supports_alpha() {
        warn!(path = %path.display(), ?format, "format has no alpha channel, dropping alpha");
        dyn_img = DynamicImage::ImageRgb8(dyn_img.to_rgb8());
    }

    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        Format::Jpeg => {
            let quality = options.jpeg_quality.clamp(1, 100);
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            dyn_img
                .write_with_encoder(encoder)
                .map_err(|e| IoError::EncodeError(e.to_string()))?;
        }
        _ => {
            dyn_img
                .write_to(&mut writer, image_format)
                .map_err(|e| IoError::EncodeError(e.to_string()))?;
        }
    }
    writer.flush()?;

    debug!(path = %path.display(), ?format, dims = ?image.dimensions(), "wrote image");
    Ok(())
}

/// Converts a decoded image to an 8-bit RGB or RGBA buffer.
pub fn from_dynamic(img: DynamicImage) -> IoResult<PixelBuffer> {
    let (width, height) = (img.width(), img.height());

    let buffer = match img {
        DynamicImage::ImageRgb8(rgb) => PixelBuffer::from_raw(width, height, 3, rgb.into_raw())?,
        DynamicImage::ImageRgba8(rgba) => PixelBuffer::from_raw(width, height, 4, rgba.into_raw())?,
        other if other.color().has_alpha() => {
            PixelBuffer::from_raw(width, height, 4, other.to_rgba8().into_raw())?
        }
        other => PixelBuffer::from_raw(width, height, 3, other.to_rgb8().into_raw())?,
    };
    Ok(buffer)
}

/// Converts a pixel buffer to an `image` crate image.
pub fn to_dynamic(image: &PixelBuffer) -> IoResult<DynamicImage> {
    let (width, height, channels) = image.dimensions();
    let data = image.data().to_vec();

    let dyn_img = if channels == 4 {
        RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8)
    } else {
        RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
    };
    dyn_img.ok_or_else(|| IoError::EncodeError(format!("buffer does not fit {width}x{height}x{channels}")))
}
