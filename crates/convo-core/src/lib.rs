//! # convo-core
//!
//! Core types for fixed-kernel raster convolution.
//!
//! This crate provides the data the convolution engine works on:
//!
//! - [`PixelBuffer`] - Immutable 8-bit RGB/RGBA raster
//! - [`Kernel`] - Immutable odd-sized square weight matrix
//! - [`clamp_channel`], [`weighted_term`] - Per-channel arithmetic shared by all strategies
//! - [`FilterCatalog`] - Name -> kernel map (`blur`, `sharpen`, `edge-detect`, ...)
//! - [`timing`] - Wall-clock measurement of any unit of work
//!
//! ## Crate Structure
//!
//! ```text
//! convo-core (this crate)
//!    ^
//!    |
//!    +-- convo-compute (convolution strategies)
//!    +-- convo-io (image decode/encode)
//!    +-- convo-cli (command line driver)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod catalog;
pub mod error;
pub mod image;
pub mod kernel;
pub mod pixel;
pub mod timing;

pub use catalog::{FilterCatalog, STANDARD_FILTERS};
pub use error::{CoreError, CoreResult};
pub use image::PixelBuffer;
pub use kernel::Kernel;
pub use pixel::{clamp_channel, weighted_term, CHANNEL_MAX, CHANNEL_MIN, COLOR_CHANNELS};

/// Prelude module for convenient imports.
///
/// ```
/// use convo_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::catalog::FilterCatalog;
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::image::PixelBuffer;
    pub use crate::kernel::Kernel;
    pub use crate::pixel::clamp_channel;
    pub use crate::timing::{measure, Stopwatch};
}
