//! Per-channel sample arithmetic shared by every convolution strategy.
//!
//! Convolution accumulates into an `i32` per channel. Each term is the
//! product of an 8-bit sample and an `f32` weight, truncated toward zero
//! before it is added (see [`weighted_term`]). The finished sum is clamped
//! back into `[0, 255]` by [`clamp_channel`].
//!
//! Truncating per term rather than once per pixel can change the result by
//! one unit, so every strategy (CPU or device) must use these exact steps to
//! stay bit-identical.

/// Smallest valid channel value.
pub const CHANNEL_MIN: i32 = 0;
/// Largest valid channel value.
pub const CHANNEL_MAX: i32 = 255;

/// Number of color channels that are convolved. Alpha, when present, is
/// carried through unchanged.
pub const COLOR_CHANNELS: usize = 3;

/// Clamps an accumulated channel value to `[0, 255]`.
///
/// Values never wrap: anything above 255 saturates to 255, anything below 0
/// to 0.
///
/// # Example
///
/// ```rust
/// use convo_core::clamp_channel;
///
/// assert_eq!(clamp_channel(300), 255);
/// assert_eq!(clamp_channel(-12), 0);
/// assert_eq!(clamp_channel(128), 128);
/// ```
#[inline]
pub fn clamp_channel(acc: i32) -> u8 {
    acc.clamp(CHANNEL_MIN, CHANNEL_MAX) as u8
}

/// One multiply-truncate term of the convolution sum.
///
/// The product is formed in `f32` and converted with `as i32`, which
/// truncates toward zero (`-0.9 -> 0`, `2.99 -> 2`).
#[inline]
pub fn weighted_term(sample: u8, weight: f32) -> i32 {
    (sample as f32 * weight) as i32
}
