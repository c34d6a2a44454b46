//! Hand-computed outputs on tiny images.
//!
//! Each case is small enough to check on paper. Together they pin down the
//! kernel orientation, the per-term truncation and the clamp, for every
//! strategy at once.

use convo_core::{Kernel, PixelBuffer};

use crate::tests::available_strategies;

/// 3x3 gray image with value `10 * x + y`.
fn coordinates() -> PixelBuffer {
    PixelBuffer::from_fn(3, 3, 3, |x, y| {
        let v = (10 * x + y) as u8;
        [v, v, v, 0]
    })
    .unwrap()
}

fn center(kernel: &Kernel, img: &PixelBuffer) -> Vec<u8> {
    let mut seen = Vec::new();
    for strategy in available_strategies() {
        let out = strategy.apply(img, kernel).unwrap();
        seen.push(out.pixel(1, 1)[0]);
    }
    seen.dedup();
    seen
}

#[test]
fn golden_kernel_row_walks_x() {
    // Only weight (row 0, col 2) is set: offsets kx = -1, ky = +1.
    let rows: [[f32; 3]; 3] = [[0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
    let kernel = Kernel::from_rows(&rows).unwrap();
    // src(0, 2) = 2; the transposed reading would give src(2, 0) = 20
    assert_eq!(center(&kernel, &coordinates()), vec![2]);
}

#[test]
fn golden_emboss() {
    // -1 + (-10 + 11 + 12) + (21 + 44) = 77
    assert_eq!(center(&Kernel::emboss(), &coordinates()), vec![77]);
}

#[test]
fn golden_truncates_toward_zero() {
    // 100 * 1.0 + trunc(7 * -0.5) = 100 - 3
    let img = PixelBuffer::from_fn(3, 3, 3, |x, y| {
        let v = if (x, y) == (1, 1) { 100 } else { 7 };
        [v, v, v, 0]
    })
    .unwrap();
    let rows: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [-0.5, 1.0, 0.0], [0.0, 0.0, 0.0]];
    let kernel = Kernel::from_rows(&rows).unwrap();
    assert_eq!(center(&kernel, &img), vec![97]);
}

#[test]
fn golden_outline_clamps() {
    // 8 * 11 - (0 + 1 + 2 + 10 + 12 + 20 + 21 + 22) = 88 - 88 = 0
    assert_eq!(center(&Kernel::outline(), &coordinates()), vec![0]);
    // Negative sums saturate at zero
    let dark_center = PixelBuffer::from_fn(3, 3, 3, |x, y| {
        let v = if (x, y) == (1, 1) { 0 } else { 50 };
        [v, v, v, 0]
    })
    .unwrap();
    assert_eq!(center(&Kernel::outline(), &dark_center), vec![0]);
    // 8 * 50 = 400 saturates at 255
    let bright_center = PixelBuffer::from_fn(3, 3, 3, |x, y| {
        let v = if (x, y) == (1, 1) { 50 } else { 0 };
        [v, v, v, 0]
    })
    .unwrap();
    assert_eq!(center(&Kernel::outline(), &bright_center), vec![255]);
}
