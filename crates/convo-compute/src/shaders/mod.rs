//! WGSL shader sources for GPU compute pipelines.

#![cfg_attr(not(feature = "wgpu"), allow(dead_code))]

/// Workgroup edge length of [`CONVOLVE`].
pub const WORKGROUP_SIZE: u32 = 16;

/// 2D convolution, one invocation per pixel.
///
/// Samples are widened to `u32` because storage buffers cannot hold `u8`.
/// Products are truncated toward zero per term (`i32(f32)`), matching the
/// CPU accumulator. Border pixels and alpha are never written.
pub const CONVOLVE: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<u32>;
@group(0) @binding(1) var<storage, read_write> dst: array<u32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, c, kernel size
@group(0) @binding(3) var<storage, read> weights: array<f32>;

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let w = dims.x;
    let h = dims.y;
    let c = dims.z;
    let n = dims.w;
    let m = n / 2u;
    let x = id.x;
    let y = id.y;

    if x < m || y < m || x >= w - m || y >= h - m { return; }

    var acc = vec3<i32>(0, 0, 0);
    for (var kx = 0u; kx < n; kx = kx + 1u) {
        let sx = x + kx - m;
        for (var ky = 0u; ky < n; ky = ky + 1u) {
            let sy = y + ky - m;
            let weight = weights[kx * n + ky];
            let base = (sy * w + sx) * c;
            acc.x = acc.x + i32(f32(src[base]) * weight);
            acc.y = acc.y + i32(f32(src[base + 1u]) * weight);
            acc.z = acc.z + i32(f32(src[base + 2u]) * weight);
        }
    }

    let out = clamp(acc, vec3<i32>(0), vec3<i32>(255));
    let base = (y * w + x) * c;
    dst[base] = u32(out.x);
    dst[base + 1u] = u32(out.y);
    dst[base + 2u] = u32(out.z);
}
"#;
