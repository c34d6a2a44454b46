//! Benchmarks for the convolution strategies.
//!
//! Run with: `cargo bench -p convo-bench`
//! Add `--features wgpu` to include the GPU strategy.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use convo_compute::{Backend, ConvolutionStrategy, create_strategy};
use convo_core::{Kernel, PixelBuffer};

/// Deterministic RGB noise.
fn noise(size: u32) -> PixelBuffer {
    let mut state = 0x2545_f491u32;
    PixelBuffer::from_fn(size, size, 3, |_, _| {
        let mut px = [0u8; 4];
        for v in &mut px {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            *v = state as u8;
        }
        px
    })
    .unwrap()
}

fn strategies() -> Vec<Box<dyn ConvolutionStrategy>> {
    [Backend::Sequential, Backend::Cpu, Backend::Wgpu, Backend::Cuda]
        .into_iter()
        .filter_map(|b| create_strategy(b, 0).ok())
        .collect()
}

/// Benchmark every available strategy on square RGB images.
fn bench_strategies(c: &mut Criterion) {
    let strategies = strategies();
    let kernels = [("blur3", Kernel::box_blur(3)), ("gaussian5", Kernel::gaussian5())];

    for (kernel_name, kernel) in &kernels {
        let mut group = c.benchmark_group(format!("convolve_{kernel_name}"));
        group.sample_size(20);

        for size in [512u32, 1024] {
            let img = noise(size);
            group.throughput(Throughput::Elements(u64::from(size) * u64::from(size)));

            for strategy in &strategies {
                group.bench_with_input(BenchmarkId::new(strategy.name(), size), &img, |b, img| {
                    b.iter(|| strategy.apply(black_box(img), black_box(kernel)).unwrap())
                });
            }
        }

        group.finish();
    }
}

/// Benchmark CPU scaling with explicit worker counts.
fn bench_cpu_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_threads");
    group.sample_size(20);

    let img = noise(1024);
    let kernel = Kernel::gaussian5();
    group.throughput(Throughput::Elements(1024 * 1024));

    for threads in [1usize, 2, 4, 8] {
        let Ok(strategy) = create_strategy(Backend::Cpu, threads) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(threads), &img, |b, img| {
            b.iter(|| strategy.apply(black_box(img), &kernel).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_cpu_threads);
criterion_main!(benches);
