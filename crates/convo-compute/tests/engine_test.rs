//! Engine tests for convo-compute.

use convo_compute::{
    Backend, ComputeError, ConvolutionEngine, ConvolutionStrategy, DataParallelCpu, Sequential,
    UndersizedPolicy, create_strategy, describe_backends,
};
use convo_core::{FilterCatalog, Kernel, PixelBuffer};

/// Deterministic pseudo-random image.
fn noise(width: u32, height: u32, channels: u32, seed: u32) -> PixelBuffer {
    let mut state = seed | 1;
    PixelBuffer::from_fn(width, height, channels, |_, _| {
        let mut px = [0u8; 4];
        for v in &mut px {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            *v = (state >> 24) as u8;
        }
        px
    })
    .unwrap()
}

/// Every strategy this build can bring up.
fn strategies() -> Vec<Box<dyn ConvolutionStrategy>> {
    let mut out: Vec<Box<dyn ConvolutionStrategy>> = vec![
        Box::new(Sequential),
        Box::new(DataParallelCpu::new()),
        Box::new(DataParallelCpu::with_threads(3).unwrap()),
    ];
    for backend in [Backend::Wgpu, Backend::Cuda] {
        match create_strategy(backend, 0) {
            Ok(s) => out.push(s),
            Err(e) => println!("skipping {backend}: {e}"),
        }
    }
    out
}

#[test]
fn test_cpu_backend_available() {
    assert!(Backend::Cpu.is_available());
}

#[test]
fn test_auto_backend() {
    let engine = ConvolutionEngine::auto().unwrap();
    println!("Auto-selected backend: {}", engine.backend_name());
}

#[test]
fn test_describe_backends() {
    let desc = describe_backends();
    println!("{desc}");
    assert!(desc.contains("CPU"));
}

#[test]
fn test_identity_returns_identical_buffer() {
    let img = noise(31, 17, 3, 7);
    for strategy in strategies() {
        let out = strategy.apply(&img, &Kernel::identity(1)).unwrap();
        assert_eq!(out, img, "{}", strategy.name());
    }
}

#[test]
fn test_border_invariance() {
    let img = noise(40, 25, 4, 11);
    let catalog = FilterCatalog::standard();
    for (name, kernel) in catalog.iter() {
        let m = kernel.margin() as u32;
        for strategy in strategies() {
            let out = strategy.apply(&img, kernel).unwrap();
            for y in 0..img.height() {
                for x in 0..img.width() {
                    let border = x < m || y < m || x >= img.width() - m || y >= img.height() - m;
                    if border {
                        assert_eq!(
                            out.pixel(x, y),
                            img.pixel(x, y),
                            "{name} on {} changed border pixel ({x}, {y})",
                            strategy.name()
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_alpha_passthrough() {
    let img = noise(20, 20, 4, 3);
    for strategy in strategies() {
        let out = strategy.apply(&img, &Kernel::sharpen()).unwrap();
        for y in 0..20 {
            for x in 0..20 {
                assert_eq!(out.sample(x, y, 3), img.sample(x, y, 3));
            }
        }
    }
}

#[test]
fn test_strategy_equivalence() {
    let catalog = FilterCatalog::standard();
    for (seed, channels) in [(1, 3), (2, 4), (5, 3)] {
        let img = noise(67, 45, channels, seed);
        for (name, kernel) in catalog.iter() {
            let expected = Sequential.apply(&img, kernel).unwrap();
            for strategy in strategies() {
                assert_eq!(
                    strategy.apply(&img, kernel).unwrap(),
                    expected,
                    "{name} differs on {}",
                    strategy.name()
                );
            }
        }
    }
}

#[test]
fn test_clamping_never_wraps() {
    // Single bright pixel in a dark field
    let img = PixelBuffer::from_fn(5, 5, 3, |x, y| {
        if (x, y) == (2, 2) { [200, 200, 200, 0] } else { [0, 0, 0, 0] }
    })
    .unwrap();
    for strategy in strategies() {
        let out = strategy.apply(&img, &Kernel::sharpen()).unwrap();
        // 5 * 200 = 1000 saturates
        assert_eq!(out.pixel(2, 2), &[255, 255, 255]);
        // -200 saturates at zero
        assert_eq!(out.pixel(1, 2), &[0, 0, 0]);
        assert_eq!(out.pixel(2, 3), &[0, 0, 0]);
    }
}

#[test]
fn test_large_weights_saturate_without_overflow() {
    // 9 * trunc(255 * 9e5) = 2_065_500_000 still fits the accumulator
    let kernel = Kernel::new(vec![9.0e5; 9], 3).unwrap();
    let white = PixelBuffer::filled(3, 3, 3, &[255, 255, 255]).unwrap();
    let negative = Kernel::new(vec![-9.0e5; 9], 3).unwrap();
    for strategy in strategies() {
        assert_eq!(strategy.apply(&white, &kernel).unwrap().pixel(1, 1), &[255, 255, 255]);
        assert_eq!(strategy.apply(&white, &negative).unwrap().pixel(1, 1), &[0, 0, 0]);
    }
    // One step further cannot be built at all
    assert!(Kernel::new(vec![1.3e6; 9], 3).is_err());
}

#[test]
fn test_center_impulse_idempotent() {
    let img = noise(16, 16, 3, 9);
    let kernel = Kernel::identity(5);
    for strategy in strategies() {
        let once = strategy.apply(&img, &kernel).unwrap();
        let twice = strategy.apply(&once, &kernel).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, img);
    }
}

#[test]
fn test_white_box_blur_scenario() {
    let white = PixelBuffer::filled(5, 5, 3, &[255, 255, 255]).unwrap();
    for strategy in strategies() {
        let out = strategy.apply(&white, &Kernel::box_blur(3)).unwrap();
        assert_eq!(out.dimensions(), (5, 5, 3));
        for y in 0..5 {
            for x in 0..5 {
                let interior = (1..4).contains(&x) && (1..4).contains(&y);
                // Nine terms of trunc(255 / 9) = 28, no wrap-around
                let expected = if interior { [252; 3] } else { [255; 3] };
                assert_eq!(out.pixel(x, y), &expected, "({x}, {y}) on {}", strategy.name());
            }
        }
    }
}

#[test]
fn test_source_untouched() {
    let img = noise(12, 12, 3, 4);
    let copy = img.clone();
    let engine = ConvolutionEngine::cpu().unwrap();
    let _ = engine.apply(&img, &Kernel::outline()).unwrap();
    assert_eq!(img, copy);
}

#[test]
fn test_undersized_policies() {
    let tiny = noise(4, 3, 3, 2);
    let kernel = Kernel::gaussian5();

    let lenient = ConvolutionEngine::builder().backend(Backend::Cpu).build().unwrap();
    assert_eq!(lenient.apply(&tiny, &kernel).unwrap(), tiny);

    let strict = ConvolutionEngine::builder()
        .backend(Backend::Cpu)
        .undersized(UndersizedPolicy::Reject)
        .build()
        .unwrap();
    let err = strict.apply(&tiny, &kernel).unwrap_err();
    assert!(matches!(err, ComputeError::ImageTooSmall { min: 5, .. }));
}

#[test]
fn test_engine_thread_counts() {
    let img = noise(50, 70, 3, 8);
    let kernel = Kernel::box_blur(5);
    let expected = ConvolutionEngine::sequential().apply(&img, &kernel).unwrap();
    for threads in [1, 2, 4, 7] {
        let engine = ConvolutionEngine::builder()
            .backend(Backend::Cpu)
            .threads(threads)
            .build()
            .unwrap();
        assert_eq!(engine.apply(&img, &kernel).unwrap(), expected);
    }
}

#[test]
fn test_engine_shared_across_threads() {
    let engine = ConvolutionEngine::cpu().unwrap();
    let img = noise(30, 30, 3, 6);
    let kernel = Kernel::emboss();
    let expected = engine.apply(&img, &kernel).unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| assert_eq!(engine.apply(&img, &kernel).unwrap(), expected));
        }
    });
}
