//! Backend detection and auto-selection.

use super::Backend;

/// A concrete backend as seen on this machine.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Backend type.
    pub backend: Backend,
    /// Whether it can be brought up here.
    pub available: bool,
    /// Rank for [`Backend::Auto`] (higher wins, 0 = never picked).
    pub priority: u32,
    /// One-line description.
    pub description: &'static str,
}

impl BackendInfo {
    /// Probes one backend. `None` for [`Backend::Auto`], which is a policy
    /// rather than a strategy.
    pub fn probe(backend: Backend) -> Option<Self> {
        let (rank, description) = match backend {
            Backend::Auto => return None,
            Backend::Sequential => (1, "single-threaded reference"),
            Backend::Cpu => (10, "rows split across rayon workers"),
            Backend::Wgpu => (100, "one WGSL invocation per pixel (Vulkan/Metal/DX12)"),
            Backend::Cuda => (150, "one NVRTC kernel thread per pixel"),
        };
        let available = backend.is_available();
        Some(Self {
            backend,
            available,
            priority: if available { rank } else { 0 },
            description,
        })
    }

    /// Label used in listings.
    pub fn label(&self) -> &'static str {
        match self.backend {
            Backend::Cpu => "CPU",
            Backend::Cuda => "CUDA",
            Backend::Sequential => "Sequential",
            other => other.name(),
        }
    }
}

/// Every concrete backend, best first.
pub fn detect_backends() -> Vec<BackendInfo> {
    let mut backends: Vec<BackendInfo> = Backend::ALL.into_iter().filter_map(BackendInfo::probe).collect();
    backends.sort_by(|a, b| b.priority.cmp(&a.priority));
    backends
}

/// Highest-ranked available backend; the CPU strategy when no device is usable.
pub fn select_best_backend() -> Backend {
    detect_backends()
        .into_iter()
        .find(|b| b.available && b.backend != Backend::Sequential)
        .map_or(Backend::Cpu, |b| b.backend)
}

/// One `[+]`/`[-]` line per backend.
pub fn describe_backends() -> String {
    detect_backends()
        .iter()
        .map(|info| {
            let status = if info.available { '+' } else { '-' };
            format!("[{status}] {}: {}\n", info.label(), info.description)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_by_priority() {
        let backends = detect_backends();
        assert!(backends.windows(2).all(|w| w[0].priority >= w[1].priority));
        assert!(backends.iter().any(|b| b.backend == Backend::Cpu && b.available));
    }

    #[test]
    fn test_best_is_never_sequential() {
        let best = select_best_backend();
        assert_ne!(best, Backend::Sequential);
        assert!(best.is_available());
    }

    #[test]
    fn test_auto_is_not_probed() {
        assert!(BackendInfo::probe(Backend::Auto).is_none());
        assert_eq!(detect_backends().len(), Backend::ALL.len() - 1);
    }

    #[test]
    fn test_unavailable_never_ranked() {
        for info in detect_backends() {
            assert_eq!(info.available, info.backend.is_available());
            if !info.available {
                assert_eq!(info.priority, 0);
            }
        }
    }

    #[test]
    fn test_describe_lists_cpu() {
        let desc = describe_backends();
        assert!(desc.contains("[+] CPU"));
        assert!(desc.contains("Sequential"));
    }
}
