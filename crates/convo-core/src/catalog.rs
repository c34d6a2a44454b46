//! Named filter kernels.
//!
//! [`FilterCatalog`] maps a filter name to an immutable [`Kernel`]. It is
//! built once (usually [`FilterCatalog::standard`]) and passed explicitly to
//! whoever needs to look kernels up; there is no global registry.
//!
//! Lookups are forgiving about spelling: case, `-`, `_` and spaces are
//! ignored, and a few long-form aliases are accepted (`EdgeDetection`,
//! `box-blur`).
//!
//! # Example
//!
//! ```rust
//! use convo_core::FilterCatalog;
//!
//! let catalog = FilterCatalog::standard();
//! let k = catalog.kernel("EdgeDetection").unwrap();
//! assert_eq!(k.size(), 3);
//! assert!(catalog.get("glow").is_none());
//! ```

use std::collections::BTreeMap;

use crate::{CoreError, CoreResult, Kernel};

/// Filters applied by a full run, in order.
pub const STANDARD_FILTERS: [&str; 5] = ["edge-detect", "blur", "sharpen", "emboss", "outline"];

/// Immutable name -> kernel map.
#[derive(Debug, Clone, Default)]
pub struct FilterCatalog {
    kernels: BTreeMap<String, Kernel>,
}

impl FilterCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in kernels:
    /// `identity`, `blur`, `gaussian`, `sharpen`, `edge-detect`, `emboss`, `outline`.
    pub fn standard() -> Self {
        Self::new()
            .with("identity", Kernel::identity(1))
            .with("blur", Kernel::box_blur(3))
            .with("gaussian", Kernel::gaussian5())
            .with("sharpen", Kernel::sharpen())
            .with("edge-detect", Kernel::edge_detect())
            .with("emboss", Kernel::emboss())
            .with("outline", Kernel::outline())
    }

    /// Returns the catalog with `kernel` registered under `name`.
    ///
    /// An existing entry with the same name is replaced.
    pub fn with(mut self, name: impl Into<String>, kernel: Kernel) -> Self {
        self.kernels.insert(name.into(), kernel);
        self
    }

    /// Kernel registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Kernel> {
        if let Some(k) = self.kernels.get(name) {
            return Some(k);
        }
        let wanted = canonical(name);
        self.kernels
            .iter()
            .find(|(key, _)| canonical(key) == wanted)
            .map(|(_, k)| k)
    }

    /// Like [`get`](Self::get) but reports unknown names as an error.
    pub fn kernel(&self, name: &str) -> CoreResult<&Kernel> {
        self.get(name).ok_or_else(|| CoreError::UnknownFilter {
            name: name.to_string(),
            available: self.names().collect::<Vec<_>>().join(", "),
        })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kernels.keys().map(String::as_str)
    }

    /// `(name, kernel)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Kernel)> {
        self.kernels.iter().map(|(n, k)| (n.as_str(), k))
    }

    /// Number of registered kernels.
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// `true` when no kernels are registered.
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

/// Lowercase, drop separators, fold aliases.
fn canonical(name: &str) -> String {
    let folded: String = name
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect();
    match folded.as_str() {
        "edgedetection" | "edges" | "laplacian" => "edgedetect".to_string(),
        "boxblur" | "box" => "blur".to_string(),
        "gaussianblur" | "gauss" => "gaussian".to_string(),
        _ => folded,
    }
}
