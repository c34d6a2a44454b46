//! Integration tests for convo crates.
//!
//! End-to-end checks that cross crate boundaries: decode with `convo-io`,
//! convolve with `convo-compute`, encode again, and compare every strategy
//! the build can bring up.

#[cfg(test)]
mod golden;
