//! Waxx Verify: signed client for the Waxx device verification API
//!
//! This is the root crate that provides benchmark and integration-test
//! access to the library. For actual functionality, use the crates directly:
//!
//! - `waxx-core`: Request signing, API client, response types, device IDs
//! - `waxx-cli`: The `waxx` command-line client

// Re-export for benchmarks
pub use waxx_core as core;
