//! API clients for external services.

pub mod client;

pub use client::{WaxxClient, ENDPOINT_ALL_BRANDS, ENDPOINT_DEVICE_INFO};
