//! Waxx Core Library
//!
//! Request signing, the signed API client, and response types for the Waxx
//! device verification flow.

pub mod api;
pub mod config;
pub mod device_id;
pub mod error;
pub mod signing;
pub mod types;

pub use error::{Error, Result};
