//! Response types for the Waxx API.

pub mod brand;
pub mod response;

pub use brand::*;
pub use response::*;
