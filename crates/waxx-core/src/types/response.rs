//! The JSON envelope every API response is wrapped in.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// `{ "success": bool, "data": ..., "message": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload of a successful response.
    ///
    /// A response that is unsuccessful or carries no data becomes an
    /// `Error::Api` with the server's message, or `fallback` if it sent none.
    #[allow(clippy::result_large_err)]
    pub fn into_data(self, fallback: &str) -> Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(Error::Api {
                message: self
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
                status: None,
            }),
        }
    }
}
