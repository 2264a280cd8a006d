// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Error types for cl-core operations.

use thiserror::Error;

/// All possible errors that can occur in cl-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("invalid HTTP method: '{0}'\n  hint: valid methods are: POST, PUT, PATCH, DELETE")]
    InvalidMethod(String),

    #[error("invalid URL: {0}\n  hint: the base URL must use the http or https scheme")]
    InvalidUrl(String),
}

/// A specialized Result type for cl-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
