// SPDX-License-Identifier: LGPL-3.0-only
//! Error types for icon theme handling.

use std::path::PathBuf;

/// Errors that can occur while loading icon themes.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    /// No search path contains a loadable theme with this name.
    #[error("Icon theme '{0}' not found")]
    ThemeNotFound(String),

    /// The theme's `index.theme` is unusable.
    #[error("Failed to parse {path}: {reason}")]
    IndexParseError {
        /// The offending index file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
