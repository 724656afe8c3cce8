// SPDX-License-Identifier: LGPL-3.0-only
//! Error types for the icon cache.
//!
//! None of these reach callers: a failed request is reported by calling its
//! callback with `None`. They exist for logging and for collaborators.

/// Why a request was refused before entering the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// The identifier is empty or whitespace.
    #[error("empty identifier")]
    EmptyIdentifier,
    /// A bound is smaller than the minimum icon size.
    #[error("bounds below the minimum icon size")]
    UndersizedBounds,
    /// Nobody would receive the result.
    #[error("request has no callback")]
    MissingCallback,
}

/// Errors reported by an [`ImageDecoder`](crate::ImageDecoder).
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Reading the icon bytes failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes could not be decoded.
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    /// The decoder does not handle this format.
    #[error("Unsupported icon format: {0}")]
    UnsupportedFormat(String),

    /// The decoder cannot fetch this URI.
    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    /// Decoding produced no pixels.
    #[error("Decoded image is empty")]
    EmptyImage,
}

/// Errors that can occur while producing an icon.
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    /// The request was refused.
    #[error("Request rejected: {0}")]
    Rejected(#[from] RejectReason),

    /// The resolver found no icon for the name.
    #[error("No icon found for '{0}'")]
    ResolutionFailure(String),

    /// The icon was found but could not be decoded.
    #[error("Failed to decode '{identifier}': {source}")]
    Decode {
        /// What was being decoded.
        identifier: String,
        /// Underlying decoder error.
        #[source]
        source: DecodeError,
    },

    /// A composite icon's base image failed.
    #[error("Base icon '{0}' of composite failed")]
    DependentFailure(String),

    /// The identifier cannot be interpreted for its kind.
    #[error("Malformed identifier '{identifier}': {reason}")]
    MalformedIdentifier {
        /// The offending identifier.
        identifier: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A worker job panicked or was cancelled.
    #[error("Icon worker failed: {0}")]
    WorkerFailed(String),

    /// The worker pool could not be started.
    #[error("Failed to start icon workers: {0}")]
    WorkerStartup(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_names_the_reason() {
        let error = IconError::from(RejectReason::UndersizedBounds);
        assert!(matches!(error, IconError::Rejected(RejectReason::UndersizedBounds)));
        assert_eq!(error.to_string(), format!("Request rejected: {}", RejectReason::UndersizedBounds));
    }
}
