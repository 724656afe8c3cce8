// SPDX-License-Identifier: LGPL-3.0-only
//! Interfaces of the services the cache relies on.
//!
//! Both traits are called only from worker threads and may block.

use std::fmt;
use std::path::PathBuf;

use tokio::sync::broadcast;

use crate::error::DecodeError;
use crate::image::IconImage;
use crate::request::Bound;

/// A concrete, loadable icon location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IconReference {
    /// A file on disk.
    Path(PathBuf),
    /// A URI, e.g. `file:///usr/share/pixmaps/app.png`.
    Uri(String),
}

impl fmt::Display for IconReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconReference::Path(path) => write!(f, "{}", path.display()),
            IconReference::Uri(uri) => write!(f, "{}", uri),
        }
    }
}

/// Maps a symbolic icon name to a concrete location.
pub trait IconResolver: Send + Sync {
    /// Find the best icon called `name` for a square of `size` pixels.
    fn lookup(&self, name: &str, size: u32) -> Option<IconReference>;

    /// Receiver of theme change notifications, if the resolver emits them.
    fn subscribe(&self) -> Option<broadcast::Receiver<ThemeEvent>> {
        None
    }
}

/// Turns a reference into pixels.
pub trait ImageDecoder: Send + Sync {
    /// Decode `reference`, scaled to fit the bounds.
    fn decode(
        &self,
        reference: &IconReference,
        max_width: Bound,
        max_height: Bound,
    ) -> Result<IconImage, DecodeError>;
}

/// Events emitted by an icon theme provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeEvent {
    /// The active icon theme changed; previously resolved icons are stale.
    Changed {
        /// Name of the new theme.
        theme: String,
    },
}

/// Create a new broadcast channel for theme events.
pub fn create_theme_event_channel() -> broadcast::Sender<ThemeEvent> {
    broadcast::channel(16).0
}
