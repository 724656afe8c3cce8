// SPDX-License-Identifier: LGPL-3.0-only
//! [`IconResolver`] backed by the XDG icon theme lookup.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use nptk_icons_core::{create_theme_event_channel, IconReference, IconResolver, ThemeEvent};
use tokio::sync::broadcast;

use crate::error::ThemeError;
use crate::lookup::{ThemeLookup, FALLBACK_THEME};
use crate::theme::IconContext;

/// Resolves icon names against the active XDG icon theme.
///
/// Switching themes with [`set_theme`](Self::set_theme) notifies every
/// subscribed cache, which then drops its cached icons.
pub struct XdgIconResolver {
    lookup: ThemeLookup,
    theme: RwLock<String>,
    events: broadcast::Sender<ThemeEvent>,
}

impl XdgIconResolver {
    /// Resolver for `theme` over the standard locations.
    pub fn new(theme: &str) -> Result<Self, ThemeError> {
        Self::with_lookup(ThemeLookup::new(), theme)
    }

    /// Resolver for `theme` over custom theme roots and pixmap directories.
    pub fn with_paths(theme: &str, search_paths: Vec<PathBuf>, pixmap_paths: Vec<PathBuf>) -> Result<Self, ThemeError> {
        Self::with_lookup(ThemeLookup::with_paths(search_paths, pixmap_paths), theme)
    }

    /// Resolver using a prepared lookup.
    pub fn with_lookup(lookup: ThemeLookup, theme: &str) -> Result<Self, ThemeError> {
        lookup.load_theme(theme)?;
        log::info!("Using icon theme '{}'", theme);
        Ok(Self {
            lookup,
            theme: RwLock::new(theme.to_string()),
            events: create_theme_event_channel(),
        })
    }

    /// Resolver for the first theme of `preferred` that exists, else hicolor.
    pub fn with_fallbacks(preferred: &[&str]) -> Result<Self, ThemeError> {
        let lookup = ThemeLookup::new();
        let theme = preferred
            .iter()
            .copied()
            .find(|theme| lookup.load_theme(theme).is_ok())
            .unwrap_or(FALLBACK_THEME)
            .to_string();
        Self::with_lookup(lookup, &theme)
    }

    /// Accept only these file extensions (e.g. add `svg` for a decoder that renders it).
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lookup.set_extensions(extensions);
        self
    }

    /// Name of the active theme.
    pub fn theme(&self) -> String {
        self.theme.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Switch to another theme and notify subscribers.
    ///
    /// Fails, keeping the current theme, when `theme` cannot be loaded.
    pub fn set_theme(&self, theme: &str) -> Result<(), ThemeError> {
        self.lookup.load_theme(theme)?;
        {
            let mut current = self.theme.write().unwrap_or_else(PoisonError::into_inner);
            if *current == theme {
                return Ok(());
            }
            *current = theme.to_string();
        }
        log::info!("Icon theme switched to '{}'", theme);
        // Err only means nobody is subscribed.
        let _ = self.events.send(ThemeEvent::Changed {
            theme: theme.to_string(),
        });
        Ok(())
    }

    /// The underlying lookup.
    pub fn theme_lookup(&self) -> &ThemeLookup {
        &self.lookup
    }
}

impl IconResolver for XdgIconResolver {
    fn lookup(&self, name: &str, size: u32) -> Option<IconReference> {
        let theme = self.theme();
        self.lookup
            .lookup_icon(name, size, IconContext::guess(name), &theme)
            .map(IconReference::Path)
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<ThemeEvent>> {
        Some(self.events.subscribe())
    }
}
