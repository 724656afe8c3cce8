// SPDX-License-Identifier: LGPL-3.0-only
//! Icon lookup across search paths with theme inheritance.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ThemeError;
use crate::theme::{find_with_extension, IconContext, IconTheme};

/// Theme every lookup eventually falls back to.
pub const FALLBACK_THEME: &str = "hicolor";

/// Default icon file extensions, in order of preference.
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["png", "xpm"];

/// Finds icon files in XDG icon themes.
pub struct ThemeLookup {
    /// Parsed themes by id.
    themes: Mutex<HashMap<String, Arc<IconTheme>>>,
    /// Roots holding theme directories.
    search_paths: Vec<PathBuf>,
    /// Flat directories searched when no theme has the icon.
    pixmap_paths: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl ThemeLookup {
    /// Lookup over the standard locations.
    pub fn new() -> Self {
        Self::with_paths(default_search_paths(), vec![PathBuf::from("/usr/share/pixmaps")])
    }

    /// Lookup over the given theme roots and pixmap directories.
    pub fn with_paths(search_paths: Vec<PathBuf>, pixmap_paths: Vec<PathBuf>) -> Self {
        Self {
            themes: Mutex::new(HashMap::new()),
            search_paths,
            pixmap_paths,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    /// Replace the accepted file extensions (without the dot).
    pub fn set_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
    }

    /// Accepted file extensions.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Theme roots in search order.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Load a theme, reusing an earlier parse.
    pub fn load_theme(&self, theme_id: &str) -> Result<Arc<IconTheme>, ThemeError> {
        let mut themes = self.themes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(theme) = themes.get(theme_id) {
            return Ok(theme.clone());
        }
        let theme = Arc::new(IconTheme::load(theme_id, &self.search_paths)?);
        themes.insert(theme_id.to_string(), theme.clone());
        Ok(theme)
    }

    /// Forget parsed themes, e.g. after themes were installed.
    pub fn clear(&self) {
        self.themes.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Find `icon_name` in `theme_id`, its ancestors, hicolor, then the pixmap directories.
    pub fn lookup_icon(&self, icon_name: &str, size: u32, context: IconContext, theme_id: &str) -> Option<PathBuf> {
        let mut visited = HashSet::new();
        if let Some(path) = self.lookup_in_chain(icon_name, size, context, theme_id, &mut visited) {
            log::debug!("Found icon '{}' at {:?}", icon_name, path);
            return Some(path);
        }
        if !visited.contains(FALLBACK_THEME) {
            if let Some(path) = self.lookup_in_chain(icon_name, size, context, FALLBACK_THEME, &mut visited) {
                log::debug!("Found icon '{}' in {} at {:?}", icon_name, FALLBACK_THEME, path);
                return Some(path);
            }
        }
        for dir in &self.pixmap_paths {
            if let Some(path) = find_with_extension(dir, icon_name, &self.extensions) {
                log::debug!("Found icon '{}' in pixmaps at {:?}", icon_name, path);
                return Some(path);
            }
        }
        log::debug!("Icon '{}' not found in any theme", icon_name);
        None
    }

    /// Depth-first over the inheritance graph; each theme is searched once.
    fn lookup_in_chain(
        &self,
        icon_name: &str,
        size: u32,
        context: IconContext,
        theme_id: &str,
        visited: &mut HashSet<String>,
    ) -> Option<PathBuf> {
        if !visited.insert(theme_id.to_string()) {
            return None;
        }
        let theme = match self.load_theme(theme_id) {
            Ok(theme) => theme,
            Err(e) => {
                log::debug!("Skipping icon theme '{}': {}", theme_id, e);
                return None;
            },
        };
        if let Some(path) = theme.find_icon(icon_name, size, context, &self.extensions) {
            return Some(path);
        }
        for parent in &theme.inherits {
            if let Some(path) = self.lookup_in_chain(icon_name, size, context, parent, visited) {
                return Some(path);
            }
        }
        None
    }
}

impl Default for ThemeLookup {
    fn default() -> Self {
        Self::new()
    }
}

/// `~/.icons`, then `icons` under the user and system XDG data directories.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".icons"));
    }
    if let Some(data) = dirs::data_dir() {
        paths.push(data.join("icons"));
    }
    let data_dirs = std::env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|dirs| !dirs.trim().is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    for dir in data_dirs.split(':').filter(|dir| !dir.is_empty()) {
        let path = PathBuf::from(dir).join("icons");
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}
