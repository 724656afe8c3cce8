// SPDX-License-Identifier: LGPL-3.0-only
//! XDG icon theme index parsing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ThemeError;

/// Penalty added to directories that would have to upscale.
const UPSCALE_PENALTY: u32 = 10_000;

/// Icon context (directory category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconContext {
    /// Actions context.
    Actions,
    /// Applications context.
    Apps,
    /// Devices context.
    Devices,
    /// Emblems context.
    Emblems,
    /// Emotes context.
    Emotes,
    /// MIME types context.
    Mimetypes,
    /// Places context.
    Places,
    /// Status context.
    Status,
    /// Unknown context.
    Unknown,
}

impl IconContext {
    /// Parse the `Context` key of a directory section.
    pub fn parse(s: &str) -> Self {
        match s {
            "Actions" => Self::Actions,
            "Applications" | "Apps" => Self::Apps,
            "Devices" => Self::Devices,
            "Emblems" => Self::Emblems,
            "Emotes" => Self::Emotes,
            "MimeTypes" | "Mimetypes" => Self::Mimetypes,
            "Places" => Self::Places,
            "Status" => Self::Status,
            _ => Self::Unknown,
        }
    }

    /// Guess the context of an icon from its name.
    pub fn guess(icon_name: &str) -> Self {
        if icon_name.starts_with("folder") || icon_name.contains("directory") || icon_name.starts_with("user-") {
            Self::Places
        } else if icon_name.starts_with("media-") || icon_name.starts_with("drive-") {
            Self::Devices
        } else if icon_name.starts_with("emblem-") {
            Self::Emblems
        } else if icon_name.starts_with("emote-") || icon_name.starts_with("face-") {
            Self::Emotes
        } else if ["text-", "image-", "application-", "video-", "audio-", "font-"]
            .iter()
            .any(|prefix| icon_name.starts_with(prefix))
        {
            Self::Mimetypes
        } else if icon_name.starts_with("dialog-") {
            Self::Status
        } else {
            Self::Unknown
        }
    }
}

/// Directory type for icon directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryType {
    /// Holds icons of exactly one size.
    Fixed,
    /// Holds icons usable between `MinSize` and `MaxSize`.
    Scalable,
    /// Holds icons usable within `Threshold` of their size.
    Threshold,
}

impl DirectoryType {
    /// Parse the `Type` key; unknown values count as the default `Threshold`.
    pub fn parse(s: &str) -> Self {
        match s {
            "Fixed" => Self::Fixed,
            "Scalable" => Self::Scalable,
            _ => Self::Threshold,
        }
    }
}

/// One directory of a theme, as declared in `index.theme`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconDirectory {
    /// Directory name, relative to the theme root.
    pub name: String,
    /// Nominal size of icons in this directory.
    pub size: u32,
    /// Scale factor (usually 1).
    pub scale: u32,
    /// Context of icons.
    pub context: IconContext,
    /// Directory type.
    pub directory_type: DirectoryType,
    /// Smallest usable size (scalable directories).
    pub min_size: u32,
    /// Largest usable size (scalable directories).
    pub max_size: u32,
    /// Allowed size difference (threshold directories).
    pub threshold: u32,
}

impl IconDirectory {
    /// How badly this directory fits `size`; lower is better, 0 is exact.
    ///
    /// Directories that would need upscaling always lose against ones that
    /// can downscale.
    pub fn match_score(&self, size: u32) -> u32 {
        match self.directory_type {
            DirectoryType::Fixed => size_distance(self.size, size),
            DirectoryType::Scalable => {
                if size < self.min_size {
                    self.min_size - size
                } else if size > self.max_size {
                    size - self.max_size
                } else {
                    size_distance(self.size, size)
                }
            },
            DirectoryType::Threshold => {
                if self.size.abs_diff(size) <= self.threshold {
                    0
                } else {
                    size_distance(self.size, size)
                }
            },
        }
    }
}

fn size_distance(available: u32, wanted: u32) -> u32 {
    if available >= wanted {
        available - wanted
    } else {
        wanted - available + UPSCALE_PENALTY
    }
}

/// A parsed icon theme.
#[derive(Debug, Clone)]
pub struct IconTheme {
    /// Internal theme name (its directory name).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Themes to fall back to, in order.
    pub inherits: Vec<String>,
    /// Directories in this theme.
    pub directories: Vec<IconDirectory>,
    /// Every root holding this theme, in search path order.
    pub base_paths: Vec<PathBuf>,
}

impl IconTheme {
    /// Load the theme `id` from the first of `roots` that has an `index.theme`.
    ///
    /// The remaining roots that contain a directory named `id` are kept as
    /// additional locations for icon files.
    pub fn load(id: &str, roots: &[PathBuf]) -> Result<Self, ThemeError> {
        let candidates: Vec<PathBuf> = roots
            .iter()
            .map(|root| root.join(id))
            .filter(|dir| dir.is_dir())
            .collect();

        let Some(index_path) = candidates
            .iter()
            .map(|dir| dir.join("index.theme"))
            .find(|index| index.is_file())
        else {
            return Err(ThemeError::ThemeNotFound(id.to_string()));
        };

        let content = std::fs::read_to_string(&index_path)?;
        let mut theme = Self::parse(id, &content).map_err(|reason| ThemeError::IndexParseError {
            path: index_path.clone(),
            reason,
        })?;
        theme.base_paths = candidates;
        log::debug!(
            "Loaded icon theme '{}' with {} directories from {:?}",
            id,
            theme.directories.len(),
            index_path
        );
        Ok(theme)
    }

    /// Parse the contents of an `index.theme` file.
    pub fn parse(id: &str, content: &str) -> Result<Self, String> {
        let ini = parse_ini(content);
        let theme_section = ini
            .get("Icon Theme")
            .ok_or_else(|| "missing [Icon Theme] section".to_string())?;

        let name = theme_section.get("Name").cloned().unwrap_or_else(|| id.to_string());
        let inherits = split_list(theme_section.get("Inherits"));
        let mut directory_names = split_list(theme_section.get("Directories"));
        directory_names.extend(split_list(theme_section.get("ScaledDirectories")));
        if directory_names.is_empty() {
            return Err("missing Directories key".to_string());
        }

        let directories = directory_names
            .into_iter()
            .filter_map(|dir_name| {
                let section = ini.get(dir_name.as_str())?;
                let number = |key: &str| section.get(key).and_then(|v| v.parse::<u32>().ok());
                let size = number("Size")?;
                Some(IconDirectory {
                    size,
                    scale: number("Scale").unwrap_or(1),
                    context: IconContext::parse(section.get("Context").map_or("", String::as_str)),
                    directory_type: DirectoryType::parse(section.get("Type").map_or("Threshold", String::as_str)),
                    min_size: number("MinSize").unwrap_or(size),
                    max_size: number("MaxSize").unwrap_or(size),
                    threshold: number("Threshold").unwrap_or(2),
                    name: dir_name,
                })
            })
            .collect();

        Ok(Self {
            id: id.to_string(),
            name,
            inherits,
            directories,
            base_paths: Vec::new(),
        })
    }

    /// Directories of this theme ordered from best to worst fit for `size`.
    ///
    /// Directories of `context` come first, then those of unknown context,
    /// then the rest.
    pub fn directories_for(&self, size: u32, context: IconContext) -> Vec<&IconDirectory> {
        let rank = |dir: &IconDirectory| {
            let context_rank = if dir.context == context {
                0
            } else if dir.context == IconContext::Unknown {
                1
            } else {
                2
            };
            (context_rank, dir.scale != 1, dir.match_score(size))
        };
        let mut directories: Vec<&IconDirectory> = self.directories.iter().collect();
        directories.sort_by_key(|dir| rank(*dir));
        directories
    }

    /// Find `icon_name` with one of `extensions` in the directories of this theme.
    pub fn find_icon(&self, icon_name: &str, size: u32, context: IconContext, extensions: &[String]) -> Option<PathBuf> {
        for dir in self.directories_for(size, context) {
            for base in &self.base_paths {
                if let Some(path) = find_with_extension(&base.join(&dir.name), icon_name, extensions) {
                    return Some(path);
                }
            }
        }
        None
    }
}

/// First existing `dir/name.ext` for the given extensions.
pub(crate) fn find_with_extension(dir: &Path, icon_name: &str, extensions: &[String]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{}.{}", icon_name, ext)))
        .find(|path| path.is_file())
}

fn split_list(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Minimal INI reader for `index.theme`.
fn parse_ini(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = Some(section.to_string());
            sections.entry(section.to_string()).or_default();
            continue;
        }
        if let (Some(section), Some((key, value))) = (current.as_ref(), line.split_once('=')) {
            if let Some(entries) = sections.get_mut(section) {
                entries.entry(key.trim().to_string()).or_insert_with(|| value.trim().to_string());
            }
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
[Icon Theme]
Name=Test Theme
Comment=For tests
Inherits=Parent, hicolor
Directories=16x16/apps,48x48/apps,scalable/apps,32x32/places,broken

[16x16/apps]
Size=16
Context=Applications
Type=Fixed

[48x48/apps]
Size=48
Context=Applications
Type=Fixed

[scalable/apps]
Size=64
MinSize=8
MaxSize=512
Context=Applications
Type=Scalable

[32x32/places]
Size=32
Context=Places
"#;

    fn directory(directory_type: DirectoryType, size: u32) -> IconDirectory {
        IconDirectory {
            name: format!("{}", size),
            size,
            scale: 1,
            context: IconContext::Unknown,
            directory_type,
            min_size: 8,
            max_size: 512,
            threshold: 2,
        }
    }

    #[test]
    fn test_parse_index_theme() {
        let theme = IconTheme::parse("test", INDEX).unwrap();
        assert_eq!(theme.name, "Test Theme");
        assert_eq!(theme.inherits, vec!["Parent".to_string(), "hicolor".to_string()]);
        // `broken` has no section and is skipped.
        assert_eq!(theme.directories.len(), 4);

        let places = &theme.directories[3];
        assert_eq!(places.context, IconContext::Places);
        assert_eq!(places.directory_type, DirectoryType::Threshold);
        assert_eq!(places.threshold, 2);
    }

    #[test]
    fn test_parse_requires_theme_section() {
        assert!(IconTheme::parse("test", "[Other]\nName=x\n").is_err());
        assert!(IconTheme::parse("test", "[Icon Theme]\nName=x\n").is_err());
    }

    #[test]
    fn test_scores_prefer_downscaling() {
        let exact = directory(DirectoryType::Fixed, 32);
        let larger = directory(DirectoryType::Fixed, 48);
        let smaller = directory(DirectoryType::Fixed, 24);
        assert_eq!(exact.match_score(32), 0);
        assert!(larger.match_score(32) < smaller.match_score(32));

        let threshold = directory(DirectoryType::Threshold, 32);
        assert_eq!(threshold.match_score(30), 0);
        assert_eq!(threshold.match_score(36), 4 + UPSCALE_PENALTY);

        let scalable = directory(DirectoryType::Scalable, 64);
        assert_eq!(scalable.match_score(600), 88);
        assert_eq!(scalable.match_score(4), 4);
    }

    #[test]
    fn test_directories_for_orders_by_context_then_size() {
        let theme = IconTheme::parse("test", INDEX).unwrap();
        let names: Vec<&str> = theme
            .directories_for(48, IconContext::Apps)
            .iter()
            .map(|dir| dir.name.as_str())
            .collect();
        assert_eq!(names, vec!["48x48/apps", "scalable/apps", "16x16/apps", "32x32/places"]);
    }

    #[test]
    fn test_guess_context() {
        assert_eq!(IconContext::guess("folder-documents"), IconContext::Places);
        assert_eq!(IconContext::guess("drive-harddisk"), IconContext::Devices);
        assert_eq!(IconContext::guess("text-x-generic"), IconContext::Mimetypes);
        assert_eq!(IconContext::guess("emblem-shared"), IconContext::Emblems);
        assert_eq!(IconContext::guess("firefox"), IconContext::Unknown);
    }
}
