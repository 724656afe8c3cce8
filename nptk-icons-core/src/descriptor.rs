// SPDX-License-Identifier: LGPL-3.0-only
//! Structured icon descriptors.
//!
//! A descriptor is a single line in one of these shapes:
//!
//! - `{ base = "folder", ribbon = "New", category = "emblem-games", tint = "#3584e4" }`:
//!   an annotated icon, written as a TOML inline table. `base` is itself a
//!   descriptor; the other keys are optional.
//! - `scheme://...`: a URI.
//! - `/absolute/path.png`: a local file.
//! - `name1 name2 ...`: themed names, tried in order.

use std::path::PathBuf;

use serde::Deserialize;

use crate::uri::uri_scheme;

/// A parsed structured descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    /// Themed names in order of preference.
    Themed(Vec<String>),
    /// Content behind a URI.
    Uri(String),
    /// A local file.
    Path(PathBuf),
    /// A base icon decorated with ribbon, emblem and tint.
    Annotated(Annotation),
}

/// Decorations of an annotated icon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Annotation {
    /// Descriptor of the icon being decorated.
    pub base: String,
    /// Text drawn in a band along the bottom edge.
    #[serde(default)]
    pub ribbon: Option<String>,
    /// Themed name of an emblem drawn in the bottom-right corner.
    #[serde(default)]
    pub category: Option<String>,
    /// Colour the base is tinted with.
    #[serde(default)]
    pub tint: Option<Tint>,
}

impl Annotation {
    /// Ribbon text, if any non-blank text was given.
    pub fn ribbon_text(&self) -> Option<&str> {
        self.ribbon.as_deref().map(str::trim).filter(|text| !text.is_empty())
    }

    /// Emblem name, if any.
    pub fn emblem(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }
}

/// An opaque RGB colour parsed from `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Tint(pub [u8; 3]);

impl TryFrom<String> for Tint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6)
            .ok_or_else(|| format!("tint '{}' is not #rrggbb", value))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("tint '{}' is not #rrggbb", value))
        };
        Ok(Tint([channel(0)?, channel(2)?, channel(4)?]))
    }
}

#[derive(Deserialize)]
struct AnnotatedDocument {
    icon: Annotation,
}

impl Descriptor {
    /// Parse a descriptor string.
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err("empty descriptor".to_string());
        }

        if input.starts_with('{') {
            let document: AnnotatedDocument =
                toml::from_str(&format!("icon = {}", input)).map_err(|e| e.message().to_string())?;
            if document.icon.base.trim().is_empty() {
                return Err("annotated icon has an empty base".to_string());
            }
            return Ok(Descriptor::Annotated(document.icon));
        }

        if uri_scheme(input).is_some() {
            return Ok(Descriptor::Uri(input.to_string()));
        }

        if input.starts_with('/') {
            return Ok(Descriptor::Path(PathBuf::from(input)));
        }

        let names: Vec<String> = input.split_whitespace().map(str::to_string).collect();
        Ok(Descriptor::Themed(names))
    }
}

/// Strip a raster image extension from a themed name.
///
/// Applications sometimes ask for `foo.png` where the theme only has `foo`.
pub fn strip_raster_extension(name: &str) -> Option<&str> {
    const RASTER_EXTENSIONS: [&str; 4] = [".png", ".xpm", ".gif", ".jpg"];
    RASTER_EXTENSIONS.iter().find_map(|ext| {
        let split = name.len().checked_sub(ext.len())?;
        let (stem, suffix) = (name.get(..split)?, name.get(split..)?);
        (suffix.eq_ignore_ascii_case(ext) && !stem.is_empty()).then_some(stem)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_themed_list() {
        assert_eq!(
            Descriptor::parse("text-x-rust text-x-generic").unwrap(),
            Descriptor::Themed(vec!["text-x-rust".into(), "text-x-generic".into()])
        );
    }

    #[test]
    fn test_parse_uri_and_path() {
        assert_eq!(
            Descriptor::parse("file:///tmp/a.png").unwrap(),
            Descriptor::Uri("file:///tmp/a.png".into())
        );
        assert_eq!(
            Descriptor::parse("/tmp/a.png").unwrap(),
            Descriptor::Path(PathBuf::from("/tmp/a.png"))
        );
    }

    #[test]
    fn test_parse_annotated() {
        let parsed = Descriptor::parse(
            r##"{ base = "firefox", ribbon = "New", category = "emblem-web", tint = "#ff8000" }"##,
        )
        .unwrap();
        let Descriptor::Annotated(annotation) = parsed else {
            panic!("expected annotated descriptor");
        };
        assert_eq!(annotation.base, "firefox");
        assert_eq!(annotation.ribbon_text(), Some("New"));
        assert_eq!(annotation.emblem(), Some("emblem-web"));
        assert_eq!(annotation.tint, Some(Tint([0xff, 0x80, 0x00])));
    }

    #[test]
    fn test_parse_annotated_errors() {
        assert!(Descriptor::parse(r#"{ ribbon = "x" }"#).is_err());
        assert!(Descriptor::parse(r#"{ base = "" }"#).is_err());
        assert!(Descriptor::parse(r#"{ base = "a", tint = "red" }"#).is_err());
        assert!(Descriptor::parse(r#"{ base = "a", size = 3 }"#).is_err());
        assert!(Descriptor::parse("{ base = ").is_err());
        assert!(Descriptor::parse("   ").is_err());
    }

    #[test]
    fn test_strip_raster_extension() {
        assert_eq!(strip_raster_extension("firefox.png"), Some("firefox"));
        assert_eq!(strip_raster_extension("gimp.XPM"), Some("gimp"));
        assert_eq!(strip_raster_extension("photo.jpg"), Some("photo"));
        assert_eq!(strip_raster_extension("firefox.svg"), None);
        assert_eq!(strip_raster_extension(".png"), None);
        assert_eq!(strip_raster_extension("firefox"), None);
    }
}
