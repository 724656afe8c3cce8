// SPDX-License-Identifier: LGPL-3.0-only
//! [`ImageDecoder`] for raster image files.

use std::path::{Path, PathBuf};

use nptk_icons_core::uri::{uri_scheme, uri_to_path};
use nptk_icons_core::{Bound, DecodeError, IconImage, IconReference, ImageDecoder};

use crate::io_helpers;

/// Decodes local raster images with the `image` crate.
///
/// Accepts paths and `file://` URIs. The result is converted to RGBA8 and
/// scaled to fit the requested bounds, keeping its aspect ratio.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterDecoder;

impl RasterDecoder {
    /// Create a decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decode an already loaded file.
    pub fn decode_bytes(&self, bytes: &[u8], max_width: Bound, max_height: Bound) -> Result<IconImage, DecodeError> {
        let decoded = image::load_from_memory(bytes)?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(DecodeError::EmptyImage);
        }
        Ok(IconImage::from_rgba_image(decoded.to_rgba8()).fit_within(max_width, max_height))
    }

    /// Decode a file without blocking the calling executor.
    pub async fn decode_file(&self, path: &Path, max_width: Bound, max_height: Bound) -> Result<IconImage, DecodeError> {
        check_format(path)?;
        let bytes = io_helpers::read_file(path).await?;
        self.decode_bytes(&bytes, max_width, max_height)
    }
}

impl ImageDecoder for RasterDecoder {
    fn decode(&self, reference: &IconReference, max_width: Bound, max_height: Bound) -> Result<IconImage, DecodeError> {
        let path = local_path(reference)?;
        check_format(&path)?;
        let bytes = std::fs::read(&path)?;
        log::trace!("Decoding {:?} ({} bytes)", path, bytes.len());
        self.decode_bytes(&bytes, max_width, max_height)
    }
}

fn local_path(reference: &IconReference) -> Result<PathBuf, DecodeError> {
    match reference {
        IconReference::Path(path) => Ok(path.clone()),
        IconReference::Uri(uri) => match uri_scheme(uri) {
            Some("file") => uri_to_path(uri).ok_or_else(|| DecodeError::UnsupportedScheme(uri.clone())),
            Some(scheme) => Err(DecodeError::UnsupportedScheme(scheme.to_string())),
            None => Err(DecodeError::UnsupportedScheme(uri.clone())),
        },
    }
}

/// Vector formats need a renderer this decoder does not have.
fn check_format(path: &Path) -> Result<(), DecodeError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "svg" | "svgz" => Err(DecodeError::UnsupportedFormat(extension)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_schemes_are_unsupported() {
        let decoder = RasterDecoder::new();
        let reference = IconReference::Uri("https://example.com/icon.png".to_string());
        assert!(matches!(
            decoder.decode(&reference, Bound::Px(16), Bound::Px(16)),
            Err(DecodeError::UnsupportedScheme(scheme)) if scheme == "https"
        ));
    }

    #[test]
    fn test_svg_is_unsupported() {
        let decoder = RasterDecoder::new();
        let reference = IconReference::Path(PathBuf::from("/icons/app.svg"));
        assert!(matches!(
            decoder.decode(&reference, Bound::Px(16), Bound::Px(16)),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let decoder = RasterDecoder::new();
        let reference = IconReference::Uri("file:///nonexistent/nptk-icons/missing.png".to_string());
        assert!(matches!(
            decoder.decode(&reference, Bound::Px(16), Bound::Px(16)),
            Err(DecodeError::Io(_))
        ));
    }

    #[test]
    fn test_garbage_is_image_error() {
        let decoder = RasterDecoder::new();
        assert!(matches!(
            decoder.decode_bytes(b"definitely not an image", Bound::Px(16), Bound::Px(16)),
            Err(DecodeError::Image(_))
        ));
    }
}
