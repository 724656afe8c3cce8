// SPDX-License-Identifier: LGPL-3.0-only
//! Decoded icon pixels.

use std::fmt;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::request::Bound;

/// A decoded icon: RGBA8 pixels, row-major, no padding.
///
/// Cloning shares the pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct IconImage {
    data: Arc<Vec<u8>>,
    width: u32,
    height: u32,
}

impl IconImage {
    /// Wrap raw RGBA bytes. Returns `None` if the length does not match the size.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (data.len() == expected).then(|| Self {
            data: Arc::new(data),
            width,
            height,
        })
    }

    /// Take ownership of an `image` buffer.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: Arc::new(image.into_raw()),
            width,
            height,
        }
    }

    /// Copy into an `image` buffer for further processing.
    pub fn to_rgba_image(&self) -> RgbaImage {
        // Length is checked on construction.
        RgbaImage::from_raw(self.width, self.height, self.data.as_ref().clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether both values share one pixel buffer.
    pub fn ptr_eq(a: &IconImage, b: &IconImage) -> bool {
        Arc::ptr_eq(&a.data, &b.data)
    }

    /// Scale to fit the bounds, preserving aspect ratio.
    ///
    /// Returns `self` unchanged when it already has the fitted size.
    pub fn fit_within(self, max_width: Bound, max_height: Bound) -> Self {
        let (width, height) = fit_dimensions(self.width, self.height, max_width, max_height);
        if (width, height) == (self.width, self.height) {
            return self;
        }
        let resized = imageops::resize(&self.to_rgba_image(), width, height, FilterType::Triangle);
        Self::from_rgba_image(resized)
    }
}

impl fmt::Debug for IconImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Largest edge [`fit_dimensions`] scales an image to.
pub const MAX_SCALED_EDGE: u32 = 4096;

/// Size of a `width` x `height` image scaled to fit the bounds.
///
/// Only bounded axes constrain the scale; an image with no bounded axis keeps
/// its size. Results are never smaller than 1x1, and scaling never produces
/// an edge longer than [`MAX_SCALED_EDGE`].
pub fn fit_dimensions(width: u32, height: u32, max_width: Bound, max_height: Bound) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let scale_w = max_width.px().map(|w| w as f64 / width as f64);
    let scale_h = max_height.px().map(|h| h as f64 / height as f64);
    let scale = match (scale_w, scale_h) {
        (Some(a), Some(b)) => a.min(b),
        (Some(s), None) | (None, Some(s)) => s,
        (None, None) => return (width, height),
    };
    let scale = scale.min(MAX_SCALED_EDGE as f64 / width.max(height) as f64);
    let scaled = |v: u32| ((v as f64 * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}
