// SPDX-License-Identifier: LGPL-3.0-only
//! Synthesis of annotated icons.
//!
//! Runs on a worker once the base and emblem images are available.

use image::imageops;
use image::{Pixel, Rgba, RgbaImage};

use crate::descriptor::{Annotation, Tint};
use crate::image::IconImage;

/// Ribbon band colour, drawn over the canvas.
const RIBBON_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 176]);
/// Ribbon text colour.
const RIBBON_FOREGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Glyph cell size of the built-in font, in font pixels.
const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;

/// Build the annotated icon on a `size` x `size` canvas.
///
/// The base is centred horizontally; with a ribbon (`reserve > 0`) it sits at
/// the top, otherwise it is centred vertically. The emblem goes into the
/// bottom-right corner above the ribbon.
pub fn compose(
    base: &IconImage,
    emblem: Option<&IconImage>,
    annotation: &Annotation,
    size: u32,
    reserve: u32,
) -> IconImage {
    let mut canvas = RgbaImage::new(size, size);
    let ribbon = annotation.ribbon_text().filter(|_| reserve > 0);
    let reserve = if ribbon.is_some() { reserve.min(size) } else { 0 };

    let mut base_image = base.to_rgba_image();
    if let Some(tint) = annotation.tint {
        colorize(&mut base_image, tint);
    }
    let x = size.saturating_sub(base_image.width()) / 2;
    let y = if reserve > 0 {
        0
    } else {
        size.saturating_sub(base_image.height()) / 2
    };
    imageops::overlay(&mut canvas, &base_image, x as i64, y as i64);

    if let Some(emblem) = emblem {
        let emblem_image = emblem.to_rgba_image();
        let x = size.saturating_sub(emblem_image.width());
        let y = (size - reserve).saturating_sub(emblem_image.height());
        imageops::overlay(&mut canvas, &emblem_image, x as i64, y as i64);
    }

    if let Some(text) = ribbon {
        draw_ribbon(&mut canvas, text, reserve);
    }

    IconImage::from_rgba_image(canvas)
}

/// Recolour every pixel with `tint`, keeping luminance and alpha.
pub fn colorize(image: &mut RgbaImage, tint: Tint) {
    let Tint([tr, tg, tb]) = tint;
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let luminance = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
        let channel = |t: u8| (t as f32 * luminance).round().clamp(0.0, 255.0) as u8;
        *pixel = Rgba([channel(tr), channel(tg), channel(tb), a]);
    }
}

/// Draw a band of `height` pixels along the bottom edge with `text` centred in it.
///
/// Text is upper-cased; characters that do not fit are dropped from the end.
pub fn draw_ribbon(canvas: &mut RgbaImage, text: &str, height: u32) {
    let (width, canvas_height) = canvas.dimensions();
    let height = height.min(canvas_height);
    if height == 0 || width == 0 {
        return;
    }
    let top = canvas_height - height;

    for y in top..canvas_height {
        for x in 0..width {
            canvas.get_pixel_mut(x, y).blend(&RIBBON_BACKGROUND);
        }
    }

    let scale = (height.saturating_sub(2) / GLYPH_HEIGHT).max(1);
    let advance = (GLYPH_WIDTH + 1) * scale;
    let fitting = ((width + scale) / advance) as usize;
    let glyphs: Vec<[u8; 5]> = text
        .chars()
        .flat_map(char::to_uppercase)
        .take(fitting)
        .map(glyph)
        .collect();
    if glyphs.is_empty() {
        return;
    }

    let text_width = glyphs.len() as u32 * advance - scale;
    let left = width.saturating_sub(text_width) / 2;
    let baseline = top + height.saturating_sub(GLYPH_HEIGHT * scale) / 2;

    for (index, rows) in glyphs.iter().enumerate() {
        let origin = left + index as u32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for column in 0..GLYPH_WIDTH {
                if bits & (0b100 >> column) == 0 {
                    continue;
                }
                fill_block(
                    canvas,
                    origin + column * scale,
                    baseline + row as u32 * scale,
                    scale,
                );
            }
        }
    }
}

fn fill_block(canvas: &mut RgbaImage, x: u32, y: u32, scale: u32) {
    let (width, height) = canvas.dimensions();
    for dy in 0..scale {
        for dx in 0..scale {
            if x + dx < width && y + dy < height {
                canvas.put_pixel(x + dx, y + dy, RIBBON_FOREGROUND);
            }
        }
    }
}

/// 3x5 bitmap of a character; bit 2 is the left column.
fn glyph(c: char) -> [u8; 5] {
    match c {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        ' ' => [0b000; 5],
        _ => [0b110, 0b001, 0b010, 0b000, 0b010],
    }
}
