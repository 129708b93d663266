//! 5x8 bitmap font for raster labels.

use crate::palette::Rgb;
use image::RgbImage;

/// Glyph cell size in pixels at scale 1.
pub const GLYPH_SIZE: u32 = 8;

static GLYPHS: [[u8; 8]; 128] = {
    let mut font = [[0u8; 8]; 128];
    font[b' ' as usize] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    font[b'!' as usize] = [0x20, 0x20, 0x20, 0x20, 0x20, 0x00, 0x20, 0x00];
    font[b'"' as usize] = [0x50, 0x50, 0x50, 0x00, 0x00, 0x00, 0x00, 0x00];
    font[b'#' as usize] = [0x50, 0x50, 0xF8, 0x50, 0xF8, 0x50, 0x50, 0x00];
    font[b'$' as usize] = [0x20, 0x78, 0xA0, 0x70, 0x28, 0xF0, 0x20, 0x00];
    font[b'%' as usize] = [0xC0, 0xC8, 0x10, 0x20, 0x40, 0x98, 0x18, 0x00];
    font[b'&' as usize] = [0x40, 0xA0, 0xA0, 0x40, 0xA8, 0x90, 0x68, 0x00];
    font[b'\'' as usize] = [0x20, 0x20, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00];
    font[b'(' as usize] = [0x10, 0x20, 0x40, 0x40, 0x40, 0x20, 0x10, 0x00];
    font[b')' as usize] = [0x40, 0x20, 0x10, 0x10, 0x10, 0x20, 0x40, 0x00];
    font[b'*' as usize] = [0x00, 0x20, 0xA8, 0x70, 0xA8, 0x20, 0x00, 0x00];
    font[b'+' as usize] = [0x00, 0x20, 0x20, 0xF8, 0x20, 0x20, 0x00, 0x00];
    font[b',' as usize] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x20, 0x20, 0x40];
    font[b'-' as usize] = [0x00, 0x00, 0x00, 0xF8, 0x00, 0x00, 0x00, 0x00];
    font[b'.' as usize] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x20, 0x20, 0x00];
    font[b'/' as usize] = [0x00, 0x08, 0x10, 0x20, 0x40, 0x80, 0x00, 0x00];
    font[b'0' as usize] = [0x70, 0x88, 0x98, 0xA8, 0xC8, 0x88, 0x70, 0x00];
    font[b'1' as usize] = [0x20, 0x60, 0x20, 0x20, 0x20, 0x20, 0x70, 0x00];
    font[b'2' as usize] = [0x70, 0x88, 0x08, 0x30, 0x40, 0x80, 0xF8, 0x00];
    font[b'3' as usize] = [0xF8, 0x10, 0x20, 0x10, 0x08, 0x88, 0x70, 0x00];
    font[b'4' as usize] = [0x10, 0x30, 0x50, 0x90, 0xF8, 0x10, 0x10, 0x00];
    font[b'5' as usize] = [0xF8, 0x80, 0xF0, 0x08, 0x08, 0x88, 0x70, 0x00];
    font[b'6' as usize] = [0x30, 0x40, 0x80, 0xF0, 0x88, 0x88, 0x70, 0x00];
    font[b'7' as usize] = [0xF8, 0x08, 0x10, 0x20, 0x40, 0x40, 0x40, 0x00];
    font[b'8' as usize] = [0x70, 0x88, 0x88, 0x70, 0x88, 0x88, 0x70, 0x00];
    font[b'9' as usize] = [0x70, 0x88, 0x88, 0x78, 0x08, 0x10, 0x60, 0x00];
    font[b':' as usize] = [0x00, 0x00, 0x20, 0x00, 0x00, 0x20, 0x00, 0x00];
    font[b';' as usize] = [0x00, 0x00, 0x20, 0x00, 0x00, 0x20, 0x20, 0x40];
    font[b'<' as usize] = [0x08, 0x10, 0x20, 0x40, 0x20, 0x10, 0x08, 0x00];
    font[b'=' as usize] = [0x00, 0x00, 0xF8, 0x00, 0xF8, 0x00, 0x00, 0x00];
    font[b'>' as usize] = [0x80, 0x40, 0x20, 0x10, 0x20, 0x40, 0x80, 0x00];
    font[b'?' as usize] = [0x70, 0x88, 0x08, 0x10, 0x20, 0x00, 0x20, 0x00];
    font[b'@' as usize] = [0x70, 0x88, 0xB8, 0xA8, 0xB8, 0x80, 0x70, 0x00];
    font[b'A' as usize] = [0x70, 0x88, 0x88, 0xF8, 0x88, 0x88, 0x88, 0x00];
    font[b'B' as usize] = [0xF0, 0x88, 0x88, 0xF0, 0x88, 0x88, 0xF0, 0x00];
    font[b'C' as usize] = [0x70, 0x88, 0x80, 0x80, 0x80, 0x88, 0x70, 0x00];
    font[b'D' as usize] = [0xE0, 0x90, 0x88, 0x88, 0x88, 0x90, 0xE0, 0x00];
    font[b'E' as usize] = [0xF8, 0x80, 0x80, 0xF0, 0x80, 0x80, 0xF8, 0x00];
    font[b'F' as usize] = [0xF8, 0x80, 0x80, 0xF0, 0x80, 0x80, 0x80, 0x00];
    font[b'G' as usize] = [0x70, 0x88, 0x80, 0xB8, 0x88, 0x88, 0x70, 0x00];
    font[b'H' as usize] = [0x88, 0x88, 0x88, 0xF8, 0x88, 0x88, 0x88, 0x00];
    font[b'I' as usize] = [0x70, 0x20, 0x20, 0x20, 0x20, 0x20, 0x70, 0x00];
    font[b'J' as usize] = [0x38, 0x10, 0x10, 0x10, 0x10, 0x90, 0x60, 0x00];
    font[b'K' as usize] = [0x88, 0x90, 0xA0, 0xC0, 0xA0, 0x90, 0x88, 0x00];
    font[b'L' as usize] = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0xF8, 0x00];
    font[b'M' as usize] = [0x88, 0xD8, 0xA8, 0xA8, 0x88, 0x88, 0x88, 0x00];
    font[b'N' as usize] = [0x88, 0xC8, 0xA8, 0x98, 0x88, 0x88, 0x88, 0x00];
    font[b'O' as usize] = [0x70, 0x88, 0x88, 0x88, 0x88, 0x88, 0x70, 0x00];
    font[b'P' as usize] = [0xF0, 0x88, 0x88, 0xF0, 0x80, 0x80, 0x80, 0x00];
    font[b'Q' as usize] = [0x70, 0x88, 0x88, 0x88, 0xA8, 0x90, 0x68, 0x00];
    font[b'R' as usize] = [0xF0, 0x88, 0x88, 0xF0, 0xA0, 0x90, 0x88, 0x00];
    font[b'S' as usize] = [0x70, 0x88, 0x80, 0x70, 0x08, 0x88, 0x70, 0x00];
    font[b'T' as usize] = [0xF8, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x00];
    font[b'U' as usize] = [0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x70, 0x00];
    font[b'V' as usize] = [0x88, 0x88, 0x88, 0x88, 0x88, 0x50, 0x20, 0x00];
    font[b'W' as usize] = [0x88, 0x88, 0x88, 0xA8, 0xA8, 0xD8, 0x88, 0x00];
    font[b'X' as usize] = [0x88, 0x88, 0x50, 0x20, 0x50, 0x88, 0x88, 0x00];
    font[b'Y' as usize] = [0x88, 0x88, 0x50, 0x20, 0x20, 0x20, 0x20, 0x00];
    font[b'Z' as usize] = [0xF8, 0x08, 0x10, 0x20, 0x40, 0x80, 0xF8, 0x00];
    font[b'[' as usize] = [0x70, 0x40, 0x40, 0x40, 0x40, 0x40, 0x70, 0x00];
    font[b'\\' as usize] = [0x00, 0x80, 0x40, 0x20, 0x10, 0x08, 0x00, 0x00];
    font[b']' as usize] = [0x70, 0x10, 0x10, 0x10, 0x10, 0x10, 0x70, 0x00];
    font[b'^' as usize] = [0x20, 0x50, 0x88, 0x00, 0x00, 0x00, 0x00, 0x00];
    font[b'_' as usize] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF8, 0x00];
    font[b'`' as usize] = [0x40, 0x20, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00];
    font[b'a' as usize] = [0x00, 0x00, 0x70, 0x08, 0x78, 0x88, 0x78, 0x00];
    font[b'b' as usize] = [0x80, 0x80, 0xB0, 0xC8, 0x88, 0x88, 0xF0, 0x00];
    font[b'c' as usize] = [0x00, 0x00, 0x70, 0x80, 0x80, 0x88, 0x70, 0x00];
    font[b'd' as usize] = [0x08, 0x08, 0x68, 0x98, 0x88, 0x88, 0x78, 0x00];
    font[b'e' as usize] = [0x00, 0x00, 0x70, 0x88, 0xF8, 0x80, 0x70, 0x00];
    font[b'f' as usize] = [0x30, 0x48, 0x40, 0xE0, 0x40, 0x40, 0x40, 0x00];
    font[b'g' as usize] = [0x00, 0x00, 0x78, 0x88, 0x78, 0x08, 0x70, 0x00];
    font[b'h' as usize] = [0x80, 0x80, 0xB0, 0xC8, 0x88, 0x88, 0x88, 0x00];
    font[b'i' as usize] = [0x20, 0x00, 0x60, 0x20, 0x20, 0x20, 0x70, 0x00];
    font[b'j' as usize] = [0x10, 0x00, 0x30, 0x10, 0x10, 0x90, 0x60, 0x00];
    font[b'k' as usize] = [0x80, 0x80, 0x90, 0xA0, 0xC0, 0xA0, 0x90, 0x00];
    font[b'l' as usize] = [0x60, 0x20, 0x20, 0x20, 0x20, 0x20, 0x70, 0x00];
    font[b'm' as usize] = [0x00, 0x00, 0xD0, 0xA8, 0xA8, 0xA8, 0xA8, 0x00];
    font[b'n' as usize] = [0x00, 0x00, 0xB0, 0xC8, 0x88, 0x88, 0x88, 0x00];
    font[b'o' as usize] = [0x00, 0x00, 0x70, 0x88, 0x88, 0x88, 0x70, 0x00];
    font[b'p' as usize] = [0x00, 0x00, 0xF0, 0x88, 0xF0, 0x80, 0x80, 0x00];
    font[b'q' as usize] = [0x00, 0x00, 0x78, 0x88, 0x78, 0x08, 0x08, 0x00];
    font[b'r' as usize] = [0x00, 0x00, 0xB0, 0xC8, 0x80, 0x80, 0x80, 0x00];
    font[b's' as usize] = [0x00, 0x00, 0x70, 0x80, 0x70, 0x08, 0xF0, 0x00];
    font[b't' as usize] = [0x40, 0x40, 0xE0, 0x40, 0x40, 0x48, 0x30, 0x00];
    font[b'u' as usize] = [0x00, 0x00, 0x88, 0x88, 0x88, 0x98, 0x68, 0x00];
    font[b'v' as usize] = [0x00, 0x00, 0x88, 0x88, 0x88, 0x50, 0x20, 0x00];
    font[b'w' as usize] = [0x00, 0x00, 0x88, 0x88, 0xA8, 0xA8, 0x50, 0x00];
    font[b'x' as usize] = [0x00, 0x00, 0x88, 0x50, 0x20, 0x50, 0x88, 0x00];
    font[b'y' as usize] = [0x00, 0x00, 0x88, 0x88, 0x78, 0x08, 0x70, 0x00];
    font[b'z' as usize] = [0x00, 0x00, 0xF8, 0x10, 0x20, 0x40, 0xF8, 0x00];
    font[b'{' as usize] = [0x10, 0x20, 0x20, 0x40, 0x20, 0x20, 0x10, 0x00];
    font[b'|' as usize] = [0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x00];
    font[b'}' as usize] = [0x40, 0x20, 0x20, 0x10, 0x20, 0x20, 0x40, 0x00];
    font[b'~' as usize] = [0x00, 0x00, 0x40, 0xA8, 0x10, 0x00, 0x00, 0x00];
    font
};

/// Drawn in place of the last character of a truncated label.
static ELLIPSIS: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xA8, 0x00];

/// Glyph rows for `c`; non-ASCII characters render as '?'.
pub fn glyph(c: char) -> &'static [u8; 8] {
    let code = c as usize;
    if code < 128 {
        &GLYPHS[code]
    } else {
        &GLYPHS[b'?' as usize]
    }
}

/// Glyphs for `text`, cut to `max_chars` with a trailing ellipsis glyph.
pub fn layout_label(text: &str, max_chars: usize) -> Vec<&'static [u8; 8]> {
    let n_chars = text.chars().count();
    let shown = n_chars.min(max_chars);
    text.chars()
        .take(shown)
        .enumerate()
        .map(|(i, c)| {
            if i + 1 == shown && n_chars > shown {
                &ELLIPSIS
            } else {
                glyph(c)
            }
        })
        .collect()
}

fn put(img: &mut RgbImage, x: u32, y: u32, rgb: Rgb) {
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, image::Rgb([rgb.0, rgb.1, rgb.2]));
    }
}

/// Draw `text` left to right with its top-left corner at (`x`, `y`).
pub fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str, max_chars: usize, rgb: Rgb) {
    for (i, rows) in layout_label(text, max_chars).into_iter().enumerate() {
        let base_x = x + i as u32 * GLYPH_SIZE;
        for (j, &row) in rows.iter().enumerate() {
            for bit in 0..8u32 {
                if (row >> (7 - bit)) & 1 == 1 {
                    put(img, base_x + bit, y + j as u32, rgb);
                }
            }
        }
    }
}

/// Draw `text` rotated 90 degrees clockwise, reading top to bottom, with the
/// glyph baseline facing left and its top-left corner at (`x`, `y`).
pub fn draw_text_vertical(img: &mut RgbImage, x: u32, y: u32, text: &str, max_chars: usize, rgb: Rgb) {
    for (i, rows) in layout_label(text, max_chars).into_iter().enumerate() {
        let base_y = y + i as u32 * GLYPH_SIZE;
        for (j, &row) in rows.iter().enumerate() {
            for bit in 0..8u32 {
                if (row >> (7 - bit)) & 1 == 1 {
                    put(img, x + (GLYPH_SIZE - 1 - j as u32), base_y + bit, rgb);
                }
            }
        }
    }
}

/// Pixel width of a label after truncation.
pub fn label_width(text: &str, max_chars: usize) -> u32 {
    text.chars().count().min(max_chars) as u32 * GLYPH_SIZE
}
