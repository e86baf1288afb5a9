//! Built-in 5x7 bitmap glyphs used when no outline font can be loaded.
//!
//! Covers ASCII letters (case-folded), digits and common punctuation. Anything else renders as `?`.

use crate::foundation::core::Rgba8Premul;
use crate::foundation::math::mul_div255_u8;

/// Lit columns per glyph row.
pub const GLYPH_COLS: u32 = 5;
/// Rows per glyph.
pub const GLYPH_ROWS: u32 = 7;
/// Horizontal advance in cells (glyph plus one blank column).
pub const ADVANCE_COLS: u32 = 6;

type Glyph = [u8; GLYPH_ROWS as usize];

const UNKNOWN: Glyph = [
    0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100,
];

fn glyph(c: char) -> Glyph {
    match c.to_ascii_uppercase() {
        ' ' => [0; 7],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '.' => [0, 0, 0, 0, 0, 0b01100, 0b01100],
        ',' => [0, 0, 0, 0, 0b01100, 0b00100, 0b01000],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0, 0b00100],
        '\'' => [0b01100, 0b00100, 0b01000, 0, 0, 0, 0],
        '"' => [0b01010, 0b01010, 0b01010, 0, 0, 0, 0],
        '-' => [0, 0, 0, 0b11111, 0, 0, 0],
        '+' => [0, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0],
        ':' => [0, 0b01100, 0b01100, 0, 0b01100, 0b01100, 0],
        ';' => [0, 0b01100, 0b01100, 0, 0b01100, 0b00100, 0b01000],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        '/' => [0, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0],
        '&' => [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
        '%' => [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011],
        _ => UNKNOWN,
    }
}

/// Size of `text` drawn with square cells of `cell_px`.
pub fn measure(text: &str, cell_px: f32) -> (f32, f32) {
    let n = text.chars().count() as u32;
    if n == 0 {
        return (0.0, 0.0);
    }
    let cols = n * ADVANCE_COLS - (ADVANCE_COLS - GLYPH_COLS);
    (cols as f32 * cell_px, GLYPH_ROWS as f32 * cell_px)
}

/// Lit cells of `text` as `(col, row)` in cell units from the line origin.
fn lit_cells(text: &str) -> impl Iterator<Item = (u32, u32)> + '_ {
    text.chars().enumerate().flat_map(|(i, c)| {
        let rows = glyph(c);
        let base = i as u32 * ADVANCE_COLS;
        (0..GLYPH_ROWS).flat_map(move |r| {
            (0..GLYPH_COLS).filter_map(move |col| {
                let bit = 1u8 << (GLYPH_COLS - 1 - col);
                (rows[r as usize] & bit != 0).then_some((base + col, r))
            })
        })
    })
}

/// Target surface for bitmap text: a premultiplied RGBA8 buffer.
pub struct BitmapTarget<'a> {
    pub data: &'a mut [u8],
    pub width: u32,
    pub height: u32,
}

/// Draw one line with its top-left corner at `(x, y)`.
///
/// The stroke is painted first as cells dilated by `stroke_px`, then the fill on top.
pub fn draw_line(
    target: &mut BitmapTarget<'_>,
    text: &str,
    (x, y): (f32, f32),
    cell_px: f32,
    fill: Rgba8Premul,
    stroke: Option<(Rgba8Premul, f32)>,
) {
    if let Some((color, px)) = stroke
        && px > 0.0
    {
        for (col, row) in lit_cells(text) {
            let cx = x + col as f32 * cell_px;
            let cy = y + row as f32 * cell_px;
            fill_rect_over(
                target,
                (cx - px, cy - px),
                (cell_px + 2.0 * px, cell_px + 2.0 * px),
                color,
            );
        }
    }
    for (col, row) in lit_cells(text) {
        let cx = x + col as f32 * cell_px;
        let cy = y + row as f32 * cell_px;
        fill_rect_over(target, (cx, cy), (cell_px, cell_px), fill);
    }
}

fn fill_rect_over(
    target: &mut BitmapTarget<'_>,
    (x, y): (f32, f32),
    (w, h): (f32, f32),
    color: Rgba8Premul,
) {
    let x0 = x.round().clamp(0.0, target.width as f32) as u32;
    let y0 = y.round().clamp(0.0, target.height as f32) as u32;
    let x1 = (x + w).round().clamp(0.0, target.width as f32) as u32;
    let y1 = (y + h).round().clamp(0.0, target.height as f32) as u32;
    let inv = 255 - u16::from(color.a);
    let src = color.to_array();
    for py in y0..y1 {
        let row = (py as usize) * (target.width as usize) * 4;
        for px in x0..x1 {
            let i = row + (px as usize) * 4;
            let Some(dst) = target.data.get_mut(i..i + 4) else {
                continue;
            };
            for c in 0..4 {
                dst[c] = src[c].saturating_add(mul_div255_u8(u16::from(dst[c]), inv));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fallback_font.rs"]
mod tests;
