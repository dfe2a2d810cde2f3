use ab_glyph::{point, Font, FontVec, OutlinedGlyph, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::pixelops::weighted_sum;
use imageproc::rect::Rect;
use log::info;
use std::fs;
use std::path::PathBuf;

use crate::models::FontSource;
use crate::utils::{find_font_file, font_search_dirs};

/// Pixel bounding box `(left, top, right, bottom)`, right/bottom exclusive.
pub type BBox = (i32, i32, i32, i32);

const CELL_WIDTH: usize = 5;
const CELL_HEIGHT: usize = 7;

// 5x7 cells for A-Z, one row per byte, bit 4 is the leftmost column.
static LETTERS: [[u8; CELL_HEIGHT]; 26] = [
    [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001], // A
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110], // B
    [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110], // C
    [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100], // D
    [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111], // E
    [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000], // F
    [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111], // G
    [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001], // H
    [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110], // I
    [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100], // J
    [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001], // K
    [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111], // L
    [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001], // M
    [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001], // N
    [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110], // O
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000], // P
    [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101], // Q
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001], // R
    [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110], // S
    [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100], // T
    [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110], // U
    [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100], // V
    [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010], // W
    [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001], // X
    [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100], // Y
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111], // Z
];

/// Built-in blocky font used when no outline font can be loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitmapFont {
    pub pixel_size: u32,
}

impl BitmapFont {
    /// Picks a pixel size whose cap height is close to that of an outline font at `em_size`.
    pub fn for_em_size(em_size: f32) -> Self {
        let pixel_size = (em_size * 0.7 / CELL_HEIGHT as f32).round().max(1.0) as u32;
        Self { pixel_size }
    }

    fn cell(c: char) -> Option<&'static [u8; CELL_HEIGHT]> {
        let upper = c.to_ascii_uppercase();
        upper
            .is_ascii_uppercase()
            .then(|| &LETTERS[(upper as u8 - b'A') as usize])
    }

    /// Calls `f(x, y)` in cell units for every lit cell of `text`.
    fn for_each_cell(&self, text: &str, mut f: impl FnMut(i32, i32)) {
        for (index, c) in text.chars().enumerate() {
            let Some(rows) = Self::cell(c) else {
                continue;
            };
            let origin = (index * (CELL_WIDTH + 1)) as i32;
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..CELL_WIDTH {
                    if bits & (1 << (CELL_WIDTH - 1 - col)) != 0 {
                        f(origin + col as i32, row as i32);
                    }
                }
            }
        }
    }

    pub fn bbox(&self, text: &str) -> BBox {
        let px = self.pixel_size as i32;
        let mut bbox: Option<BBox> = None;
        self.for_each_cell(text, |x, y| {
            let cell = (x * px, y * px, (x + 1) * px, (y + 1) * px);
            bbox = Some(match bbox {
                Some(b) => union(b, cell),
                None => cell,
            });
        });
        bbox.unwrap_or((0, 0, 0, 0))
    }

    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, color: Rgba<u8>) {
        let px = self.pixel_size as i32;
        self.for_each_cell(text, |cx, cy| {
            let rect = Rect::at(x + cx * px, y + cy * px).of_size(self.pixel_size, self.pixel_size);
            draw_filled_rect_mut(canvas, rect, color);
        });
    }
}

fn union(a: BBox, b: BBox) -> BBox {
    (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))
}

/// The renderer selected once per run and used for both measuring and drawing.
pub enum GlyphRenderer {
    Outline {
        font: FontVec,
        scale: PxScale,
        path: PathBuf,
    },
    BuiltIn(BitmapFont),
}

impl GlyphRenderer {
    /// Loads the named outline font, falling back to the built-in font on any failure.
    pub fn load(name: &str, em_size: f32) -> Self {
        Self::load_from(name, em_size, &font_search_dirs())
    }

    pub fn load_from(name: &str, em_size: f32, search_dirs: &[PathBuf]) -> Self {
        match Self::try_load_outline(name, em_size, search_dirs) {
            Ok(renderer) => renderer,
            Err(e) => {
                info!("Font '{}' unavailable ({}), using built-in font", name, e);
                GlyphRenderer::BuiltIn(BitmapFont::for_em_size(em_size))
            }
        }
    }

    fn try_load_outline(
        name: &str,
        em_size: f32,
        search_dirs: &[PathBuf],
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let path = find_font_file(name, search_dirs).ok_or("not found")?;
        let data = fs::read(&path)?;
        let font = FontVec::try_from_vec(data)?;
        let units_per_em = font.units_per_em().ok_or("missing units per em")?;
        let scale = PxScale::from(em_size * font.height_unscaled() / units_per_em);
        info!("Using font {} at {:.1}px", path.display(), scale.y);
        Ok(GlyphRenderer::Outline { font, scale, path })
    }

    pub fn source(&self) -> FontSource {
        match self {
            GlyphRenderer::Outline { path, .. } => FontSource::Named(path.clone()),
            GlyphRenderer::BuiltIn(_) => FontSource::BuiltIn,
        }
    }

    /// Tight bounding box of `text` drawn with its origin (left edge, ascender line) at (0, 0).
    pub fn bbox(&self, text: &str) -> BBox {
        match self {
            GlyphRenderer::Outline { font, scale, .. } => {
                let mut bbox: Option<BBox> = None;
                layout_outline(font, *scale, text, |g| {
                    let b = g.px_bounds();
                    let glyph_box = (b.min.x as i32, b.min.y as i32, b.max.x as i32, b.max.y as i32);
                    bbox = Some(match bbox {
                        Some(acc) => union(acc, glyph_box),
                        None => glyph_box,
                    });
                });
                bbox.unwrap_or((0, 0, 0, 0))
            }
            GlyphRenderer::BuiltIn(bitmap) => bitmap.bbox(text),
        }
    }

    /// Draws `text` with its origin at (`x`, `y`).
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, color: Rgba<u8>) {
        match self {
            GlyphRenderer::Outline { font, scale, .. } => {
                let (width, height) = (canvas.width() as i32, canvas.height() as i32);
                layout_outline(font, *scale, text, |g| {
                    let b = g.px_bounds();
                    let x_shift = x + b.min.x as i32;
                    let y_shift = y + b.min.y as i32;
                    g.draw(|gx, gy, coverage| {
                        let px = gx as i32 + x_shift;
                        let py = gy as i32 + y_shift;
                        if !(0..width).contains(&px) || !(0..height).contains(&py) {
                            return;
                        }
                        let coverage = coverage.clamp(0.0, 1.0);
                        let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                        *pixel = weighted_sum(*pixel, color, 1.0 - coverage, coverage);
                    });
                });
            }
            GlyphRenderer::BuiltIn(bitmap) => bitmap.draw(canvas, text, x, y, color),
        }
    }
}

/// Lays out `text` on a single line with the ascender at y = 0.
fn layout_outline(font: &FontVec, scale: PxScale, text: &str, mut f: impl FnMut(OutlinedGlyph)) {
    let scaled = font.as_scaled(scale);
    let mut caret = 0.0f32;
    let mut previous = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, scaled.ascent()));
        caret += scaled.h_advance(id);
        previous = Some(id);
        if let Some(outlined) = font.outline_glyph(glyph) {
            f(outlined);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_size_tracks_em_size() {
        assert_eq!(BitmapFont::for_em_size(150.0).pixel_size, 15);
        assert_eq!(BitmapFont::for_em_size(1.0).pixel_size, 1);
    }

    #[test]
    fn bitmap_bbox_of_s_fills_the_cell() {
        let font = BitmapFont { pixel_size: 15 };
        assert_eq!(font.bbox("S"), (0, 0, 75, 105));
        assert_eq!(font.bbox("s"), font.bbox("S"));
    }

    #[test]
    fn bitmap_bbox_spans_cells_and_skips_unknown() {
        let font = BitmapFont { pixel_size: 2 };
        // "I" has no ink in its outer columns.
        assert_eq!(font.bbox("I"), (2, 0, 8, 14));
        assert_eq!(font.bbox("?"), (0, 0, 0, 0));
        assert_eq!(font.bbox("?S"), (12, 0, 22, 14));
    }

    #[test]
    fn bitmap_draw_paints_lit_cells_only() {
        let font = BitmapFont { pixel_size: 3 };
        let mut canvas = RgbaImage::new(20, 30);
        let white = Rgba([255, 255, 255, 255]);
        font.draw(&mut canvas, "S", 1, 2, white);

        // Top row of "S" is 01111: first cell dark, second lit.
        assert_eq!(canvas.get_pixel(1, 2), &Rgba([0, 0, 0, 0]));
        assert_eq!(canvas.get_pixel(4, 2), &white);
        assert_eq!(canvas.get_pixel(15, 4), &white);
        // Fourth row is 01110: last column dark.
        assert_eq!(canvas.get_pixel(13, 2 + 9), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn unresolvable_font_falls_back_to_built_in() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = GlyphRenderer::load_from("no-such-font-6f1c.ttf", 150.0, &[dir.path().to_path_buf()]);
        assert_eq!(renderer.source(), FontSource::BuiltIn);
        assert_eq!(renderer.bbox("S"), (0, 0, 75, 105));
    }

    #[test]
    fn unparsable_font_falls_back_to_built_in() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken-6f1c.ttf"), b"definitely not a font").unwrap();
        let renderer = GlyphRenderer::load_from("broken-6f1c.ttf", 150.0, &[dir.path().to_path_buf()]);
        assert_eq!(renderer.source(), FontSource::BuiltIn);
    }
}
