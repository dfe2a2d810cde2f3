use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_ellipse_mut;

use crate::glyph::GlyphRenderer;
use crate::models::IconSpec;

/// Creates a fully transparent square canvas.
pub fn new_canvas(side: u32) -> RgbaImage {
    RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 0]))
}

/// Fills the circle inscribed in `[margin, margin, side - margin, side - margin]`, bounds inclusive.
pub fn draw_circle(canvas: &mut RgbaImage, margin: u32, color: Rgba<u8>) {
    let side = canvas.width() as i32;
    let center = side / 2;
    let radius = side / 2 - margin as i32;
    draw_filled_ellipse_mut(canvas, (center, center), radius, radius, color);
}

/// Centers `text` on the canvas using its measured bounding box.
/// The glyph origin is placed at the centering offset, so the box top shifts the ink downwards.
pub fn draw_centered_text(canvas: &mut RgbaImage, glyphs: &GlyphRenderer, text: &str, color: Rgba<u8>) {
    let (left, top, right, bottom) = glyphs.bbox(text);
    let text_width = right - left;
    let text_height = bottom - top;
    let x = (canvas.width() as i32 - text_width).div_euclid(2);
    let y = (canvas.height() as i32 - text_height).div_euclid(2);
    glyphs.draw(canvas, text, x, y, color);
}

/// Draws the full-size icon.
pub fn render_base(spec: &IconSpec, glyphs: &GlyphRenderer) -> RgbaImage {
    let mut canvas = new_canvas(spec.canvas_size);
    draw_circle(&mut canvas, spec.margin, Rgba(spec.circle_color));
    draw_centered_text(&mut canvas, glyphs, &spec.text, Rgba(spec.text_color));
    canvas
}

/// Lanczos3 resize on premultiplied alpha, so transparent pixels do not darken edges.
pub fn resize_premultiplied(canvas: &RgbaImage, size: u32) -> RgbaImage {
    if canvas.dimensions() == (size, size) {
        return canvas.clone();
    }

    let mut premultiplied = DynamicImage::ImageRgba8(canvas.clone()).into_rgba32f();
    for pixel in premultiplied.pixels_mut() {
        let alpha = pixel[3];
        for channel in &mut pixel.0[..3] {
            *channel *= alpha;
        }
    }

    let mut resized = imageops::resize(&premultiplied, size, size, FilterType::Lanczos3);
    for pixel in resized.pixels_mut() {
        let alpha = pixel[3];
        if alpha <= 0.0 {
            *pixel = Rgba([0.0; 4]);
            continue;
        }
        for channel in &mut pixel.0[..3] {
            *channel = (*channel / alpha).clamp(0.0, 1.0);
        }
        pixel[3] = alpha.min(1.0);
    }

    DynamicImage::ImageRgba32F(resized).into_rgba8()
}
