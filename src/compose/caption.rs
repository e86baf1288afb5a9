use crate::assets::fallback_font::{self, BitmapTarget};
use crate::assets::fonts::{CaptionFont, TextBrushRgba8, TextLayoutEngine};
use crate::compose::style::CaptionPalette;
use crate::effects::composite::over_in_place;
use crate::foundation::core::{Affine, Canvas, Rect};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::cpu::{RasterSurface, affine_to_cpu, color_to_cpu};

/// Wrap width in characters on tall canvases.
pub const WRAP_CHARS_TALL: usize = 24;
/// Wrap width in characters on wide canvases.
pub const WRAP_CHARS_WIDE: usize = 40;

/// Greedy word wrap at `max_chars` characters per line.
///
/// Whitespace runs collapse to single spaces. Words longer than a line keep a line of their own.
pub fn wrap_greedy(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in text.split_whitespace() {
        let len = word.chars().count();
        if current_len > 0 && current_len + 1 + len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += len;
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Canvas-derived caption typography.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionMetrics {
    pub wrap_chars: usize,
    pub font_px: f32,
    pub line_height: f32,
    /// Vertical centre of the caption block as a fraction of canvas height.
    pub anchor_y: f64,
    /// Horizontal room available to a line.
    pub max_line_width: f32,
}

impl CaptionMetrics {
    pub fn for_canvas(canvas: Canvas) -> Self {
        let short_side = canvas.width.min(canvas.height) as f32;
        let font_px = (short_side * 0.065).max(8.0);
        let (wrap_chars, anchor_y) = if canvas.is_portrait() {
            (WRAP_CHARS_TALL, 0.72)
        } else {
            (WRAP_CHARS_WIDE, 0.82)
        };
        Self {
            wrap_chars,
            font_px,
            line_height: font_px * 1.25,
            anchor_y,
            max_line_width: canvas.width as f32 * 0.92,
        }
    }

    /// Top edge of a block of `lines` lines, kept inside the canvas.
    pub fn block_top(&self, lines: usize, canvas: Canvas) -> f32 {
        let block_h = self.line_height * lines as f32;
        let ch = canvas.height as f32;
        let top = (ch * self.anchor_y as f32) - block_h / 2.0;
        let margin = (ch * 0.04).min((ch - block_h).max(0.0) / 2.0);
        top.clamp(margin, (ch - margin - block_h).max(margin))
    }
}

/// A caption rasterized once per scene, kept as the smallest rectangle
/// that holds its ink.
#[derive(Clone, Debug)]
pub struct CaptionLayer {
    pub lines: Vec<String>,
    /// Canvas position of the top-left pixel of `rgba8_premul`.
    pub origin: (u32, u32),
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
    /// Area occupied by the text block.
    pub bounds: Rect,
    /// Drawn with the built-in glyph set.
    pub builtin_glyphs: bool,
}

impl CaptionLayer {
    fn crop(
        lines: Vec<String>,
        full: &[u8],
        canvas: Canvas,
        bounds: Rect,
        builtin_glyphs: bool,
    ) -> Self {
        let cw = canvas.width as usize;
        let inked = |x: usize, y: usize| full[(y * cw + x) * 4 + 3] != 0;
        let (mut x0, mut y0, mut x1, mut y1) = (usize::MAX, usize::MAX, 0usize, 0usize);
        for y in 0..canvas.height as usize {
            for x in 0..cw {
                if inked(x, y) {
                    x0 = x0.min(x);
                    x1 = x1.max(x + 1);
                    y0 = y0.min(y);
                    y1 = y1.max(y + 1);
                }
            }
        }
        if x0 == usize::MAX {
            return Self {
                lines,
                origin: (0, 0),
                width: 0,
                height: 0,
                rgba8_premul: Vec::new(),
                bounds,
                builtin_glyphs,
            };
        }

        let (w, h) = (x1 - x0, y1 - y0);
        let mut rgba8_premul = Vec::with_capacity(w * h * 4);
        for y in y0..y1 {
            let row = (y * cw + x0) * 4;
            rgba8_premul.extend_from_slice(&full[row..row + w * 4]);
        }
        Self {
            lines,
            origin: (x0 as u32, y0 as u32),
            width: w as u32,
            height: h as u32,
            rgba8_premul,
            bounds,
            builtin_glyphs,
        }
    }

    /// Pixel at canvas position `(x, y)`; transparent outside the ink rectangle.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let (ox, oy) = self.origin;
        if x < ox || y < oy || x >= ox + self.width || y >= oy + self.height {
            return [0; 4];
        }
        let i = (((y - oy) * self.width + (x - ox)) * 4) as usize;
        [
            self.rgba8_premul[i],
            self.rgba8_premul[i + 1],
            self.rgba8_premul[i + 2],
            self.rgba8_premul[i + 3],
        ]
    }

    /// Source-over onto a canvas-sized premultiplied frame.
    pub fn composite_onto(&self, frame: &mut [u8], canvas: Canvas) -> ReelResult<()> {
        if frame.len() != canvas.rgba_len() {
            return Err(ReelError::render(format!(
                "caption target holds {} bytes, canvas needs {}",
                frame.len(),
                canvas.rgba_len()
            )));
        }
        let (ox, oy) = self.origin;
        if ox + self.width > canvas.width || oy + self.height > canvas.height {
            return Err(ReelError::render("caption does not fit the canvas"));
        }
        let row_bytes = self.width as usize * 4;
        for (r, src) in self.rgba8_premul.chunks_exact(row_bytes.max(4)).enumerate() {
            let start = ((oy as usize + r) * canvas.width as usize + ox as usize) * 4;
            over_in_place(&mut frame[start..start + row_bytes], src, 1.0)?;
        }
        Ok(())
    }
}

struct ShapedFont {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
}

/// Caption Renderer: turns caption text into a stroked, filled, positioned layer.
///
/// Font trouble never fails a scene; it switches to the built-in glyph set.
pub struct CaptionRenderer {
    canvas: Canvas,
    palette: CaptionPalette,
    stroke_px: f32,
    metrics: CaptionMetrics,
    shaped: Option<ShapedFont>,
}

impl CaptionRenderer {
    pub fn new(canvas: Canvas, palette: CaptionPalette, stroke_px: f32, font: &CaptionFont) -> Self {
        let shaped = match font {
            CaptionFont::Shaped { bytes, source } => match TextLayoutEngine::for_font(bytes) {
                Ok(engine) => Some(ShapedFont {
                    engine,
                    font: vello_cpu::peniko::FontData::new(
                        vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                        0,
                    ),
                }),
                Err(e) => {
                    tracing::warn!(font = %source.display(), error = %e, "caption font rejected, using built-in glyphs");
                    None
                }
            },
            CaptionFont::Builtin => None,
        };
        Self {
            canvas,
            palette,
            stroke_px,
            metrics: CaptionMetrics::for_canvas(canvas),
            shaped,
        }
    }

    pub fn metrics(&self) -> CaptionMetrics {
        self.metrics
    }

    /// Rasterize `text`, or `None` when there is nothing to draw.
    pub fn render(&mut self, text: &str) -> Option<CaptionLayer> {
        let lines = wrap_greedy(text, self.metrics.wrap_chars);
        if lines.is_empty() {
            return None;
        }
        if self.shaped.is_some() {
            match self.render_shaped(&lines) {
                Ok(layer) => return Some(layer),
                Err(e) => {
                    tracing::warn!(error = %e, "shaped caption failed, using built-in glyphs");
                    self.shaped = None;
                }
            }
        }
        Some(self.render_builtin(lines))
    }

    fn render_shaped(&mut self, lines: &[String]) -> ReelResult<CaptionLayer> {
        let Some(shaped) = self.shaped.as_mut() else {
            return Err(ReelError::render("no shaped font available"));
        };
        let m = self.metrics;
        let cw = self.canvas.width as f32;
        let top = m.block_top(lines.len(), self.canvas);

        let mut surface = RasterSurface::new(self.canvas)?;
        let ctx = surface.begin();
        let mut min_x = cw;
        let mut max_x = 0.0f32;

        for (i, line) in lines.iter().enumerate() {
            let mut size = m.font_px;
            let mut layout = shaped
                .engine
                .layout_line(line, size, TextBrushRgba8::default())?;
            // Over-long single words shrink instead of running off the canvas.
            if layout.width() > m.max_line_width {
                size *= m.max_line_width / layout.width();
                layout = shaped
                    .engine
                    .layout_line(line, size, TextBrushRgba8::default())?;
            }
            let x = (cw - layout.width()) / 2.0;
            let line_top = top + m.line_height * i as f32;
            // Centre the layout's own height inside the line box.
            let y = line_top + (m.line_height - layout.height()) / 2.0;
            min_x = min_x.min(x);
            max_x = max_x.max(x + layout.width());

            let mut glyphs = Vec::new();
            for pline in layout.lines() {
                for item in pline.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    glyphs.extend(run.positioned_glyphs().map(|g| (g.id, g.x, g.y)));
                }
            }

            ctx.set_transform(affine_to_cpu(Affine::translate((
                f64::from(x),
                f64::from(y),
            ))));
            if self.stroke_px > 0.0 {
                // Stroke is centred on the outline; the fill covers the inner half.
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(f64::from(self.stroke_px) * 2.0));
                ctx.set_paint(color_to_cpu(self.palette.stroke));
                ctx.glyph_run(&shaped.font)
                    .font_size(size)
                    .stroke_glyphs(glyphs.iter().map(|&(id, gx, gy)| vello_cpu::Glyph {
                        id,
                        x: gx,
                        y: gy,
                    }));
            }
            ctx.set_paint(color_to_cpu(self.palette.fill));
            ctx.glyph_run(&shaped.font)
                .font_size(size)
                .fill_glyphs(glyphs.iter().map(|&(id, gx, gy)| vello_cpu::Glyph {
                    id,
                    x: gx,
                    y: gy,
                }));
        }

        let full = surface.finish();
        let bounds = Rect::new(
            f64::from(min_x - self.stroke_px),
            f64::from(top - self.stroke_px),
            f64::from(max_x + self.stroke_px),
            f64::from(top + m.line_height * lines.len() as f32 + self.stroke_px),
        );
        Ok(CaptionLayer::crop(
            lines.to_vec(),
            full,
            self.canvas,
            bounds,
            false,
        ))
    }

    fn render_builtin(&self, lines: Vec<String>) -> CaptionLayer {
        let m = self.metrics;
        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(1);
        let (unit_w, _) = fallback_font::measure(&"M".repeat(widest), 1.0);
        let cell_px = (m.font_px / 9.0)
            .min(m.max_line_width / unit_w.max(1.0))
            .max(1.0);
        let glyph_h = fallback_font::GLYPH_ROWS as f32 * cell_px;
        let line_height = m.line_height.max(glyph_h * 1.3);
        let block_h = line_height * lines.len() as f32;
        let ch = self.canvas.height as f32;
        let cw = self.canvas.width as f32;
        let top = (ch * m.anchor_y as f32 - block_h / 2.0).clamp(0.0, (ch - block_h).max(0.0));

        let mut full = vec![0u8; self.canvas.rgba_len()];
        let mut target = BitmapTarget {
            data: &mut full,
            width: self.canvas.width,
            height: self.canvas.height,
        };
        let mut min_x = cw;
        let mut max_x = 0.0f32;
        for (i, line) in lines.iter().enumerate() {
            let (w, _) = fallback_font::measure(line, cell_px);
            let x = (cw - w) / 2.0;
            let y = top + line_height * i as f32 + (line_height - glyph_h) / 2.0;
            min_x = min_x.min(x);
            max_x = max_x.max(x + w);
            fallback_font::draw_line(
                &mut target,
                line,
                (x, y),
                cell_px,
                self.palette.fill,
                Some((self.palette.stroke, self.stroke_px)),
            );
        }

        let bounds = Rect::new(
            f64::from(min_x - self.stroke_px),
            f64::from(top),
            f64::from(max_x + self.stroke_px),
            f64::from(top + block_h),
        );
        CaptionLayer::crop(lines, &full, self.canvas, bounds, true)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/caption.rs"]
mod tests;
