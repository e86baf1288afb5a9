use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Affine, Canvas, Rgba8Premul};
use crate::foundation::error::{ReelError, ReelResult};

/// One rendered frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8, `width * height * 4` bytes.
    pub data: Vec<u8>,
    /// Color channels are premultiplied by alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA at pixel `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data
            .get(i..i + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Reusable vello_cpu context plus the canvas-sized pixmap it renders into.
pub struct RasterSurface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl RasterSurface {
    pub fn new(canvas: Canvas) -> ReelResult<Self> {
        let (width, height) = canvas_u16(canvas)?;
        Ok(Self {
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }

    /// Start a new drawing pass.
    pub fn begin(&mut self) -> &mut vello_cpu::RenderContext {
        self.ctx.reset();
        &mut self.ctx
    }

    /// Rasterize everything recorded since [`RasterSurface::begin`] into the pixmap.
    pub fn finish(&mut self) -> &mut [u8] {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        self.pixmap.data_as_u8_slice_mut()
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }
}

pub(crate) fn canvas_u16(canvas: Canvas) -> ReelResult<(u16, u16)> {
    dims_u16("canvas", canvas.width, canvas.height)
}

/// vello_cpu addresses pixmaps with `u16` sides.
fn dims_u16(what: &str, width: u32, height: u32) -> ReelResult<(u16, u16)> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(ReelError::render(format!(
            "{what} of {width}x{height} is larger than the rasterizer supports"
        ))),
    }
}

pub fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

/// Paint color for a premultiplied value (vello colors are straight alpha).
pub fn color_to_cpu(c: Rgba8Premul) -> vello_cpu::peniko::Color {
    if c.a == 0 {
        return vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 0);
    }
    let a = u32::from(c.a);
    let unpremul = |v: u8| ((u32::from(v) * 255 + a / 2) / a).min(255) as u8;
    vello_cpu::peniko::Color::from_rgba8(unpremul(c.r), unpremul(c.g), unpremul(c.b), c.a)
}

/// Fill the whole surface with `color`.
pub fn fill_canvas(ctx: &mut vello_cpu::RenderContext, canvas: Canvas, color: Rgba8Premul) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(color_to_cpu(color));
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
}

/// Draw an image paint of `w`×`h` source pixels through `transform`.
pub fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    paint: &vello_cpu::Image,
    (w, h): (f64, f64),
    transform: Affine,
    opacity: f32,
) {
    if opacity <= 0.0 {
        return;
    }
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(paint.clone());
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

pub fn image_paint(img: &PreparedImage) -> ReelResult<vello_cpu::Image> {
    let pixmap = premul_bytes_to_pixmap(img.rgba8_premul.as_slice(), img.width, img.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

pub fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let (w, h) = dims_u16("image", width, height)?;
    let expected = width as usize * height as usize * 4;
    if rgba8_premul.len() != expected {
        return Err(ReelError::render(format!(
            "image holds {} bytes, {width}x{height} needs {expected}",
            rgba8_premul.len()
        )));
    }

    let pixels: Vec<_> = rgba8_premul
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
        .collect();
    let translucent = pixels.iter().any(|px| px.a != 255);
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        translucent,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
