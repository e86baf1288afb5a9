use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Decoded still, premultiplied RGBA8 in row-major order.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Raster formats recognized as stills. Anything else is treated as a motion clip.
pub fn is_still_image_path(path: &Path) -> bool {
    image::ImageFormat::from_path(path).is_ok_and(|f| {
        matches!(
            f,
            image::ImageFormat::Png
                | image::ImageFormat::Jpeg
                | image::ImageFormat::WebP
                | image::ImageFormat::Bmp
                | image::ImageFormat::Gif
                | image::ImageFormat::Tiff
        )
    })
}

/// Longest side the CPU rasterizer accepts.
pub const MAX_RASTER_SIDE: u32 = u16::MAX as u32;

/// Size a `width`x`height` still is stored at.
///
/// With `needed`, anything larger than the smallest size that still covers `needed` shrinks to
/// that size (aspect preserved). Either way neither side exceeds [`MAX_RASTER_SIDE`].
pub fn fitted_size((width, height): (u32, u32), needed: Option<(u32, u32)>) -> (u32, u32) {
    let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));
    let mut scale = match needed {
        Some((nw, nh)) => (f64::from(nw.max(1)) / w)
            .max(f64::from(nh.max(1)) / h)
            .min(1.0),
        None => 1.0,
    };
    let limit = f64::from(MAX_RASTER_SIDE);
    scale = scale.min(limit / w).min(limit / h);
    if scale >= 1.0 {
        return (width, height);
    }
    let side = |v: f64| ((v * scale - 1e-9).ceil() as u32).clamp(1, MAX_RASTER_SIDE);
    (side(w), side(h))
}

/// Read a still's pixel size from its header without decoding it.
pub fn probe_image_file(path: &Path) -> ReelResult<(u32, u32)> {
    image::ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| ReelError::decode(format!("open image '{}': {e}", path.display())))?
        .into_dimensions()
        .map_err(|e| ReelError::decode(format!("image '{}': {e}", path.display())))
}

/// Decode an encoded image, shrink it per [`fitted_size`], and premultiply it.
pub fn decode_image(bytes: &[u8], max_size: Option<(u32, u32)>) -> ReelResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let dyn_img = downscale_oversized(dyn_img, max_size);
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(ReelError::decode("decoded image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub fn decode_image_file(path: &Path, max_size: Option<(u32, u32)>) -> ReelResult<PreparedImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| ReelError::decode(format!("read image '{}': {e}", path.display())))?;
    decode_image(&bytes, max_size)
        .map_err(|e| ReelError::decode(format!("image '{}': {e}", path.display())))
}

/// Wrap straight RGBA8 frame bytes (as produced by the video decoder) into a premultiplied image.
pub fn prepare_rgba_frame(mut rgba: Vec<u8>, width: u32, height: u32) -> ReelResult<PreparedImage> {
    if rgba.len() != (width as usize) * (height as usize) * 4 {
        return Err(ReelError::decode("video frame byte length mismatch"));
    }
    premultiply_rgba8_in_place(&mut rgba);
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba),
    })
}

pub(crate) fn downscale_oversized(
    img: image::DynamicImage,
    needed: Option<(u32, u32)>,
) -> image::DynamicImage {
    let (w, h) = (img.width(), img.height());
    let (nw, nh) = fitted_size((w, h), needed);
    if (nw, nh) == (w, h) {
        return img;
    }
    tracing::debug!(from_w = w, from_h = h, to_w = nw, to_h = nh, "downscaling still");
    img.resize_exact(nw, nh, image::imageops::FilterType::Triangle)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
