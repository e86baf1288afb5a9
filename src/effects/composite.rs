//! Per-pixel premultiplied RGBA8 blending used by transitions and overlays.

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Map a `0..=1` factor onto the 8-bit weight scale.
fn weight(factor: f32) -> u16 {
    (factor.clamp(0.0, 1.0) * 255.0).round() as u16
}

fn scale(c: u8, w: u16) -> u8 {
    mul_div255_u8(u16::from(c), w)
}

/// `src` over `dst`, with `src` first faded by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let w = weight(opacity);
    let src_a = scale(src[3], w);
    if src_a == 0 {
        return dst;
    }
    let keep = 255 - u16::from(src_a);
    let mut out = [0u8; 4];
    for c in 0..3 {
        out[c] = scale(src[c], w).saturating_add(scale(dst[c], keep));
    }
    out[3] = src_a.saturating_add(scale(dst[3], keep));
    out
}

/// Mix `from` towards `to`; `t = 0` is `from`, `t = 1` is `to`.
pub fn crossfade(from: PremulRgba8, to: PremulRgba8, t: f32) -> PremulRgba8 {
    let w_to = weight(t);
    let w_from = 255 - w_to;
    std::array::from_fn(|c| scale(from[c], w_from).saturating_add(scale(to[c], w_to)))
}

fn same_shape(what: &str, a: &[u8], b: &[u8]) -> ReelResult<()> {
    if a.len() == b.len() && a.len().is_multiple_of(4) {
        return Ok(());
    }
    Err(ReelError::render(format!(
        "{what}: buffers of {} and {} bytes are not the same rgba8 frame",
        a.len(),
        b.len()
    )))
}

fn px(chunk: &[u8]) -> PremulRgba8 {
    [chunk[0], chunk[1], chunk[2], chunk[3]]
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ReelResult<()> {
    same_shape("overlay", dst, src)?;
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] != 0 {
            d.copy_from_slice(&over(px(d), px(s), opacity));
        }
    }
    Ok(())
}

/// Blend `incoming` into `dst`, which holds the outgoing frame.
pub fn crossfade_in_place(dst: &mut [u8], incoming: &[u8], t: f32) -> ReelResult<()> {
    same_shape("crossfade", dst, incoming)?;
    match weight(t) {
        0 => {}
        255 => dst.copy_from_slice(incoming),
        _ => {
            for (d, s) in dst.chunks_exact_mut(4).zip(incoming.chunks_exact(4)) {
                d.copy_from_slice(&crossfade(px(d), px(s), t));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
