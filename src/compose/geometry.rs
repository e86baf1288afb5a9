use crate::foundation::core::{Affine, Canvas, Point, Vec2};

/// Uniform scale that makes a `src_w`×`src_h` source fully cover `canvas`.
///
/// Sources wider than the canvas match its height; all others match its width. The overflow is
/// cropped symmetrically by centering.
pub fn cover_scale(src_w: f64, src_h: f64, canvas: Canvas) -> f64 {
    let src_aspect = src_w / src_h.max(f64::EPSILON);
    if src_aspect > canvas.aspect() {
        f64::from(canvas.height) / src_h.max(f64::EPSILON)
    } else {
        f64::from(canvas.width) / src_w.max(f64::EPSILON)
    }
}

/// Uniform scale that fits a source to `box_w` wide without exceeding `max_h` high.
pub fn inset_scale(src_w: f64, src_h: f64, box_w: f64, max_h: f64) -> f64 {
    (box_w / src_w.max(f64::EPSILON)).min(max_h / src_h.max(f64::EPSILON))
}

/// Per-frame animation state of a layer, relative to its resting placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerPose {
    /// Translation of the layer centre in canvas pixels.
    pub offset: Vec2,
    /// Multiplier on top of the resting scale.
    pub scale: f64,
    pub rotation_rad: f64,
    pub opacity: f32,
}

impl Default for LayerPose {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            rotation_rad: 0.0,
            opacity: 1.0,
        }
    }
}

/// Source-space to canvas-space transform.
///
/// The source centre lands on `anchor + pose.offset`; rotation and scale pivot around it.
pub fn layer_affine(src_w: f64, src_h: f64, base_scale: f64, anchor: Point, pose: &LayerPose) -> Affine {
    Affine::translate(anchor.to_vec2() + pose.offset)
        * Affine::rotate(pose.rotation_rad)
        * Affine::scale(base_scale * pose.scale)
        * Affine::translate(Vec2::new(-src_w / 2.0, -src_h / 2.0))
}

/// Clamp `offset` so a source drawn at `total_scale` around the canvas centre keeps covering it.
pub fn clamp_offset_to_cover(
    src_w: f64,
    src_h: f64,
    total_scale: f64,
    canvas: Canvas,
    offset: Vec2,
) -> Vec2 {
    let slack_x = ((src_w * total_scale - f64::from(canvas.width)) / 2.0).max(0.0);
    let slack_y = ((src_h * total_scale - f64::from(canvas.height)) / 2.0).max(0.0);
    Vec2::new(
        offset.x.clamp(-slack_x, slack_x),
        offset.y.clamp(-slack_y, slack_y),
    )
}

/// Every canvas corner maps back inside the source bounds, so no empty margin is visible.
pub fn covers_canvas(transform: Affine, src_w: f64, src_h: f64, canvas: Canvas) -> bool {
    const EPS: f64 = 1e-6;
    if transform.determinant().abs() < f64::EPSILON {
        return false;
    }
    let inv = transform.inverse();
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    [(0.0, 0.0), (cw, 0.0), (0.0, ch), (cw, ch)]
        .into_iter()
        .all(|(x, y)| {
            let p = inv * Point::new(x, y);
            p.x >= -EPS && p.y >= -EPS && p.x <= src_w + EPS && p.y <= src_h + EPS
        })
}

pub fn canvas_center(canvas: Canvas) -> Point {
    Point::new(f64::from(canvas.width) / 2.0, f64::from(canvas.height) / 2.0)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/geometry.rs"]
mod tests;
