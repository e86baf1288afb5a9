use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u8;

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Position on the output timeline, counted in frames from zero.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames `start..end` on the output timeline; `end` is not included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    pub start: FrameIndex,
    pub end: FrameIndex,
}

impl FrameRange {
    pub fn new(start: FrameIndex, end: FrameIndex) -> ReelResult<Self> {
        if end < start {
            return Err(ReelError::validation(format!(
                "frame range ends ({}) before it starts ({})",
                end.0, start.0
            )));
        }
        Ok(Self { start, end })
    }

    /// `len` frames starting at `start`.
    pub fn with_len(start: u64, len: u64) -> Self {
        Self {
            start: FrameIndex(start),
            end: FrameIndex(start.saturating_add(len)),
        }
    }

    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    pub fn is_empty(self) -> bool {
        self.len_frames() == 0
    }

    pub fn contains(self, f: FrameIndex) -> bool {
        (self.start..self.end).contains(&f)
    }
}

/// Output frame rate as the exact fraction `num / den` frames per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32,
}

impl Fps {
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if num == 0 || den == 0 {
            return Err(ReelError::validation(format!(
                "frame rate {num}/{den} has a zero term"
            )));
        }
        Ok(Self { num, den })
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        frames as f64 * f64::from(self.den) / f64::from(self.num)
    }

    /// Nearest whole frame count for `secs`; negative input gives zero.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        let frames = secs * f64::from(self.num) / f64::from(self.den);
        frames.round().max(0.0) as u64
    }
}

/// Pixel size of the rendered video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// 1080x1920, the vertical format used for shorts.
    pub const SHORT_FORM: Canvas = Canvas {
        width: 1080,
        height: 1920,
    };

    /// 1920x1080 landscape.
    pub const LONG_FORM: Canvas = Canvas {
        width: 1920,
        height: 1080,
    };

    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }

    pub fn is_portrait(self) -> bool {
        self.height > self.width
    }

    /// Byte length of one RGBA8 frame.
    pub fn rgba_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// A colour whose RGB channels are already scaled by alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        let scale = |c: u8| mul_div255_u8(u16::from(c), u16::from(a));
        Self {
            r: scale(r),
            g: scale(g),
            b: scale(b),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
