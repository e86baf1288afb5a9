use std::path::PathBuf;

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};

/// Default mix ratio for background music relative to nominal level.
pub const DEFAULT_BACKGROUND_VOLUME: f32 = 0.08;
/// Default crossfade length between cinematic scenes.
pub const DEFAULT_CROSSFADE_SEC: f64 = 0.5;
/// Default per-scene fade in/out length under the minimalist style.
pub const DEFAULT_FADE_SEC: f64 = 0.5;
/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 30;

/// Supported output frame rates (inclusive).
pub const FPS_RANGE: std::ops::RangeInclusive<u32> = 24..=30;

/// One narrated segment: narration audio, optional visual and a caption.
///
/// Records are never mutated once handed to the pipeline; list order is timeline order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneRecord {
    /// Narration audio. Authoritative for the scene's duration.
    pub audio_ref: PathBuf,
    /// Still image or motion clip. Absence is valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_ref: Option<PathBuf>,
    /// Caption text, may be empty.
    #[serde(default)]
    pub caption_text: String,
    /// Character/camera motion request, honored by the minimalist style only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion_hint: Option<MotionHint>,
    /// Narration mood. Consumed upstream by speech synthesis; ignored here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_hint: Option<String>,
}

impl SceneRecord {
    pub fn new(audio_ref: impl Into<PathBuf>) -> Self {
        Self {
            audio_ref: audio_ref.into(),
            visual_ref: None,
            caption_text: String::new(),
            motion_hint: None,
            mood_hint: None,
        }
    }

    pub fn with_visual(mut self, visual_ref: impl Into<PathBuf>) -> Self {
        self.visual_ref = Some(visual_ref.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption_text = caption.into();
        self
    }

    pub fn with_motion_hint(mut self, hint: MotionHint) -> Self {
        self.motion_hint = Some(hint);
        self
    }
}

/// Motion character for minimalist scenes.
///
/// Unknown hint strings deserialize to [`MotionHint::Floating`], the default motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MotionHint {
    /// Default slow vertical float.
    Floating,
    /// Pronounced, fast vertical bounce.
    Jumping,
    /// Gentle rotational sway.
    Swaying,
    /// High-frequency positional jitter.
    Shaking,
    /// Bounce expressed as rapid scale pulsing.
    Pulsing,
}

impl MotionHint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Floating => "floating",
            Self::Jumping => "jumping",
            Self::Swaying => "swaying",
            Self::Shaking => "shaking",
            Self::Pulsing => "pulsing",
        }
    }

    /// Parse a hint name, accepting common aliases. Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "floating" | "float" | "idle" | "default" => Some(Self::Floating),
            "jumping" | "jump" | "excited" => Some(Self::Jumping),
            "swaying" | "sway" | "thinking" => Some(Self::Swaying),
            "shaking" | "shake" | "jitter" | "scared" => Some(Self::Shaking),
            "pulsing" | "pulse" | "bouncing" | "bounce" => Some(Self::Pulsing),
            _ => None,
        }
    }
}

impl From<String> for MotionHint {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or(Self::Floating)
    }
}

impl From<MotionHint> for String {
    fn from(h: MotionHint) -> Self {
        h.as_str().to_string()
    }
}

/// Visual style applied to the whole render.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Full-bleed imagery, Ken-Burns motion, pale captions, crossfades.
    #[default]
    Cinematic,
    /// Light flat background, floating inset visual, dark captions, per-scene fades.
    Minimalist,
}

/// Background music laid under the narration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BackgroundTrack {
    pub path: PathBuf,
    /// Linear gain relative to nominal level.
    #[serde(default = "default_background_volume")]
    pub volume: f32,
}

impl BackgroundTrack {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            volume: DEFAULT_BACKGROUND_VOLUME,
        }
    }
}

/// Settings fixed for one render invocation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderConfig {
    pub canvas: Canvas,
    #[serde(default)]
    pub style: Style,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_track: Option<BackgroundTrack>,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crossfade_sec")]
    pub crossfade_sec: f64,
    #[serde(default = "default_fade_sec")]
    pub fade_sec: f64,
    /// Font file used for captions. Missing or unusable fonts fall back to built-in glyphs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_font: Option<PathBuf>,
    #[serde(default = "default_caption_stroke_px")]
    pub caption_stroke_px: f32,
    /// Seed for the Ken-Burns variant chooser. `None` draws from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Passed through to the encoder's thread count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encode_threads: Option<u32>,
}

impl RenderConfig {
    pub fn new(canvas: Canvas, style: Style) -> Self {
        Self {
            canvas,
            style,
            background_track: None,
            fps: DEFAULT_FPS,
            crossfade_sec: DEFAULT_CROSSFADE_SEC,
            fade_sec: DEFAULT_FADE_SEC,
            caption_font: None,
            caption_stroke_px: default_caption_stroke_px(),
            seed: None,
            encode_threads: None,
        }
    }

    pub fn with_background(mut self, track: BackgroundTrack) -> Self {
        self.background_track = Some(track);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn frame_rate(&self) -> ReelResult<Fps> {
        Fps::new(self.fps, 1)
    }

    pub fn validate(&self) -> ReelResult<()> {
        let Canvas { width, height } = self.canvas;
        if width == 0 || height == 0 {
            return Err(ReelError::validation("canvas width/height must be non-zero"));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "canvas width/height must be even (required for yuv420p output)",
            ));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(ReelError::validation("canvas dimensions exceed 65535"));
        }
        if !FPS_RANGE.contains(&self.fps) {
            return Err(ReelError::validation(format!(
                "fps must be within {}..={}, got {}",
                FPS_RANGE.start(),
                FPS_RANGE.end(),
                self.fps
            )));
        }
        for (name, v) in [("crossfade_sec", self.crossfade_sec), ("fade_sec", self.fade_sec)] {
            if !v.is_finite() || v < 0.0 {
                return Err(ReelError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if !self.caption_stroke_px.is_finite() || self.caption_stroke_px < 0.0 {
            return Err(ReelError::validation(
                "caption_stroke_px must be finite and >= 0",
            ));
        }
        if let Some(bg) = &self.background_track
            && !(0.0..=1.0).contains(&bg.volume)
        {
            return Err(ReelError::validation(
                "background_track.volume must be within [0, 1]",
            ));
        }
        if self.encode_threads == Some(0) {
            return Err(ReelError::validation(
                "encode_threads must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

fn default_background_volume() -> f32 {
    DEFAULT_BACKGROUND_VOLUME
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

fn default_crossfade_sec() -> f64 {
    DEFAULT_CROSSFADE_SEC
}

fn default_fade_sec() -> f64 {
    DEFAULT_FADE_SEC
}

fn default_caption_stroke_px() -> f32 {
    3.0
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
