//! Reelforge turns an ordered list of narrated scenes into one finished short-form video.
//!
//! - Describe scenes as [`SceneRecord`]s and the render as a [`RenderConfig`]
//! - Create a [`SceneCompositor`]
//! - Stream the timeline into a [`FrameSink`], or straight to MP4 with
//!   [`SceneCompositor::render_to_mp4`]
#![forbid(unsafe_code)]

/// Asset resolution, media decoding and caption fonts.
pub mod assets;
/// Narration placement and background mixing.
pub mod audio;
/// Frame Compositor and Caption Renderer.
pub mod compose;
/// Pixel compositing and transitions.
pub mod effects;
/// Frame sinks.
pub mod encode;
mod foundation;
/// CPU raster helpers and the render pipeline.
pub mod render;
/// Input records and render configuration.
pub mod scene;
/// Scene assembly and concatenation.
pub mod timeline;

pub use crate::foundation::core::{
    Affine, Canvas, Fps, FrameIndex, FrameRange, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::assets::fonts::CaptionFont;
pub use crate::assets::media::{
    AudioPcm, FfmpegMedia, MediaBackend, VideoFrameStream, VideoSourceInfo,
};
pub use crate::compose::motion::{KenBurns, MotionChooser, SeededChooser};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::render::cpu::FrameRGBA;
pub use crate::render::pipeline::{
    PreparedRender, RenderReport, RenderStats, SceneCompositor, SceneOutcome, write_png,
};
pub use crate::scene::manifest::ScriptManifest;
pub use crate::scene::model::{
    BackgroundTrack, MotionHint, RenderConfig, SceneRecord, Style,
};
