use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::assets::fonts::CaptionFont;
use crate::assets::media::{MediaBackend, tool_responds};
use crate::assets::resolve::resolve_scene;
use crate::audio::mix::{AudioManifest, mix_manifest, peak, write_mix_to_f32le_file};
use crate::compose::caption::CaptionRenderer;
use crate::compose::motion::{MotionChooser, SeededChooser};
use crate::compose::style::StyleProfile;
use crate::encode::ffmpeg::{
    FfmpegSink, FfmpegSinkOpts, TempFileGuard, ensure_parent_dir, flatten_onto_backdrop,
};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::cpu::FrameRGBA;
use crate::scene::model::{RenderConfig, SceneRecord};
use crate::timeline::clip::{AssemblyContext, assemble};
use crate::timeline::concat::Timeline;

/// What happened to one input scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneOutcome {
    Rendered { index: usize, frames: u64 },
    /// Dropped from the timeline after a scene-local failure.
    Skipped { index: usize, reason: String },
}

impl SceneOutcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Rendered { index, .. } | Self::Skipped { index, .. } => *index,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderStats {
    pub frames_total: u64,
    /// Frames in which two clips are dissolved together.
    pub crossfade_frames: u64,
    /// Clips drawn over a placeholder plane instead of a visual.
    pub placeholder_clips: usize,
    pub background_mixed: bool,
    /// Peak absolute sample of the final mix.
    pub audio_peak: f32,
}

/// Result of a successful render.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    /// One entry per input scene, in input order.
    pub scenes: Vec<SceneOutcome>,
    pub total_frames: u64,
    pub total_duration_sec: f64,
    pub stats: RenderStats,
}

impl RenderReport {
    pub fn rendered_count(&self) -> usize {
        self.scenes.iter().filter(|s| s.is_rendered()).count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SceneOutcome> {
        self.scenes.iter().filter(|s| !s.is_rendered())
    }
}

/// Timeline and audio ready to be streamed to a sink.
pub struct PreparedRender {
    pub timeline: Timeline,
    pub audio: AudioManifest,
    pub outcomes: Vec<SceneOutcome>,
}

/// Runs scenes through resolve, compose, assemble and concatenate, then streams the timeline to
/// a [`FrameSink`].
///
/// One pass, one scene at a time, in input order.
pub struct SceneCompositor {
    cfg: RenderConfig,
    profile: StyleProfile,
    fps: Fps,
    font: CaptionFont,
    chooser: Box<dyn MotionChooser>,
}

impl SceneCompositor {
    /// Validate `cfg` and resolve the caption font. The Ken-Burns chooser is seeded from
    /// `cfg.seed`.
    pub fn new(cfg: RenderConfig) -> ReelResult<Self> {
        cfg.validate()?;
        let fps = cfg.frame_rate()?;
        let font = CaptionFont::resolve(cfg.caption_font.as_deref());
        Ok(Self {
            profile: StyleProfile::for_config(&cfg),
            fps,
            font,
            chooser: Box::new(SeededChooser::new(cfg.seed)),
            cfg,
        })
    }

    pub fn with_chooser(mut self, chooser: impl MotionChooser + 'static) -> Self {
        self.chooser = Box::new(chooser);
        self
    }

    pub fn with_caption_font(mut self, font: CaptionFont) -> Self {
        self.font = font;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.cfg
    }

    pub fn profile(&self) -> &StyleProfile {
        &self.profile
    }

    /// Resolve and assemble every scene, then lay out the timeline and its audio.
    ///
    /// Scene-local failures are logged and skipped. Fails when no scene survives.
    pub fn prepare(
        &mut self,
        scenes: &[SceneRecord],
        media: &mut dyn MediaBackend,
    ) -> ReelResult<PreparedRender> {
        let canvas = self.cfg.canvas;
        let mut captions = CaptionRenderer::new(
            canvas,
            self.profile.caption,
            self.cfg.caption_stroke_px,
            &self.font,
        );
        let mut clips = Vec::with_capacity(scenes.len());
        let mut outcomes = Vec::with_capacity(scenes.len());

        for (index, record) in scenes.iter().enumerate() {
            let _scene = tracing::info_span!("scene", index).entered();
            let mut cx = AssemblyContext {
                profile: &self.profile,
                canvas,
                fps: self.fps,
                chooser: self.chooser.as_mut(),
                captions: &mut captions,
            };
            let is_first = clips.is_empty();
            let clip = resolve_scene(index, record, canvas, media)
                .and_then(|scene| assemble(scene, &mut cx, is_first));
            match clip {
                Ok(clip) => {
                    outcomes.push(SceneOutcome::Rendered {
                        index,
                        frames: clip.frames,
                    });
                    clips.push(clip);
                }
                Err(e) if e.is_scene_local() => {
                    tracing::warn!(index, error = %e, "skipping scene");
                    outcomes.push(SceneOutcome::Skipped {
                        index,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if clips.is_empty() {
            return Err(ReelError::render(format!(
                "none of the {} scenes produced a clip",
                scenes.len()
            )));
        }

        let timeline = Timeline::new(clips, self.fps, canvas)?;
        let mut audio = timeline.audio_manifest();
        if let Some(track) = &self.cfg.background_track {
            match media.decode_audio(&track.path) {
                Ok(pcm) if pcm.frames() > 0 => audio.set_background(Arc::new(pcm), track.volume),
                Ok(_) => {
                    tracing::warn!(track = %track.path.display(), "background track is empty, skipping it");
                }
                Err(e) => {
                    tracing::warn!(track = %track.path.display(), error = %e, "background track unusable, skipping it");
                }
            }
        }

        tracing::info!(
            clips = timeline.clips().len(),
            skipped = outcomes.len() - timeline.clips().len(),
            total_frames = timeline.total_frames(),
            duration_sec = timeline.total_duration_sec(),
            "timeline ready"
        );
        Ok(PreparedRender {
            timeline,
            audio,
            outcomes,
        })
    }

    /// Render `scenes` into `sink`.
    ///
    /// On any failure after the sink has begun, the sink is aborted rather than ended.
    pub fn render(
        &mut self,
        scenes: &[SceneRecord],
        media: &mut dyn MediaBackend,
        sink: &mut dyn FrameSink,
    ) -> ReelResult<RenderReport> {
        let _render = tracing::info_span!("render", scenes = scenes.len(), style = ?self.cfg.style)
            .entered();
        let prepared = self.prepare(scenes, media)?;
        self.stream(prepared, media, sink)
    }

    fn stream(
        &self,
        prepared: PreparedRender,
        media: &mut dyn MediaBackend,
        sink: &mut dyn FrameSink,
    ) -> ReelResult<RenderReport> {
        let PreparedRender {
            mut timeline,
            audio,
            outcomes,
        } = prepared;

        let mixed = mix_manifest(&audio);
        let audio_path = std::env::temp_dir().join(format!(
            "reelforge_audio_mix_{}_{}.f32le",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        write_mix_to_f32le_file(&mixed, &audio_path)?;
        let _audio_tmp = TempFileGuard(audio_path.clone());

        let stats = RenderStats {
            frames_total: timeline.total_frames(),
            crossfade_frames: timeline.overlaps().iter().sum(),
            placeholder_clips: timeline
                .clips()
                .iter()
                .filter(|c| c.visual().is_placeholder())
                .count(),
            background_mixed: audio.background.is_some(),
            audio_peak: peak(&mixed),
        };

        let canvas = timeline.canvas();
        let begun = sink.begin(SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: self.fps,
            audio: Some(AudioInputConfig {
                path: audio_path,
                sample_rate: audio.sample_rate,
                channels: audio.channels,
            }),
        });
        if let Err(e) = begun.and_then(|()| push_all_frames(&mut timeline, media, sink)) {
            tracing::warn!(error = %e, "render failed, discarding output");
            sink.abort();
            return Err(e);
        }

        tracing::info!(frames = stats.frames_total, "render complete");
        Ok(RenderReport {
            scenes: outcomes,
            total_frames: timeline.total_frames(),
            total_duration_sec: timeline.total_duration_sec(),
            stats,
        })
    }

    /// Render to an MP4 file with the system `ffmpeg`. Returns the output path and the report.
    pub fn render_to_mp4(
        &mut self,
        scenes: &[SceneRecord],
        media: &mut dyn MediaBackend,
        out_path: impl Into<PathBuf>,
    ) -> ReelResult<(PathBuf, RenderReport)> {
        let opts = FfmpegSinkOpts::new(out_path).with_threads(self.cfg.encode_threads);
        if !tool_responds(&opts.ffmpeg) {
            return Err(ReelError::encode(format!(
                "ffmpeg is required for MP4 rendering, but '{}' did not respond",
                opts.ffmpeg.display()
            )));
        }
        let mut sink = FfmpegSink::new(opts);
        let report = self.render(scenes, media, &mut sink)?;
        Ok((sink.out_path().to_path_buf(), report))
    }

    /// Rasterize the single timeline frame nearest to `t_sec`, clamped to the timeline.
    pub fn render_frame_at(
        &mut self,
        scenes: &[SceneRecord],
        media: &mut dyn MediaBackend,
        t_sec: f64,
    ) -> ReelResult<FrameRGBA> {
        if !t_sec.is_finite() || t_sec < 0.0 {
            return Err(ReelError::validation("frame time must be finite and >= 0"));
        }
        let mut prepared = self.prepare(scenes, media)?;
        let last = prepared.timeline.total_frames().saturating_sub(1);
        let frame = self.fps.secs_to_frames_round(t_sec).min(last);
        prepared.timeline.render_frame(frame, media)
    }
}

fn push_all_frames(
    timeline: &mut Timeline,
    media: &mut dyn MediaBackend,
    sink: &mut dyn FrameSink,
) -> ReelResult<()> {
    for f in 0..timeline.total_frames() {
        let frame = timeline.render_frame(f, media)?;
        sink.push_frame(FrameIndex(f), &frame)?;
        timeline.release_finished(f + 1);
    }
    sink.end()
}

/// Write a frame as an opaque PNG, flattening any transparency over black.
pub fn write_png(frame: &FrameRGBA, path: &Path) -> ReelResult<()> {
    let mut rgba = vec![0u8; frame.data.len()];
    if frame.premultiplied {
        flatten_onto_backdrop(&mut rgba, &frame.data, [0, 0, 0, 255])?;
    } else {
        rgba.copy_from_slice(&frame.data);
    }
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        &rgba,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
