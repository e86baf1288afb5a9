use std::sync::Arc;

use crate::assets::media::{AudioPcm, MediaBackend};
use crate::assets::resolve::ResolvedScene;
use crate::compose::caption::{CaptionLayer, CaptionRenderer};
use crate::compose::motion::MotionChooser;
use crate::compose::style::StyleProfile;
use crate::compose::visual::VisualLayer;
use crate::effects::transitions::TransitionPolicy;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::ReelResult;
use crate::render::cpu::RasterSurface;

/// Frames spanned by a clip of `duration_sec`: rounded to the nearest frame, at least one.
pub fn clip_frames(duration_sec: f64, fps: Fps) -> u64 {
    fps.secs_to_frames_round(duration_sec).max(1)
}

/// A scene composed into visual, caption and narration, ready for the timeline.
pub struct TimedClip {
    /// Index of the source scene in the input list.
    pub index: usize,
    /// Narration length in seconds.
    pub duration_sec: f64,
    pub frames: u64,
    /// How this clip joins the one before it.
    pub transition_in: TransitionPolicy,
    visual: VisualLayer,
    caption: Option<CaptionLayer>,
    narration: Arc<AudioPcm>,
}

impl std::fmt::Debug for TimedClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedClip")
            .field("index", &self.index)
            .field("duration_sec", &self.duration_sec)
            .field("frames", &self.frames)
            .field("transition_in", &self.transition_in)
            .field("has_caption", &self.caption.is_some())
            .finish_non_exhaustive()
    }
}

/// Inputs shared by every scene of one render.
pub struct AssemblyContext<'a> {
    pub profile: &'a StyleProfile,
    pub canvas: Canvas,
    pub fps: Fps,
    pub chooser: &'a mut dyn MotionChooser,
    pub captions: &'a mut CaptionRenderer,
}

/// Scene Assembler: `(resolved scene, render settings) -> timed clip`.
///
/// The narration is the clip's only audio. The first clip of a timeline always starts with a cut.
pub fn assemble(
    scene: ResolvedScene,
    cx: &mut AssemblyContext<'_>,
    is_first: bool,
) -> ReelResult<TimedClip> {
    let frames = clip_frames(scene.duration_sec, cx.fps);
    let visual = VisualLayer::plan(&scene, cx.profile, cx.canvas, cx.fps, frames, cx.chooser)?;
    let caption = cx.captions.render(&scene.record.caption_text);
    let transition_in = if is_first {
        TransitionPolicy::Cut
    } else {
        cx.profile.transition
    };
    tracing::info!(
        index = scene.index,
        frames,
        duration_sec = scene.duration_sec,
        caption_lines = caption.as_ref().map_or(0, |c| c.lines.len()),
        "assembled clip"
    );

    Ok(TimedClip {
        index: scene.index,
        duration_sec: scene.duration_sec,
        frames,
        transition_in,
        visual,
        caption,
        narration: Arc::new(scene.narration),
    })
}

impl TimedClip {
    pub fn narration(&self) -> &Arc<AudioPcm> {
        &self.narration
    }

    pub fn caption(&self) -> Option<&CaptionLayer> {
        self.caption.as_ref()
    }

    pub fn visual(&self) -> &VisualLayer {
        &self.visual
    }

    /// Draw frame `local_frame` into `surface`: visual first, caption on top.
    pub fn render_frame(
        &mut self,
        local_frame: u64,
        surface: &mut RasterSurface,
        media: &mut dyn MediaBackend,
    ) -> ReelResult<()> {
        let canvas = surface.canvas();
        self.visual.draw(surface.begin(), local_frame, media)?;
        let data = surface.finish();
        if let Some(caption) = &self.caption {
            caption.composite_onto(data, canvas)?;
        }
        Ok(())
    }

    /// Close decoders and drop pixel buffers once the clip is no longer on screen.
    pub fn release(&mut self) {
        self.visual.release();
        self.caption = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clip.rs"]
mod tests;
