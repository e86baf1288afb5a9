use crate::assets::media::MediaBackend;
use crate::audio::mix::AudioManifest;
use crate::effects::composite::crossfade_in_place;
use crate::effects::transitions::crossfade_progress;
use crate::foundation::core::{Canvas, Fps, FrameRange};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::cpu::{FrameRGBA, RasterSurface};
use crate::timeline::clip::TimedClip;

/// Timeline Concatenator: an arena of clips in input order plus their start offsets.
///
/// `offset[0] = 0` and `offset[i] = offset[i-1] + frames[i-1] - overlap[i]`, where `overlap[i]`
/// is the crossfade shared by clips `i-1` and `i`. No two overlaps touch, so at most two clips
/// are on screen at any frame.
pub struct Timeline {
    clips: Vec<TimedClip>,
    offsets: Vec<u64>,
    overlaps: Vec<u64>,
    total_frames: u64,
    fps: Fps,
    canvas: Canvas,
    surface: RasterSurface,
    released: usize,
}

impl Timeline {
    pub fn new(clips: Vec<TimedClip>, fps: Fps, canvas: Canvas) -> ReelResult<Self> {
        if clips.is_empty() {
            return Err(ReelError::validation("timeline needs at least one clip"));
        }

        let mut offsets = Vec::with_capacity(clips.len());
        let mut overlaps = Vec::with_capacity(clips.len());
        let mut cursor = 0u64;
        let mut prev_frames = None;
        for clip in &clips {
            let overlap = match prev_frames {
                Some(prev) => clip.transition_in.overlap_frames(fps, prev, clip.frames),
                None => 0,
            };
            cursor -= overlap;
            offsets.push(cursor);
            overlaps.push(overlap);
            cursor += clip.frames;
            prev_frames = Some(clip.frames);
        }
        tracing::debug!(clips = clips.len(), total_frames = cursor, ?overlaps, "built timeline");

        Ok(Self {
            clips,
            offsets,
            overlaps,
            total_frames: cursor,
            fps,
            canvas,
            surface: RasterSurface::new(canvas)?,
            released: 0,
        })
    }

    pub fn clips(&self) -> &[TimedClip] {
        &self.clips
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Crossfade frames shared with the previous clip, per clip.
    pub fn overlaps(&self) -> &[u64] {
        &self.overlaps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn total_duration_sec(&self) -> f64 {
        self.fps.frames_to_secs(self.total_frames)
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Frames occupied by clip `i`.
    pub fn clip_range(&self, i: usize) -> Option<FrameRange> {
        let clip = self.clips.get(i)?;
        Some(FrameRange::with_len(self.offsets[i], clip.frames))
    }

    /// Topmost clip at `frame`: the latest one that has started.
    pub fn clip_at(&self, frame: u64) -> Option<usize> {
        if frame >= self.total_frames {
            return None;
        }
        Some(self.offsets.partition_point(|&o| o <= frame) - 1)
    }

    /// Rasterize timeline frame `frame`, dissolving between clips inside crossfades.
    pub fn render_frame(
        &mut self,
        frame: u64,
        media: &mut dyn MediaBackend,
    ) -> ReelResult<FrameRGBA> {
        let i = self.clip_at(frame).ok_or_else(|| {
            ReelError::validation(format!(
                "frame {frame} is outside the timeline ({} frames)",
                self.total_frames
            ))
        })?;
        let local = frame - self.offsets[i];
        let overlap = self.overlaps[i];

        let data = if i > 0 && local < overlap {
            let prev_local = frame - self.offsets[i - 1];
            self.clips[i - 1].render_frame(prev_local, &mut self.surface, media)?;
            let mut out = self.surface.data().to_vec();
            self.clips[i].render_frame(local, &mut self.surface, media)?;
            crossfade_in_place(
                &mut out,
                self.surface.data(),
                crossfade_progress(local, overlap),
            )?;
            out
        } else {
            self.clips[i].render_frame(local, &mut self.surface, media)?;
            self.surface.data().to_vec()
        };

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
            premultiplied: true,
        })
    }

    /// Release every clip that ends before `frame`.
    pub fn release_finished(&mut self, frame: u64) {
        while self.released < self.clips.len() {
            let i = self.released;
            if self.offsets[i] + self.clips[i].frames > frame {
                break;
            }
            tracing::debug!(index = self.clips[i].index, "releasing clip");
            self.clips[i].release();
            self.released += 1;
        }
    }

    /// Narration of every clip placed at its offset. Crossfaded narrations overlap additively.
    pub fn audio_manifest(&self) -> AudioManifest {
        let mut manifest = AudioManifest::new(self.total_frames, self.fps);
        for (clip, &offset) in self.clips.iter().zip(&self.offsets) {
            manifest.push_narration(offset, self.fps, clip.narration().clone());
        }
        manifest
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/concat.rs"]
mod tests;
