use std::path::Path;
use std::sync::Arc;

use crate::assets::media::{self, AudioPcm};
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};

/// One source laid onto the timeline between two sample positions.
#[derive(Clone, Debug)]
pub struct AudioSegment {
    pub timeline_start_sample: u64,
    /// Exclusive.
    pub timeline_end_sample: u64,
    pub volume: f32,
    /// Wrap around to the source start instead of going silent when the source runs out.
    pub looped: bool,
    pub source: Arc<AudioPcm>,
}

#[derive(Clone, Debug)]
pub struct AudioManifest {
    pub sample_rate: u32,
    pub channels: u16,
    pub total_samples: u64,
    /// Narration, one segment per clip.
    pub narration: Vec<AudioSegment>,
    /// Optional music bed spanning the whole timeline.
    pub background: Option<AudioSegment>,
}

impl AudioManifest {
    pub fn new(total_frames: u64, fps: Fps) -> Self {
        Self {
            sample_rate: media::MIX_SAMPLE_RATE,
            channels: media::MIX_CHANNELS,
            total_samples: frame_to_sample(total_frames, fps, media::MIX_SAMPLE_RATE),
            narration: Vec::new(),
            background: None,
        }
    }

    /// Place a clip's narration at `start_frame`. It plays once, at full level.
    pub fn push_narration(&mut self, start_frame: u64, fps: Fps, source: Arc<AudioPcm>) {
        let start = frame_to_sample(start_frame, fps, self.sample_rate);
        let len = source_len_in_mix_samples(&source, self.sample_rate);
        self.narration.push(AudioSegment {
            timeline_start_sample: start,
            timeline_end_sample: start.saturating_add(len).min(self.total_samples),
            volume: 1.0,
            looped: false,
            source,
        });
    }

    /// Lay `source` under the whole timeline, looped, at `volume`.
    pub fn set_background(&mut self, source: Arc<AudioPcm>, volume: f32) {
        self.background = Some(AudioSegment {
            timeline_start_sample: 0,
            timeline_end_sample: self.total_samples,
            volume,
            looped: true,
            source,
        });
    }
}

fn source_len_in_mix_samples(source: &AudioPcm, sample_rate: u32) -> u64 {
    if source.sample_rate == 0 {
        return 0;
    }
    let frames = source.frames() as u128;
    ((frames * u128::from(sample_rate)) / u128::from(source.sample_rate)) as u64
}

/// Mix narration and background into interleaved samples clamped to `[-1, 1]`.
///
/// Narration segments add up where they overlap. The background is scaled by its volume and then
/// limited so its peak never exceeds the narration peak.
pub fn mix_manifest(manifest: &AudioManifest) -> Vec<f32> {
    let mut out = vec![0.0f32; buffer_len(manifest)];
    for seg in &manifest.narration {
        add_segment(&mut out, seg, manifest);
    }

    if let Some(bg) = &manifest.background {
        let mut bed = vec![0.0f32; out.len()];
        add_segment(&mut bed, bg, manifest);

        let narration_peak = peak(&out);
        let bed_peak = peak(&bed);
        let limit = if bed_peak > narration_peak && bed_peak > 0.0 {
            narration_peak / bed_peak
        } else {
            1.0
        };
        if limit < 1.0 {
            tracing::debug!(bed_peak, narration_peak, "limiting background under narration");
        }
        for (o, b) in out.iter_mut().zip(bed) {
            *o += b * limit;
        }
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

fn buffer_len(manifest: &AudioManifest) -> usize {
    manifest.total_samples as usize * usize::from(manifest.channels)
}

pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

fn add_segment(out: &mut [f32], seg: &AudioSegment, manifest: &AudioManifest) {
    let src = seg.source.interleaved_f32.as_slice();
    let src_channels = usize::from(seg.source.channels.max(1));
    let src_frames = src.len() / src_channels;
    if src_frames == 0 || seg.volume == 0.0 || seg.source.sample_rate == 0 {
        return;
    }
    let step = f64::from(seg.source.sample_rate) / f64::from(manifest.sample_rate);
    let channels = usize::from(manifest.channels);
    let end = seg.timeline_end_sample.min(manifest.total_samples);

    for dst_sample in seg.timeline_start_sample..end {
        let rel = (dst_sample - seg.timeline_start_sample) as f64;
        let mut src_pos = rel * step;
        if seg.looped {
            src_pos %= src_frames as f64;
        }
        let src_frame0 = src_pos.floor() as usize;
        if src_frame0 >= src_frames {
            break;
        }
        let src_frame1 = if seg.looped {
            (src_frame0 + 1) % src_frames
        } else {
            (src_frame0 + 1).min(src_frames - 1)
        };
        let frac = (src_pos - src_frame0 as f64) as f32;

        let (l, r) = if src_channels == 1 {
            let v0 = src[src_frame0];
            let v1 = src[src_frame1];
            let v = v0 + ((v1 - v0) * frac);
            (v, v)
        } else {
            let i0 = src_frame0 * src_channels;
            let i1 = src_frame1 * src_channels;
            (
                src[i0] + ((src[i1] - src[i0]) * frac),
                src[i0 + 1] + ((src[i1 + 1] - src[i0 + 1]) * frac),
            )
        };

        let dst_idx = dst_sample as usize * channels;
        out[dst_idx] += l * seg.volume;
        if channels > 1 {
            out[dst_idx + 1] += r * seg.volume;
        }
    }
}

pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::encode(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::encode(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

pub fn frame_to_sample(frame_delta: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame_delta) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
