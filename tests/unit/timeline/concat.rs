use std::path::Path;

use super::*;
use crate::assets::fonts::CaptionFont;
use crate::assets::media::{AudioPcm, MIX_CHANNELS, MIX_SAMPLE_RATE, VideoFrameStream, VideoSourceInfo};
use crate::assets::resolve::{ResolvedScene, ResolvedVisual};
use crate::audio::mix::mix_manifest;
use crate::compose::caption::CaptionRenderer;
use crate::compose::motion::KenBurns;
use crate::compose::style::StyleProfile;
use crate::scene::model::{RenderConfig, SceneRecord, Style};
use crate::timeline::clip::{AssemblyContext, assemble};

struct NoMedia;

impl MediaBackend for NoMedia {
    fn decode_audio(&mut self, _path: &Path) -> ReelResult<AudioPcm> {
        Err(ReelError::decode("unused"))
    }
    fn probe_video(&mut self, _path: &Path) -> ReelResult<VideoSourceInfo> {
        Err(ReelError::decode("unused"))
    }
    fn open_video_stream(
        &mut self,
        _info: &VideoSourceInfo,
        _fps: Fps,
        _duration_sec: f64,
    ) -> ReelResult<Box<dyn VideoFrameStream>> {
        Err(ReelError::decode("unused"))
    }
}

fn canvas() -> Canvas {
    Canvas {
        width: 16,
        height: 16,
    }
}

fn fps() -> Fps {
    Fps::new(24, 1).unwrap()
}

fn build(style: Style, durations: &[f64]) -> Timeline {
    let mut cfg = RenderConfig::new(canvas(), style);
    cfg.crossfade_sec = 0.25;
    let profile = StyleProfile::for_config(&cfg);
    let mut chooser = |_: usize| KenBurns::ZoomIn;
    let mut captions = CaptionRenderer::new(canvas(), profile.caption, 0.0, &CaptionFont::Builtin);
    let mut cx = AssemblyContext {
        profile: &profile,
        canvas: canvas(),
        fps: fps(),
        chooser: &mut chooser,
        captions: &mut captions,
    };
    let clips = durations
        .iter()
        .enumerate()
        .map(|(index, &d)| {
            let samples = (d * f64::from(MIX_SAMPLE_RATE)).round() as usize;
            let scene = ResolvedScene {
                index,
                record: SceneRecord::new(format!("{index}.wav")),
                narration: AudioPcm {
                    sample_rate: MIX_SAMPLE_RATE,
                    channels: MIX_CHANNELS,
                    interleaved_f32: vec![0.1; samples * 2],
                },
                duration_sec: d,
                visual: ResolvedVisual::Missing,
            };
            assemble(scene, &mut cx, index == 0).unwrap()
        })
        .collect();
    Timeline::new(clips, fps(), canvas()).unwrap()
}

#[test]
fn empty_timeline_is_rejected() {
    assert!(Timeline::new(Vec::new(), fps(), canvas()).is_err());
}

#[test]
fn cuts_are_gapless_and_sum_durations() {
    let t = build(Style::Minimalist, &[1.0, 0.5, 2.0]);
    assert_eq!(t.offsets(), &[0, 24, 36]);
    assert_eq!(t.overlaps(), &[0, 0, 0]);
    assert_eq!(t.total_frames(), 84);
    assert!((t.total_duration_sec() - 3.5).abs() < 1e-9);
    assert_eq!(t.clip_at(0), Some(0));
    assert_eq!(t.clip_at(23), Some(0));
    assert_eq!(t.clip_at(24), Some(1));
    assert_eq!(t.clip_at(83), Some(2));
    assert_eq!(t.clip_at(84), None);
}

#[test]
fn crossfades_subtract_their_overlap() {
    let t = build(Style::Cinematic, &[1.0, 1.0, 1.0]);
    // 0.25 s at 24 fps rounds to 6 frames.
    assert_eq!(t.overlaps(), &[0, 6, 6]);
    assert_eq!(t.offsets(), &[0, 18, 36]);
    assert_eq!(t.total_frames(), 72 - 12);
    let r1 = t.clip_range(1).unwrap();
    assert_eq!((r1.start.0, r1.end.0), (18, 42));
}

#[test]
fn overlap_never_exceeds_half_the_shorter_clip() {
    let t = build(Style::Cinematic, &[1.0, 0.125, 1.0]);
    // The 3-frame clip allows at most one frame of overlap on either side.
    assert_eq!(t.overlaps(), &[0, 1, 1]);
    assert_eq!(t.total_frames(), 24 + 3 + 24 - 2);
}

#[test]
fn every_frame_renders_at_canvas_size() {
    let mut t = build(Style::Cinematic, &[0.5, 0.5]);
    for f in 0..t.total_frames() {
        let frame = t.render_frame(f, &mut NoMedia).unwrap();
        assert_eq!((frame.width, frame.height), (16, 16));
        assert_eq!(frame.data.len(), canvas().rgba_len());
        assert!(frame.premultiplied);
    }
    assert!(t.render_frame(t.total_frames(), &mut NoMedia).is_err());
}

#[test]
fn narration_is_placed_at_clip_offsets() {
    let t = build(Style::Minimalist, &[0.5, 0.5]);
    let manifest = t.audio_manifest();
    let starts: Vec<u64> = manifest
        .narration
        .iter()
        .map(|s| s.timeline_start_sample)
        .collect();
    assert_eq!(starts, vec![0, 24_000]);
    assert_eq!(manifest.total_samples, 48_000);
    let mixed = mix_manifest(&manifest);
    assert!(mixed.iter().all(|&s| (s - 0.1).abs() < 1e-6));
}

#[test]
fn crossfaded_narration_overlaps_additively() {
    let t = build(Style::Cinematic, &[1.0, 1.0]);
    let mixed = mix_manifest(&t.audio_manifest());
    let overlap_start = 18 * 2_000 * 2;
    assert!((mixed[overlap_start + 2] - 0.2).abs() < 1e-6);
    assert!((mixed[0] - 0.1).abs() < 1e-6);
}

#[test]
fn finished_clips_are_released_in_order() {
    let mut t = build(Style::Minimalist, &[0.5, 0.5]);
    t.release_finished(11);
    assert_eq!(t.released, 0);
    t.release_finished(12);
    assert_eq!(t.released, 1);
    assert!(t.clips()[0].visual().is_placeholder());
    t.release_finished(24);
    assert_eq!(t.released, 2);
}
