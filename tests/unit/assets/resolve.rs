use std::path::Path;

use super::*;
use crate::assets::media::{MIX_CHANNELS, MIX_SAMPLE_RATE, VideoFrameStream};
use crate::foundation::core::Fps;

struct FakeMedia {
    audio_frames: usize,
    probe_ok: bool,
}

impl MediaBackend for FakeMedia {
    fn decode_audio(&mut self, path: &Path) -> ReelResult<AudioPcm> {
        if path.to_string_lossy().contains("broken") {
            return Err(ReelError::decode("cannot decode"));
        }
        Ok(AudioPcm {
            sample_rate: MIX_SAMPLE_RATE,
            channels: MIX_CHANNELS,
            interleaved_f32: vec![0.1; self.audio_frames * 2],
        })
    }

    fn probe_video(&mut self, path: &Path) -> ReelResult<VideoSourceInfo> {
        if !self.probe_ok {
            return Err(ReelError::decode("probe failed"));
        }
        Ok(VideoSourceInfo {
            source_path: path.to_path_buf(),
            width: 32,
            height: 18,
            duration_sec: 1.0,
            has_audio: false,
        })
    }

    fn open_video_stream(
        &mut self,
        _info: &VideoSourceInfo,
        _fps: Fps,
        _duration_sec: f64,
    ) -> ReelResult<Box<dyn VideoFrameStream>> {
        Err(ReelError::decode("not used"))
    }
}

fn canvas() -> Canvas {
    Canvas {
        width: 32,
        height: 64,
    }
}

#[test]
fn duration_comes_from_narration_length() {
    let mut media = FakeMedia {
        audio_frames: MIX_SAMPLE_RATE as usize * 3 / 2,
        probe_ok: true,
    };
    let scene = resolve_scene(2, &SceneRecord::new("a.wav"), canvas(), &mut media).unwrap();
    assert_eq!(scene.index, 2);
    assert!((scene.duration_sec - 1.5).abs() < 1e-9);
    assert!(matches!(scene.visual, ResolvedVisual::Missing));
}

#[test]
fn undecodable_or_empty_narration_fails_the_scene() {
    let mut media = FakeMedia {
        audio_frames: 10,
        probe_ok: true,
    };
    let err = resolve_scene(0, &SceneRecord::new("broken.wav"), canvas(), &mut media).unwrap_err();
    assert!(err.is_scene_local());

    let mut silent = FakeMedia {
        audio_frames: 0,
        probe_ok: true,
    };
    let err = resolve_scene(0, &SceneRecord::new("a.wav"), canvas(), &mut silent).unwrap_err();
    assert!(err.to_string().contains("zero length"));
}

#[test]
fn visual_classification_by_file_type() {
    let dir = tempfile::tempdir().unwrap();
    let still = dir.path().join("still.png");
    image::RgbaImage::from_pixel(4, 4, image::Rgba([9, 9, 9, 255]))
        .save(&still)
        .unwrap();
    let clip = dir.path().join("clip.mp4");
    std::fs::write(&clip, b"opaque").unwrap();
    let corrupt = dir.path().join("corrupt.jpg");
    std::fs::write(&corrupt, b"not a jpeg").unwrap();

    let mut media = FakeMedia {
        audio_frames: 480,
        probe_ok: true,
    };
    let resolve = |media: &mut FakeMedia, visual: &Path| {
        resolve_scene(0, &SceneRecord::new("a.wav").with_visual(visual), canvas(), media)
            .unwrap()
            .visual
    };

    assert!(matches!(
        resolve(&mut media, &still),
        ResolvedVisual::StillFile(f) if (f.width, f.height) == (4, 4)
    ));
    assert!(matches!(resolve(&mut media, &clip), ResolvedVisual::Motion(_)));
    assert!(matches!(resolve(&mut media, &corrupt), ResolvedVisual::Missing));
    assert!(matches!(
        resolve(&mut media, &dir.path().join("absent.png")),
        ResolvedVisual::Missing
    ));

    media.probe_ok = false;
    assert!(matches!(resolve(&mut media, &clip), ResolvedVisual::Missing));
}

#[test]
fn large_stills_are_sized_for_the_canvas_without_decoding() {
    let dir = tempfile::tempdir().unwrap();
    let still = dir.path().join("wide.png");
    image::RgbaImage::from_pixel(480, 120, image::Rgba([9, 9, 9, 255]))
        .save(&still)
        .unwrap();
    let mut media = FakeMedia {
        audio_frames: 480,
        probe_ok: true,
    };
    let scene = resolve_scene(
        0,
        &SceneRecord::new("a.wav").with_visual(&still),
        canvas(),
        &mut media,
    )
    .unwrap();
    let ResolvedVisual::StillFile(file) = scene.visual else {
        panic!("expected a still");
    };
    // Needed box is 48x96; covering it from 480x120 takes a 0.8 scale.
    assert_eq!(file.needed, (48, 96));
    assert_eq!((file.width, file.height), (384, 96));
    let img = file.load().unwrap();
    assert_eq!((img.width, img.height), (384, 96));
}
