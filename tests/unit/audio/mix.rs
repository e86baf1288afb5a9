use super::*;

fn pcm(sample_rate: u32, samples: Vec<f32>) -> Arc<AudioPcm> {
    Arc::new(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: samples,
    })
}

fn manifest(total_samples: u64) -> AudioManifest {
    AudioManifest {
        sample_rate: 4,
        channels: 2,
        total_samples,
        narration: Vec::new(),
        background: None,
    }
}

#[test]
fn frame_to_sample_uses_rational_fps() {
    let fps = Fps::new(30000, 1001).unwrap();
    let samples = frame_to_sample(300, fps, 48_000);
    assert!(samples > 470_000 && samples < 490_000);
    assert_eq!(frame_to_sample(30, Fps::new(30, 1).unwrap(), 48_000), 48_000);
}

#[test]
fn narration_overlaps_add_and_are_clamped() {
    let mut m = manifest(4);
    m.narration.push(AudioSegment {
        timeline_start_sample: 0,
        timeline_end_sample: 4,
        volume: 1.0,
        looped: false,
        source: pcm(4, vec![0.25; 8]),
    });
    m.narration.push(AudioSegment {
        timeline_start_sample: 2,
        timeline_end_sample: 4,
        volume: 1.0,
        looped: false,
        source: pcm(4, vec![0.9; 4]),
    });
    let out = mix_manifest(&m);
    assert_eq!(out.len(), 8);
    assert!((out[0] - 0.25).abs() < 1e-6);
    assert_eq!(out[4], 1.0);
}

#[test]
fn one_shot_sources_go_silent_when_exhausted() {
    let mut m = manifest(4);
    m.narration.push(AudioSegment {
        timeline_start_sample: 0,
        timeline_end_sample: 4,
        volume: 1.0,
        looped: false,
        source: pcm(4, vec![0.5; 4]),
    });
    let out = mix_manifest(&m);
    assert!(out[0] > 0.0 && out[2] > 0.0);
    assert_eq!(&out[4..], &[0.0; 4]);
}

#[test]
fn background_loops_without_gaps() {
    let mut m = manifest(10);
    m.narration.push(AudioSegment {
        timeline_start_sample: 0,
        timeline_end_sample: 10,
        volume: 1.0,
        looped: false,
        source: pcm(4, vec![0.8; 20]),
    });
    // Three-sample bed, much shorter than the timeline.
    m.set_background(pcm(4, vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3]), 1.0);
    let out = mix_manifest(&m);
    for frame in 0..10 {
        let bed = out[frame * 2] - 0.8;
        let expected = [0.1, 0.2, 0.3][frame % 3];
        assert!((bed - expected).abs() < 1e-5, "frame {frame}: {bed}");
    }
}

#[test]
fn background_never_peaks_above_narration() {
    let mut m = manifest(8);
    m.narration.push(AudioSegment {
        timeline_start_sample: 0,
        timeline_end_sample: 8,
        volume: 1.0,
        looped: false,
        source: pcm(4, vec![0.05; 16]),
    });
    m.set_background(pcm(4, vec![0.9; 16]), 0.5);
    let out = mix_manifest(&m);
    // Bed contribution is limited to the narration peak (0.05).
    for s in &out {
        assert!((*s - 0.1).abs() < 1e-5);
    }
}

#[test]
fn default_mix_ratio_keeps_bed_well_below_narration() {
    let mut m = manifest(8);
    m.narration.push(AudioSegment {
        timeline_start_sample: 0,
        timeline_end_sample: 8,
        volume: 1.0,
        looped: false,
        source: pcm(4, vec![0.5; 16]),
    });
    m.set_background(pcm(4, vec![1.0; 4]), crate::scene::model::DEFAULT_BACKGROUND_VOLUME);
    let out = mix_manifest(&m);
    assert!((out[0] - 0.58).abs() < 1e-5);
}

#[test]
fn push_narration_places_clip_at_frame_offset() {
    let fps = Fps::new(30, 1).unwrap();
    let mut m = AudioManifest::new(60, fps);
    m.push_narration(30, fps, pcm(48_000, vec![0.0; 48_000 * 2]));
    let seg = &m.narration[0];
    assert_eq!(seg.timeline_start_sample, 48_000);
    assert_eq!(seg.timeline_end_sample, 96_000);
}

#[test]
fn f32le_file_round_trips_sample_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("mix.f32le");
    write_mix_to_f32le_file(&[0.0, 0.5, -0.5], &path).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 12);
}
