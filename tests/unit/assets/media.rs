use super::*;

#[test]
fn pcm_frames_duration_and_peak() {
    let pcm = AudioPcm {
        sample_rate: 4,
        channels: 2,
        interleaved_f32: vec![0.1, -0.1, 0.5, -0.75, 0.0, 0.0, 0.2, 0.2],
    };
    assert_eq!(pcm.frames(), 4);
    assert!((pcm.duration_sec() - 1.0).abs() < 1e-12);
    assert!((pcm.peak() - 0.75).abs() < 1e-6);
}

#[test]
fn empty_pcm_has_zero_duration() {
    let pcm = AudioPcm {
        sample_rate: MIX_SAMPLE_RATE,
        channels: MIX_CHANNELS,
        interleaved_f32: Vec::new(),
    };
    assert_eq!(pcm.frames(), 0);
    assert_eq!(pcm.duration_sec(), 0.0);
    assert_eq!(pcm.peak(), 0.0);
}

#[test]
fn f32le_conversion_rejects_misaligned_input() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0.5f32.to_le_bytes());
    bytes.extend_from_slice(&(-1.0f32).to_le_bytes());
    assert_eq!(f32le_bytes_to_samples(&bytes).unwrap(), vec![0.5, -1.0]);
    assert!(f32le_bytes_to_samples(&bytes[..5]).is_err());
}

#[test]
fn missing_audio_file_is_a_decode_error() {
    let err = decode_audio_f32_stereo(
        Path::new("ffmpeg"),
        Path::new("/definitely/not/here.wav"),
        MIX_SAMPLE_RATE,
    )
    .unwrap_err();
    assert!(err.is_scene_local());
}

#[test]
fn unresponsive_tool_is_reported_unavailable() {
    assert!(!tool_responds(Path::new("/definitely/not/a/binary")));
}

const LANDSCAPE_STREAM: &str = r#"{
    "streams": [
        { "codec_type": "audio", "sample_rate": "48000" },
        {
            "codec_type": "video",
            "width": 1920,
            "height": 1080,
            "sample_aspect_ratio": "1:1",
            "side_data_list": [
                { "side_data_type": "Display Matrix", "rotation": -90 }
            ]
        }
    ],
    "format": { "duration": "3.250000" }
}"#;

#[test]
fn rotated_clips_report_their_displayed_size() {
    let info = parse_probe_json(LANDSCAPE_STREAM.as_bytes(), Path::new("phone.mp4")).unwrap();
    assert_eq!((info.width, info.height), (1080, 1920));
    assert!((info.duration_sec - 3.25).abs() < 1e-9);
    assert!(info.has_audio);

    let legacy_tag = r#"{
        "streams": [
            { "codec_type": "video", "width": 640, "height": 360, "tags": { "rotate": "270" } }
        ]
    }"#;
    let info = parse_probe_json(legacy_tag.as_bytes(), Path::new("old.mov")).unwrap();
    assert_eq!((info.width, info.height), (360, 640));
    assert_eq!(info.duration_sec, 0.0);
    assert!(!info.has_audio);

    let upside_down = r#"{
        "streams": [
            { "codec_type": "video", "width": 640, "height": 360,
              "side_data_list": [ { "rotation": 180 } ] }
        ]
    }"#;
    let info = parse_probe_json(upside_down.as_bytes(), Path::new("flip.mp4")).unwrap();
    assert_eq!((info.width, info.height), (640, 360));
}

#[test]
fn anamorphic_pixels_are_stretched_to_square() {
    let json = r#"{
        "streams": [
            { "codec_type": "video", "width": 720, "height": 576, "sample_aspect_ratio": "16:15" }
        ]
    }"#;
    let info = parse_probe_json(json.as_bytes(), Path::new("dv.avi")).unwrap();
    assert_eq!((info.width, info.height), (768, 576));

    let unknown = r#"{
        "streams": [
            { "codec_type": "video", "width": 720, "height": 576, "sample_aspect_ratio": "0:1" }
        ]
    }"#;
    let info = parse_probe_json(unknown.as_bytes(), Path::new("x.mp4")).unwrap();
    assert_eq!((info.width, info.height), (720, 576));
}

#[test]
fn stream_info_without_a_usable_video_stream_is_rejected() {
    let audio_only = r#"{ "streams": [ { "codec_type": "audio" } ] }"#;
    assert!(parse_probe_json(audio_only.as_bytes(), Path::new("a.mp4")).is_err());
    let sizeless = r#"{ "streams": [ { "codec_type": "video", "width": 0 } ] }"#;
    assert!(parse_probe_json(sizeless.as_bytes(), Path::new("b.mp4")).is_err());
    assert!(parse_probe_json(b"not json", Path::new("c.mp4")).is_err());
}

#[cfg(unix)]
fn fake_decoder(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt as _;
    let path = dir.join("fake-ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
fn tiny_clip() -> VideoSourceInfo {
    VideoSourceInfo {
        source_path: PathBuf::from("clip.mp4"),
        width: 2,
        height: 1,
        duration_sec: 1.0,
        has_audio: false,
    }
}

#[cfg(unix)]
#[test]
fn clip_decoder_failure_carries_ffmpeg_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let bin = fake_decoder(dir.path(), "echo 'moov atom not found' >&2\nexit 1");
    let mut stream =
        FfmpegVideoStream::spawn(&bin, &tiny_clip(), Fps::new(24, 1).unwrap(), 1.0).unwrap();
    let err = stream.next_frame().unwrap_err();
    assert!(err.to_string().contains("moov atom not found"), "{err}");
    assert!(stream.next_frame().unwrap().is_none());
}

#[cfg(unix)]
#[test]
fn clip_decoder_yields_whole_frames_then_ends_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    // One 2x1 RGBA frame plus a partial trailing frame.
    let bin = fake_decoder(dir.path(), "head -c 12 /dev/zero\nexit 0");
    let mut stream =
        FfmpegVideoStream::spawn(&bin, &tiny_clip(), Fps::new(24, 1).unwrap(), 1.0).unwrap();
    assert_eq!(stream.next_frame().unwrap(), Some(vec![0u8; 8]));
    assert!(stream.next_frame().unwrap().is_none());
}
