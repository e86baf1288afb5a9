use super::*;
use crate::encode::sink::AudioInputConfig;

#[test]
fn transparent_pixel_becomes_backdrop() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_onto_backdrop(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn opaque_pixel_passes_through() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_onto_backdrop(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_half_alpha_over_black() {
    let src = vec![128u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_onto_backdrop(&mut dst, &src, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

fn args_of(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn command_carries_codecs_audio_and_threads() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("out/x.mp4").with_threads(Some(3)));
    let cfg = SinkConfig {
        width: 8,
        height: 8,
        fps: Fps::new(30, 1).unwrap(),
        audio: Some(AudioInputConfig {
            path: PathBuf::from("mix.f32le"),
            sample_rate: 48_000,
            channels: 2,
        }),
    };
    let args = args_of(&sink.build_command(&cfg).unwrap());
    let has = |pair: [&str; 2]| args.windows(2).any(|w| w[0] == pair[0] && w[1] == pair[1]);
    assert!(has(["-c:v", "libx264"]));
    assert!(has(["-pix_fmt", "yuv420p"]));
    assert!(has(["-c:a", "aac"]));
    assert!(has(["-threads", "3"]));
    assert!(has(["-r", "30/1"]));
    assert!(args.iter().any(|a| a == "-shortest"));
    assert_eq!(args.last().map(String::as_str), Some("out/x.mp4"));
}

#[test]
fn command_without_audio_disables_audio() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("x.mp4"));
    let cfg = SinkConfig {
        width: 8,
        height: 8,
        fps: Fps::new(24, 1).unwrap(),
        audio: None,
    };
    let args = args_of(&sink.build_command(&cfg).unwrap());
    assert!(args.iter().any(|a| a == "-an"));
    assert!(!args.iter().any(|a| a == "-threads"));
}

#[test]
fn begin_rejects_odd_sizes() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("x.mp4"));
    let err = sink
        .begin(SinkConfig {
            width: 7,
            height: 8,
            fps: Fps::new(30, 1).unwrap(),
            audio: None,
        })
        .unwrap_err();
    assert!(err.to_string().contains("even"));
}

#[test]
fn temp_file_guard_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mix.f32le");
    std::fs::write(&path, b"x").unwrap();
    drop(TempFileGuard(path.clone()));
    assert!(!path.exists());
}
