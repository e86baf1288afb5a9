use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};

/// Every decoded track is resampled to this rate before mixing.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Mixing happens in interleaved stereo.
pub const MIX_CHANNELS: u16 = 2;

/// Overrides the `ffmpeg` executable.
pub const FFMPEG_ENV: &str = "REELFORGE_FFMPEG";
/// Overrides the `ffprobe` executable.
pub const FFPROBE_ENV: &str = "REELFORGE_FFPROBE";

/// What `ffprobe` reports about a motion clip.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Zero when the container does not state a duration.
    pub duration_sec: f64,
    pub has_audio: bool,
}

/// A decoded track: interleaved `f32` samples plus their layout.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Sample frames, i.e. samples per channel.
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_sec(&self) -> f64 {
        match self.sample_rate {
            0 => 0.0,
            rate => self.frames() as f64 / f64::from(rate),
        }
    }

    /// Loudest absolute sample.
    pub fn peak(&self) -> f32 {
        self.interleaved_f32
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

/// Sequential reader of decoded video frames (straight RGBA8 at source size).
pub trait VideoFrameStream {
    /// Next frame, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> ReelResult<Option<Vec<u8>>>;
}

/// Decoding seam between the compositor and the media toolchain.
pub trait MediaBackend {
    /// Decode an audio file to interleaved stereo `f32` at [`MIX_SAMPLE_RATE`].
    fn decode_audio(&mut self, path: &Path) -> ReelResult<AudioPcm>;

    /// Read dimensions and duration of a motion clip.
    fn probe_video(&mut self, path: &Path) -> ReelResult<VideoSourceInfo>;

    /// Open a stream that yields exactly `duration_sec` worth of frames at `fps`.
    ///
    /// Sources shorter than `duration_sec` loop from their first frame; longer sources are cut
    /// after `duration_sec`, starting at time 0.
    fn open_video_stream(
        &mut self,
        info: &VideoSourceInfo,
        fps: Fps,
        duration_sec: f64,
    ) -> ReelResult<Box<dyn VideoFrameStream>>;
}

/// [`MediaBackend`] that shells out to the system `ffmpeg`/`ffprobe` binaries.
#[derive(Clone, Debug)]
pub struct FfmpegMedia {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegMedia {
    fn default() -> Self {
        Self::from_env()
    }
}

impl FfmpegMedia {
    /// Resolve tool paths from [`FFMPEG_ENV`]/[`FFPROBE_ENV`], falling back to `PATH` lookup.
    pub fn from_env() -> Self {
        Self {
            ffmpeg: ffmpeg_bin(),
            ffprobe: std::env::var_os(FFPROBE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ffprobe")),
        }
    }

    pub fn with_binaries(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Both binaries respond to `-version`.
    pub fn is_available(&self) -> bool {
        tool_responds(&self.ffmpeg) && tool_responds(&self.ffprobe)
    }
}

impl MediaBackend for FfmpegMedia {
    fn decode_audio(&mut self, path: &Path) -> ReelResult<AudioPcm> {
        decode_audio_f32_stereo(&self.ffmpeg, path, MIX_SAMPLE_RATE)
    }

    fn probe_video(&mut self, path: &Path) -> ReelResult<VideoSourceInfo> {
        probe_video(&self.ffprobe, path)
    }

    fn open_video_stream(
        &mut self,
        info: &VideoSourceInfo,
        fps: Fps,
        duration_sec: f64,
    ) -> ReelResult<Box<dyn VideoFrameStream>> {
        Ok(Box::new(FfmpegVideoStream::spawn(
            &self.ffmpeg,
            info,
            fps,
            duration_sec,
        )?))
    }
}

/// `ffmpeg` binary from [`FFMPEG_ENV`] or `PATH`.
pub fn ffmpeg_bin() -> PathBuf {
    std::env::var_os(FFMPEG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ffmpeg"))
}

pub fn tool_responds(bin: &Path) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Ask `ffprobe` for a clip's frame size, duration and audio presence.
pub fn probe_video(ffprobe: &Path, source_path: &Path) -> ReelResult<VideoSourceInfo> {
    let out = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::decode(format!("could not run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::decode(format!(
            "ffprobe rejected '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout, source_path)
}

#[derive(serde::Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    sample_aspect_ratio: Option<String>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
    #[serde(default)]
    tags: std::collections::HashMap<String, String>,
}

impl ProbeStream {
    /// Clockwise quarter turns, from display-matrix side data or the older `rotate` tag.
    fn quarter_turns(&self) -> i64 {
        let degrees = self
            .side_data_list
            .iter()
            .find_map(|d| d.rotation)
            .or_else(|| self.tags.get("rotate").and_then(|r| r.trim().parse().ok()))
            .unwrap_or(0.0);
        ((degrees / 90.0).round() as i64).rem_euclid(4)
    }

    /// Pixel aspect as `num / den`; unknown or degenerate ratios count as square.
    fn pixel_aspect(&self) -> f64 {
        let Some((num, den)) = self
            .sample_aspect_ratio
            .as_deref()
            .and_then(|r| r.split_once(':'))
        else {
            return 1.0;
        };
        match (num.parse::<f64>(), den.parse::<f64>()) {
            (Ok(n), Ok(d)) if n > 0.0 && d > 0.0 => n / d,
            _ => 1.0,
        }
    }
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Read ffprobe's JSON into the size frames arrive at once ffmpeg has applied
/// rotation and stretched non-square pixels.
pub(crate) fn parse_probe_json(json: &[u8], source_path: &Path) -> ReelResult<VideoSourceInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| ReelError::decode(format!("unreadable ffprobe output: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::decode("source has no video stream"))?;
    let (coded_w, coded_h) = match (video_stream.width, video_stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(ReelError::decode("ffprobe reported no frame size")),
    };
    let stretched_w = ((f64::from(coded_w) * video_stream.pixel_aspect()).round() as u32).max(1);
    let (width, height) = if video_stream.quarter_turns() % 2 == 1 {
        (coded_h, stretched_w)
    } else {
        (stretched_w, coded_h)
    };
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_sec,
        has_audio,
    })
}

/// Decode any audio file `ffmpeg` understands into stereo `f32` at `sample_rate`.
pub fn decode_audio_f32_stereo(
    ffmpeg: &Path,
    path: &Path,
    sample_rate: u32,
) -> ReelResult<AudioPcm> {
    if !path.is_file() {
        return Err(ReelError::decode(format!(
            "no audio file at '{}'",
            path.display()
        )));
    }

    let out = Command::new(ffmpeg)
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::decode(format!("could not run ffmpeg to decode audio: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        // A file without an audio stream decodes to silence of length zero.
        if msg.contains("Stream specifier")
            || msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels: MIX_CHANNELS,
                interleaved_f32: Vec::new(),
            });
        }
        return Err(ReelError::decode(format!(
            "ffmpeg could not decode '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: MIX_CHANNELS,
        interleaved_f32: f32le_bytes_to_samples(&out.stdout)?,
    })
}

pub(crate) fn f32le_bytes_to_samples(bytes: &[u8]) -> ReelResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(ReelError::decode(format!(
            "{} bytes of PCM do not divide into f32 samples",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Raw RGBA frames piped out of an `ffmpeg` decoder process, which is
/// killed when the stream drops.
pub struct FfmpegVideoStream {
    child: Child,
    stdout: ChildStdout,
    diagnostics: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    source: PathBuf,
    frame_len: usize,
    done: bool,
}

impl FfmpegVideoStream {
    pub fn spawn(
        ffmpeg: &Path,
        info: &VideoSourceInfo,
        fps: Fps,
        duration_sec: f64,
    ) -> ReelResult<Self> {
        let frame_len = info.width as usize * info.height as usize * 4;
        if frame_len == 0 {
            return Err(ReelError::decode(format!(
                "'{}' has an empty frame size",
                info.source_path.display()
            )));
        }

        // The output size is pinned so every frame has exactly `frame_len` bytes.
        let filter = format!(
            "fps={}/{},scale={}:{},setsar=1",
            fps.num, fps.den, info.width, info.height
        );
        let mut cmd = Command::new(ffmpeg);
        cmd.args(["-v", "error", "-stream_loop", "-1", "-i"])
            .arg(&info.source_path)
            .args(["-t", &format!("{duration_sec:.6}"), "-an", "-vf", &filter])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(source = %info.source_path.display(), duration_sec, %filter, "opening clip decoder");

        let mut child = cmd
            .spawn()
            .map_err(|e| ReelError::decode(format!("could not start clip decoder: {e}")))?;
        let (Some(stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReelError::decode("clip decoder started without piped output"));
        };
        let diagnostics = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf)?;
            Ok(buf)
        });

        Ok(Self {
            child,
            stdout,
            diagnostics: Some(diagnostics),
            source: info.source_path.clone(),
            frame_len,
            done: false,
        })
    }

    /// Reap the decoder after its output ended. A failed exit becomes an error
    /// carrying ffmpeg's own message.
    fn reap(&mut self) -> ReelResult<()> {
        let status = self
            .child
            .wait()
            .map_err(|e| ReelError::decode(format!("waiting on clip decoder: {e}")))?;
        let stderr = self
            .diagnostics
            .take()
            .and_then(|h| h.join().ok())
            .and_then(|r| r.ok())
            .unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr);
        let stderr = stderr.trim();
        if !status.success() {
            return Err(ReelError::decode(format!(
                "clip decoder for '{}' exited with {status}: {stderr}",
                self.source.display()
            )));
        }
        if !stderr.is_empty() {
            tracing::warn!(clip = %self.source.display(), stderr, "clip decoder reported problems");
        }
        Ok(())
    }
}

impl VideoFrameStream for FfmpegVideoStream {
    fn next_frame(&mut self) -> ReelResult<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }
        let mut buf = vec![0u8; self.frame_len];
        match self.stdout.read_exact(&mut buf) {
            Ok(()) => Ok(Some(buf)),
            // A trailing partial frame counts as the end of the clip.
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.done = true;
                self.reap()?;
                Ok(None)
            }
            Err(e) => Err(ReelError::decode(format!("reading clip frame: {e}"))),
        }
    }
}

impl Drop for FfmpegVideoStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.diagnostics.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
