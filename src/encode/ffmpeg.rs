use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use crate::assets::media::{ffmpeg_bin, tool_responds};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::cpu::FrameRGBA;

/// Where and how [`FfmpegSink`] writes its MP4.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`.
    pub overwrite: bool,
    /// Straight RGBA8 colour that translucent pixels are flattened onto.
    pub bg_rgba: [u8; 4],
    /// `-threads` for libx264; `None` leaves it to ffmpeg.
    pub threads: Option<u32>,
    pub ffmpeg: PathBuf,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
            threads: None,
            ffmpeg: ffmpeg_bin(),
        }
    }

    pub fn with_threads(mut self, threads: Option<u32>) -> Self {
        self.threads = threads;
        self
    }
}

/// A running ffmpeg process plus the thread collecting its diagnostics.
struct Encoder {
    child: Child,
    stdin: Option<ChildStdin>,
    diagnostics: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl Encoder {
    fn spawn(mut cmd: Command) -> ReelResult<Self> {
        tracing::debug!(command = ?cmd, "starting encoder");
        let mut child = cmd
            .spawn()
            .map_err(|e| ReelError::encode(format!("could not start ffmpeg: {e}")))?;
        let (Some(stdin), Some(mut stderr)) = (child.stdin.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReelError::encode("ffmpeg started without piped stdio"));
        };
        let diagnostics = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf)?;
            Ok(buf)
        });
        Ok(Self {
            child,
            stdin: Some(stdin),
            diagnostics: Some(diagnostics),
        })
    }

    fn write(&mut self, bytes: &[u8]) -> ReelResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ReelError::encode("encoder input already closed"))?;
        stdin
            .write_all(bytes)
            .map_err(|e| ReelError::encode(format!("piping frame into ffmpeg: {e}")))
    }

    /// Close stdin and wait for the process; returns its status and stderr text.
    fn finish(mut self) -> ReelResult<(ExitStatus, String)> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| ReelError::encode(format!("waiting on ffmpeg: {e}")))?;
        let stderr = match self.diagnostics.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::encode("ffmpeg stderr reader panicked"))?
                .map_err(|e| ReelError::encode(format!("reading ffmpeg stderr: {e}")))?,
            None => Vec::new(),
        };
        Ok((status, String::from_utf8_lossy(&stderr).trim().to_owned()))
    }

    fn kill(mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.diagnostics.take() {
            let _ = handle.join();
        }
    }
}

/// Streams flattened RGBA frames into a system `ffmpeg`, producing H.264
/// (`yuv420p`) video with optional AAC audio taken from `SinkConfig.audio`.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoder: Option<Encoder>,
    cfg: Option<SinkConfig>,
    opaque: Vec<u8>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
            cfg: None,
            opaque: Vec::new(),
            last_idx: None,
        }
    }

    pub fn out_path(&self) -> &Path {
        &self.opts.out_path
    }

    fn build_command(&self, cfg: &SinkConfig) -> ReelResult<Command> {
        let mut cmd = Command::new(&self.opts.ffmpeg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .arg(if self.opts.overwrite { "-y" } else { "-n" })
            .args(["-loglevel", "error"]);

        // Video input: opaque RGBA8 on stdin. `-r` must precede `-i`.
        cmd.args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-s", &format!("{}x{}", cfg.width, cfg.height)])
            .args(["-r", &rate_arg(cfg.fps)])
            .args(["-i", "pipe:0"]);

        match &cfg.audio {
            Some(audio) => {
                if audio.sample_rate == 0 || audio.channels == 0 {
                    return Err(ReelError::validation(
                        "audio input needs a non-zero sample rate and channel count",
                    ));
                }
                cmd.args(["-f", "f32le"])
                    .args(["-ar", &audio.sample_rate.to_string()])
                    .args(["-ac", &audio.channels.to_string()])
                    .arg("-i")
                    .arg(&audio.path)
                    .args(["-c:a", "aac", "-shortest"]);
            }
            None => {
                cmd.arg("-an");
            }
        }

        cmd.args(["-c:v", "libx264", "-pix_fmt", "yuv420p"]);
        if let Some(threads) = self.opts.threads {
            cmd.args(["-threads", &threads.to_string()]);
        }
        cmd.args(["-movflags", "+faststart"]).arg(&self.opts.out_path);
        Ok(cmd)
    }

    fn check_config(&self, cfg: &SinkConfig) -> ReelResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ReelError::validation("encoder frame rate must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelError::validation("encoder frame size must be non-zero"));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::validation(format!(
                "yuv420p output needs even dimensions, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ReelError::validation(format!(
                "refusing to overwrite '{}'",
                self.opts.out_path.display()
            )));
        }
        Ok(())
    }

    fn discard_output(&self) {
        if !self.opts.out_path.exists() {
            return;
        }
        match std::fs::remove_file(&self.opts.out_path) {
            Ok(()) => tracing::debug!(out = %self.opts.out_path.display(), "discarded partial mp4"),
            Err(e) => tracing::warn!(
                out = %self.opts.out_path.display(),
                error = %e,
                "could not delete partial mp4"
            ),
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.check_config(&cfg)?;
        ensure_parent_dir(&self.opts.out_path)?;
        if !tool_responds(&self.opts.ffmpeg) {
            return Err(ReelError::encode(format!(
                "MP4 output needs ffmpeg; '{}' did not run",
                self.opts.ffmpeg.display()
            )));
        }

        let encoder = Encoder::spawn(self.build_command(&cfg)?)?;
        self.opaque = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let Some(cfg) = self.cfg.as_ref() else {
            return Err(ReelError::encode("push_frame before begin"));
        };
        if self.last_idx.is_some_and(|last| idx.0 <= last.0) {
            return Err(ReelError::encode(format!(
                "frame {} arrived after frame {}",
                idx.0,
                self.last_idx.map_or(0, |l| l.0)
            )));
        }
        if (frame.width, frame.height) != (cfg.width, cfg.height) {
            return Err(ReelError::encode(format!(
                "frame is {}x{} but the encoder expects {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);

        flatten_onto_backdrop(&mut self.opaque, &frame.data, self.opts.bg_rgba)?;
        self.encoder
            .as_mut()
            .ok_or_else(|| ReelError::encode("encoder already finished"))?
            .write(&self.opaque)
    }

    fn end(&mut self) -> ReelResult<()> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| ReelError::encode("end called without a running encoder"))?;
        self.cfg = None;
        let (status, stderr) = encoder.finish()?;
        if !status.success() {
            self.discard_output();
            return Err(ReelError::encode(format!("ffmpeg failed ({status}): {stderr}")));
        }
        Ok(())
    }

    fn abort(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            encoder.kill();
        }
        self.cfg = None;
        self.discard_output();
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.encoder.is_some() {
            self.abort();
        }
    }
}

fn rate_arg(fps: Fps) -> String {
    format!("{}/{}", fps.num, fps.den)
}

/// Composite premultiplied RGBA8 over an opaque backdrop, writing straight
/// opaque RGBA8 into `dst`.
pub(crate) fn flatten_onto_backdrop(
    dst: &mut [u8],
    premul: &[u8],
    backdrop: [u8; 4],
) -> ReelResult<()> {
    if dst.len() != premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::encode(format!(
            "flatten needs matching rgba8 buffers, got {} and {} bytes",
            dst.len(),
            premul.len()
        )));
    }

    let back = backdrop.map(u16::from);
    for (out, px) in dst.chunks_exact_mut(4).zip(premul.chunks_exact(4)) {
        let cover = 255 - u16::from(px[3]);
        if cover == 0 {
            out.copy_from_slice(px);
            continue;
        }
        for c in 0..3 {
            out[c] = (u16::from(px[c]) + mul_div255_u16(back[c], cover)).min(255) as u8;
        }
        out[3] = 255;
    }
    Ok(())
}

/// Create the directory that will hold `path`, if it has one.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    use anyhow::Context as _;
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory '{}'", dir.display()))?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Scratch file removed on drop.
pub struct TempFileGuard(pub PathBuf);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
