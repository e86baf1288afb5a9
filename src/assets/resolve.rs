use std::path::PathBuf;

use crate::assets::decode::{self, PreparedImage};
use crate::assets::media::{AudioPcm, MediaBackend, VideoSourceInfo};
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::SceneRecord;

/// Largest on-canvas magnification a still is drawn at (Ken-Burns pre-scale times peak zoom).
pub const STILL_HEADROOM: f64 = 1.5;

/// Classified visual of a scene.
#[derive(Clone, Debug)]
pub enum ResolvedVisual {
    /// Raster already decoded in memory.
    Still(PreparedImage),
    /// Raster on disk whose header checked out. Decoded when its clip first draws.
    StillFile(StillFile),
    /// Probed motion clip. Frames are decoded lazily while rendering.
    Motion(VideoSourceInfo),
    /// No usable visual; a flat plane is drawn instead.
    Missing,
}

impl ResolvedVisual {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Still(_) | Self::StillFile(_) => "still",
            Self::Motion(_) => "motion",
            Self::Missing => "missing",
        }
    }
}

/// A still that is decoded on demand at its stored size.
#[derive(Clone, Debug)]
pub struct StillFile {
    pub path: PathBuf,
    /// Size after [`decode::fitted_size`].
    pub width: u32,
    pub height: u32,
    pub needed: (u32, u32),
}

impl StillFile {
    pub fn load(&self) -> ReelResult<PreparedImage> {
        decode::decode_image_file(&self.path, Some(self.needed))
    }
}

/// A scene record with its narration decoded and its visual classified.
#[derive(Clone, Debug)]
pub struct ResolvedScene {
    /// Position in the input list.
    pub index: usize,
    pub record: SceneRecord,
    pub narration: AudioPcm,
    /// Narration length in seconds.
    pub duration_sec: f64,
    pub visual: ResolvedVisual,
}

/// Decode a scene's narration and classify its visual.
///
/// Narration that fails to decode or decodes to nothing fails the scene. Visual problems never
/// do: an absent, unreadable or undecodable visual resolves to [`ResolvedVisual::Missing`].
pub fn resolve_scene(
    index: usize,
    record: &SceneRecord,
    canvas: Canvas,
    media: &mut dyn MediaBackend,
) -> ReelResult<ResolvedScene> {
    let narration = media.decode_audio(&record.audio_ref).map_err(|e| {
        ReelError::decode(format!(
            "scene {index}: narration '{}' unusable: {e}",
            record.audio_ref.display()
        ))
    })?;
    let duration_sec = narration.duration_sec();
    if narration.frames() == 0 || !duration_sec.is_finite() || duration_sec <= 0.0 {
        return Err(ReelError::decode(format!(
            "scene {index}: narration '{}' has zero length",
            record.audio_ref.display()
        )));
    }

    let visual = resolve_visual(index, record, canvas, media);
    tracing::debug!(
        index,
        duration_sec,
        visual = visual.kind_name(),
        "resolved scene"
    );

    Ok(ResolvedScene {
        index,
        record: record.clone(),
        narration,
        duration_sec,
        visual,
    })
}

fn resolve_visual(
    index: usize,
    record: &SceneRecord,
    canvas: Canvas,
    media: &mut dyn MediaBackend,
) -> ResolvedVisual {
    let Some(path) = record.visual_ref.as_deref() else {
        return ResolvedVisual::Missing;
    };
    if !path.is_file() {
        tracing::warn!(index, visual = %path.display(), "visual not found, using placeholder");
        return ResolvedVisual::Missing;
    }

    let resolved = if decode::is_still_image_path(path) {
        let needed = (
            (f64::from(canvas.width) * STILL_HEADROOM).ceil() as u32,
            (f64::from(canvas.height) * STILL_HEADROOM).ceil() as u32,
        );
        decode::probe_image_file(path).map(|size| {
            let (width, height) = decode::fitted_size(size, Some(needed));
            ResolvedVisual::StillFile(StillFile {
                path: path.to_path_buf(),
                width,
                height,
                needed,
            })
        })
    } else {
        media.probe_video(path).map(ResolvedVisual::Motion)
    };
    resolved.unwrap_or_else(|e| {
        tracing::warn!(index, visual = %path.display(), error = %e, "visual unreadable, using placeholder");
        ResolvedVisual::Missing
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolve.rs"]
mod tests;
