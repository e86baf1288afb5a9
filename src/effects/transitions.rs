use crate::foundation::core::Fps;

/// How a clip is joined to the one before it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransitionPolicy {
    /// Hard cut; clips abut with no overlap.
    Cut,
    /// The incoming clip dissolves over the outgoing clip's tail.
    Crossfade { duration_sec: f64 },
}

impl TransitionPolicy {
    /// Frames shared by two adjacent clips of `prev_len` and `next_len` frames.
    ///
    /// Clamped to half of the shorter clip so no clip is ever fully covered by its neighbours.
    pub fn overlap_frames(self, fps: Fps, prev_len: u64, next_len: u64) -> u64 {
        match self {
            Self::Cut => 0,
            Self::Crossfade { duration_sec } => {
                let want = fps.secs_to_frames_round(duration_sec.max(0.0));
                want.min(prev_len.min(next_len) / 2)
            }
        }
    }
}

/// Blend weight of the incoming clip at `local_frame` of an `overlap`-frame crossfade.
///
/// Frame 0 already shows a little of the incoming clip and the last overlapping frame is not
/// fully opaque, so neither endpoint duplicates a frame of either clip.
pub fn crossfade_progress(local_frame: u64, overlap: u64) -> f32 {
    if overlap == 0 || local_frame >= overlap {
        return 1.0;
    }
    ((local_frame as f64 + 1.0) / (overlap as f64 + 1.0)) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
