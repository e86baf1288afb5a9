use std::f64::consts::TAU;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::compose::geometry::LayerPose;
use crate::foundation::core::{Canvas, Vec2};
use crate::scene::model::MotionHint;

/// Extra coverage given to cinematic stills so motion never exposes an edge.
pub const KEN_BURNS_PRESCALE: f64 = 1.3;
/// Peak zoom reached by the zoom variants.
pub const KEN_BURNS_MAX_ZOOM: f64 = 1.15;
/// Horizontal travel of the pan variants, as a fraction of canvas width.
pub const KEN_BURNS_PAN_FRACTION: f64 = 0.10;

/// Ken-Burns camera move applied to a cinematic still for its whole scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KenBurns {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
}

impl KenBurns {
    pub const ALL: [KenBurns; 4] = [Self::ZoomIn, Self::ZoomOut, Self::PanLeft, Self::PanRight];

    /// Pose at `progress` in `[0, 1]` through the scene, including the pre-scale.
    pub fn pose(self, progress: f64, canvas: Canvas) -> LayerPose {
        let p = progress.clamp(0.0, 1.0);
        let travel = KEN_BURNS_PAN_FRACTION * f64::from(canvas.width) * p;
        let (zoom, pan_x) = match self {
            Self::ZoomIn => (1.0 + (KEN_BURNS_MAX_ZOOM - 1.0) * p, 0.0),
            Self::ZoomOut => (KEN_BURNS_MAX_ZOOM - (KEN_BURNS_MAX_ZOOM - 1.0) * p, 0.0),
            Self::PanLeft => (1.0, -travel),
            Self::PanRight => (1.0, travel),
        };
        LayerPose {
            offset: Vec2::new(pan_x, 0.0),
            scale: KEN_BURNS_PRESCALE * zoom,
            ..LayerPose::default()
        }
    }
}

/// Picks the Ken-Burns variant for each cinematic still.
///
/// Called once per scene; the answer holds for the whole scene.
pub trait MotionChooser {
    fn choose(&mut self, scene_index: usize) -> KenBurns;
}

impl<F> MotionChooser for F
where
    F: FnMut(usize) -> KenBurns,
{
    fn choose(&mut self, scene_index: usize) -> KenBurns {
        self(scene_index)
    }
}

/// Uniform random choice. Reproducible when seeded.
pub struct SeededChooser {
    rng: StdRng,
}

impl SeededChooser {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl MotionChooser for SeededChooser {
    fn choose(&mut self, _scene_index: usize) -> KenBurns {
        KenBurns::ALL[self.rng.gen_range(0..KenBurns::ALL.len())]
    }
}

const FLOAT_AMPLITUDE: f64 = 0.004;
const FLOAT_PERIOD_SEC: f64 = 3.0;
const BREATH_AMPLITUDE: f64 = 0.015;
const BREATH_PERIOD_SEC: f64 = 4.0;
const JUMP_AMPLITUDE: f64 = 0.04;
const JUMP_PERIOD_SEC: f64 = 0.6;
const SWAY_DEGREES: f64 = 5.0;
const SWAY_PERIOD_SEC: f64 = 2.0;
const SHAKE_AMPLITUDE: f64 = 0.004;
const PULSE_AMPLITUDE: f64 = 0.08;
const PULSE_PERIOD_SEC: f64 = 0.5;

/// Inset motion of a minimalist scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimalistMotion {
    pub hint: MotionHint,
    /// Fade in/out length at both scene boundaries.
    pub fade_sec: f64,
}

impl MinimalistMotion {
    pub fn new(hint: Option<MotionHint>, fade_sec: f64) -> Self {
        Self {
            hint: hint.unwrap_or(MotionHint::Floating),
            fade_sec,
        }
    }

    /// Pose at `t` seconds into a scene lasting `duration_sec`.
    pub fn pose(&self, t: f64, duration_sec: f64, canvas: Canvas) -> LayerPose {
        let ch = f64::from(canvas.height);
        let wave = |period: f64| (TAU * t / period).sin();

        let mut pose = LayerPose::default();
        match self.hint {
            MotionHint::Floating => {
                pose.offset.y = FLOAT_AMPLITUDE * ch * wave(FLOAT_PERIOD_SEC);
            }
            MotionHint::Jumping => {
                pose.offset.y = -wave(JUMP_PERIOD_SEC).abs() * JUMP_AMPLITUDE * ch;
            }
            MotionHint::Swaying => {
                pose.rotation_rad = SWAY_DEGREES.to_radians() * wave(SWAY_PERIOD_SEC);
            }
            MotionHint::Shaking => {
                let amp = SHAKE_AMPLITUDE * ch;
                pose.offset = Vec2::new(
                    amp * (TAU * 7.0 * t).sin(),
                    amp * (TAU * 11.0 * t + 1.3).sin(),
                );
            }
            MotionHint::Pulsing => {
                pose.scale = 1.0 + PULSE_AMPLITUDE * wave(PULSE_PERIOD_SEC).abs();
            }
        }
        if self.hint != MotionHint::Pulsing {
            pose.scale *= 1.0 + BREATH_AMPLITUDE * wave(BREATH_PERIOD_SEC);
        }
        pose.opacity = fade_opacity(t, duration_sec, self.fade_sec);
        pose
    }
}

/// Linear fade in over the first `fade_sec` and out over the last `fade_sec`.
pub fn fade_opacity(t: f64, duration_sec: f64, fade_sec: f64) -> f32 {
    if fade_sec <= 0.0 {
        return 1.0;
    }
    let fade_in = t / fade_sec;
    let fade_out = (duration_sec - t) / fade_sec;
    fade_in.min(fade_out).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/compose/motion.rs"]
mod tests;
