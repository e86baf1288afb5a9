//! Closed set of per-style strategies. Everything that differs between styles is decided here
//! once per render; the compositor only consumes the resulting [`StyleProfile`].

use crate::effects::transitions::TransitionPolicy;
use crate::foundation::core::Rgba8Premul;
use crate::scene::model::{RenderConfig, Style};

/// Caption fill drawn over an outlining stroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptionPalette {
    pub fill: Rgba8Premul,
    pub stroke: Rgba8Premul,
}

/// Where and how the scene visual is laid out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VisualLayout {
    /// Cover-fit over the whole canvas. Stills get Ken-Burns motion.
    FullBleed,
    /// Centered at a fraction of canvas width over a flat backdrop, with inset motion and fades.
    Inset {
        width_fraction: f64,
        max_height_fraction: f64,
        backdrop: Rgba8Premul,
    },
}

/// Resolved style strategy for one render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleProfile {
    pub style: Style,
    pub layout: VisualLayout,
    pub caption: CaptionPalette,
    /// Plane drawn for scenes without a usable visual.
    pub placeholder: Rgba8Premul,
    pub transition: TransitionPolicy,
    /// Per-scene fade length; zero under styles that do not fade.
    pub fade_sec: f64,
}

const PALE: Rgba8Premul = Rgba8Premul {
    r: 250,
    g: 250,
    b: 245,
    a: 255,
};
const DARK: Rgba8Premul = Rgba8Premul {
    r: 20,
    g: 20,
    b: 20,
    a: 255,
};
const LIGHT_BACKDROP: Rgba8Premul = Rgba8Premul {
    r: 245,
    g: 243,
    b: 238,
    a: 255,
};
const CINEMATIC_PLACEHOLDER: Rgba8Premul = Rgba8Premul {
    r: 16,
    g: 18,
    b: 24,
    a: 255,
};

impl StyleProfile {
    pub fn for_config(cfg: &RenderConfig) -> Self {
        match cfg.style {
            Style::Cinematic => Self {
                style: Style::Cinematic,
                layout: VisualLayout::FullBleed,
                caption: CaptionPalette {
                    fill: PALE,
                    stroke: DARK,
                },
                placeholder: CINEMATIC_PLACEHOLDER,
                transition: TransitionPolicy::Crossfade {
                    duration_sec: cfg.crossfade_sec,
                },
                fade_sec: 0.0,
            },
            Style::Minimalist => Self {
                style: Style::Minimalist,
                layout: VisualLayout::Inset {
                    width_fraction: 0.7,
                    max_height_fraction: 0.6,
                    backdrop: LIGHT_BACKDROP,
                },
                caption: CaptionPalette {
                    fill: DARK,
                    stroke: PALE,
                },
                placeholder: LIGHT_BACKDROP,
                transition: TransitionPolicy::Cut,
                fade_sec: cfg.fade_sec,
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/style.rs"]
mod tests;
