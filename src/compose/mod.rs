//! Frame Compositor and Caption Renderer, plus the geometry, motion and style strategies they
//! share.

pub mod caption;
pub mod geometry;
pub mod motion;
pub mod style;
pub mod visual;
