//! Pixel compositing and inter-clip transitions.

pub mod composite;
pub mod transitions;
