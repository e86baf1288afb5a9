//! Narration placement and background-music mixing.

pub mod mix;
