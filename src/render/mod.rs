//! CPU rasterization and the end-to-end render pipeline.

pub mod cpu;
pub mod pipeline;
