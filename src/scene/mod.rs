//! Input records and per-render configuration.

pub mod manifest;
pub mod model;
