//! Scene assembly into timed clips and their concatenation into one timeline.

pub mod clip;
pub mod concat;
