//! Frame sinks: the ffmpeg MP4 encoder and an in-memory collector.

pub mod ffmpeg;
pub mod sink;
