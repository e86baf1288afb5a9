//! Asset resolution: narration decode, visual classification and caption fonts.

pub mod decode;
pub mod fallback_font;
pub mod fonts;
pub mod media;
pub mod resolve;
