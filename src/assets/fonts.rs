use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{ReelError, ReelResult};

/// Well-known bold sans-serif faces probed when no caption font is configured.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Font used to draw captions.
#[derive(Clone)]
pub enum CaptionFont {
    /// Outline font shaped with Parley and rasterized with vello_cpu.
    Shaped {
        bytes: Arc<Vec<u8>>,
        source: PathBuf,
    },
    /// Built-in bitmap glyphs. Always available.
    Builtin,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shaped { bytes, source } => f
                .debug_struct("Shaped")
                .field("source", source)
                .field("bytes_len", &bytes.len())
                .finish(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

impl CaptionFont {
    /// Resolve the caption font: the configured file first, then system candidates, then
    /// the built-in glyphs. Never fails.
    pub fn resolve(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            match Self::load(path) {
                Ok(font) => return font,
                Err(e) => {
                    tracing::warn!(font = %path.display(), error = %e, "caption font unusable, falling back");
                }
            }
        }
        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if path.is_file()
                && let Ok(font) = Self::load(path)
            {
                tracing::debug!(font = %path.display(), "using system caption font");
                return font;
            }
        }
        tracing::info!("no caption font found, using built-in glyphs");
        Self::Builtin
    }

    /// Load and validate a font file by registering it with a throwaway engine.
    pub fn load(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| ReelError::render(format!("read font '{}': {e}", path.display())))?;
        TextLayoutEngine::for_font(&bytes)?;
        Ok(Self::Shaped {
            bytes: Arc::new(bytes),
            source: path.to_path_buf(),
        })
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }
}

/// Parley contexts bound to a single registered font family.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font_bytes` and remember the first family it provides.
    pub fn for_font(font_bytes: &[u8]) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| ReelError::render("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::render("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape one line of text without wrapping.
    pub fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> ReelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::render("text size_px must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
