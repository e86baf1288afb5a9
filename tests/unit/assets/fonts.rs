use std::io::Write;

use super::*;

#[test]
fn loading_a_non_font_file_fails() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(b"definitely not a font").unwrap();
    assert!(CaptionFont::load(f.path()).is_err());
}

#[test]
fn missing_configured_font_still_resolves() {
    let font = CaptionFont::resolve(Some(Path::new("/no/such/font.ttf")));
    if let CaptionFont::Shaped { source, .. } = &font {
        assert_ne!(source, Path::new("/no/such/font.ttf"));
    }
}

#[test]
fn engine_rejects_garbage_font_bytes() {
    assert!(TextLayoutEngine::for_font(b"garbage").is_err());
}

#[test]
fn system_font_lays_out_when_present() {
    let Some(path) = SYSTEM_FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
    else {
        return;
    };
    let bytes = std::fs::read(path).unwrap();
    let mut engine = TextLayoutEngine::for_font(&bytes).unwrap();
    assert!(!engine.family_name().is_empty());
    let layout = engine
        .layout_line("Hello", 32.0, TextBrushRgba8::default())
        .unwrap();
    assert!(layout.width() > 0.0);
    assert!(engine.layout_line("x", 0.0, TextBrushRgba8::default()).is_err());
}
