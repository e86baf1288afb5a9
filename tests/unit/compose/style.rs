use super::*;
use crate::foundation::core::Canvas;

fn luma(c: Rgba8Premul) -> u32 {
    u32::from(c.r) + u32::from(c.g) + u32::from(c.b)
}

#[test]
fn cinematic_is_full_bleed_pale_on_dark_with_crossfades() {
    let p = StyleProfile::for_config(&RenderConfig::new(Canvas::SHORT_FORM, Style::Cinematic));
    assert_eq!(p.layout, VisualLayout::FullBleed);
    assert!(luma(p.caption.fill) > luma(p.caption.stroke));
    assert_eq!(
        p.transition,
        TransitionPolicy::Crossfade { duration_sec: 0.5 }
    );
    assert_eq!(p.fade_sec, 0.0);
}

#[test]
fn minimalist_is_inset_dark_on_pale_with_cuts_and_fades() {
    let p = StyleProfile::for_config(&RenderConfig::new(Canvas::LONG_FORM, Style::Minimalist));
    let VisualLayout::Inset {
        width_fraction,
        backdrop,
        ..
    } = p.layout
    else {
        panic!("minimalist must inset the visual");
    };
    assert!((width_fraction - 0.7).abs() < 1e-12);
    assert!(luma(backdrop) > 600);
    assert!(luma(p.caption.fill) < luma(p.caption.stroke));
    assert_eq!(p.transition, TransitionPolicy::Cut);
    assert_eq!(p.fade_sec, 0.5);
}
