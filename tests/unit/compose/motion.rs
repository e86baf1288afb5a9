use super::*;
use crate::compose::geometry::{canvas_center, clamp_offset_to_cover, cover_scale, covers_canvas, layer_affine};

const TALL: Canvas = Canvas {
    width: 1080,
    height: 1920,
};

#[test]
fn zoom_variants_run_between_one_and_peak() {
    let start = KenBurns::ZoomIn.pose(0.0, TALL).scale / KEN_BURNS_PRESCALE;
    let end = KenBurns::ZoomIn.pose(1.0, TALL).scale / KEN_BURNS_PRESCALE;
    assert!((start - 1.0).abs() < 1e-12);
    assert!((end - KEN_BURNS_MAX_ZOOM).abs() < 1e-12);

    let start = KenBurns::ZoomOut.pose(0.0, TALL).scale / KEN_BURNS_PRESCALE;
    let end = KenBurns::ZoomOut.pose(1.0, TALL).scale / KEN_BURNS_PRESCALE;
    assert!((start - KEN_BURNS_MAX_ZOOM).abs() < 1e-12);
    assert!((end - 1.0).abs() < 1e-12);
}

#[test]
fn pans_travel_ten_percent_of_width_in_their_direction() {
    let left = KenBurns::PanLeft.pose(1.0, TALL).offset.x;
    let right = KenBurns::PanRight.pose(1.0, TALL).offset.x;
    assert!((left + 108.0).abs() < 1e-9);
    assert!((right - 108.0).abs() < 1e-9);
    assert_eq!(KenBurns::PanRight.pose(0.0, TALL).offset.x, 0.0);
}

#[test]
fn every_variant_covers_the_canvas_throughout() {
    for (w, h) in [(1920.0, 1080.0), (1080.0, 1920.0), (800.0, 800.0), (3000.0, 900.0)] {
        let base = cover_scale(w, h, TALL);
        for variant in KenBurns::ALL {
            for step in 0..=20 {
                let mut pose = variant.pose(f64::from(step) / 20.0, TALL);
                pose.offset = clamp_offset_to_cover(w, h, base * pose.scale, TALL, pose.offset);
                let a = layer_affine(w, h, base, canvas_center(TALL), &pose);
                assert!(covers_canvas(a, w, h, TALL), "{variant:?} {w}x{h} step {step}");
            }
        }
    }
}

#[test]
fn seeded_chooser_is_reproducible() {
    let picks = |seed| {
        let mut c = SeededChooser::new(Some(seed));
        (0..16).map(|i| c.choose(i)).collect::<Vec<_>>()
    };
    assert_eq!(picks(7), picks(7));
}

#[test]
fn closures_are_choosers() {
    let mut fixed = |_i: usize| KenBurns::PanLeft;
    assert_eq!(MotionChooser::choose(&mut fixed, 3), KenBurns::PanLeft);
}

#[test]
fn default_float_is_gentle_and_breathes() {
    let m = MinimalistMotion::new(None, 0.5);
    assert_eq!(m.hint, MotionHint::Floating);
    let peak = m.pose(0.75, 10.0, TALL);
    assert!(peak.offset.y.abs() <= 0.004 * 1920.0 + 1e-9);
    assert!(peak.offset.y.abs() > 1.0);
    for step in 0..40 {
        let p = m.pose(f64::from(step) * 0.1 + 0.5, 10.0, TALL);
        assert!((p.scale - 1.0).abs() <= 0.015 + 1e-9);
    }
}

#[test]
fn jumping_bounces_higher_than_floating() {
    let jump = MinimalistMotion::new(Some(MotionHint::Jumping), 0.5);
    let float = MinimalistMotion::new(None, 0.5);
    let max_abs = |m: &MinimalistMotion| {
        (0..120)
            .map(|i| m.pose(f64::from(i) / 30.0, 10.0, TALL).offset.y.abs())
            .fold(0.0, f64::max)
    };
    assert!(max_abs(&jump) > 2.0 * max_abs(&float));
    for i in 0..120 {
        assert!(jump.pose(f64::from(i) / 30.0, 10.0, TALL).offset.y <= 0.0);
    }
}

#[test]
fn pulsing_suppresses_breathing() {
    let m = MinimalistMotion::new(Some(MotionHint::Pulsing), 0.5);
    for i in 0..60 {
        let p = m.pose(f64::from(i) / 30.0, 10.0, TALL);
        assert!(p.scale >= 1.0 - 1e-12 && p.scale <= 1.08 + 1e-12);
        assert_eq!(p.offset, Vec2::ZERO);
    }
}

#[test]
fn swaying_rotates_within_five_degrees() {
    let m = MinimalistMotion::new(Some(MotionHint::Swaying), 0.5);
    let p = m.pose(0.5, 10.0, TALL);
    assert!((p.rotation_rad - 5f64.to_radians()).abs() < 1e-9);
}

#[test]
fn fades_at_both_boundaries() {
    assert_eq!(fade_opacity(0.0, 4.0, 0.5), 0.0);
    assert!((fade_opacity(0.25, 4.0, 0.5) - 0.5).abs() < 1e-6);
    assert_eq!(fade_opacity(2.0, 4.0, 0.5), 1.0);
    assert!((fade_opacity(3.75, 4.0, 0.5) - 0.5).abs() < 1e-6);
    assert_eq!(fade_opacity(0.0, 4.0, 0.0), 1.0);
}
