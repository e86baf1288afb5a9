use super::*;

fn fps30() -> Fps {
    Fps::new(30, 1).unwrap()
}

#[test]
fn cut_never_overlaps() {
    assert_eq!(TransitionPolicy::Cut.overlap_frames(fps30(), 90, 90), 0);
}

#[test]
fn crossfade_overlap_rounds_to_frames() {
    let p = TransitionPolicy::Crossfade { duration_sec: 0.5 };
    assert_eq!(p.overlap_frames(fps30(), 90, 120), 15);
    let p = TransitionPolicy::Crossfade { duration_sec: 0.51 };
    assert_eq!(p.overlap_frames(fps30(), 90, 120), 15);
}

#[test]
fn crossfade_overlap_is_clamped_to_half_the_shorter_clip() {
    let p = TransitionPolicy::Crossfade { duration_sec: 0.5 };
    assert_eq!(p.overlap_frames(fps30(), 10, 120), 5);
    assert_eq!(p.overlap_frames(fps30(), 120, 1), 0);
}

#[test]
fn progress_is_strictly_inside_the_unit_interval_during_overlap() {
    let overlap = 15;
    let mut last = 0.0f32;
    for f in 0..overlap {
        let p = crossfade_progress(f, overlap);
        assert!(p > last && p < 1.0);
        last = p;
    }
    assert_eq!(crossfade_progress(overlap, overlap), 1.0);
    assert_eq!(crossfade_progress(0, 0), 1.0);
}
