use super::*;

#[test]
fn measure_accounts_for_trailing_gap() {
    assert_eq!(measure("", 2.0), (0.0, 0.0));
    assert_eq!(measure("A", 2.0), (10.0, 14.0));
    assert_eq!(measure("AB", 1.0), (11.0, 7.0));
}

#[test]
fn lowercase_matches_uppercase_and_unknown_is_question_mark() {
    assert_eq!(glyph('a'), glyph('A'));
    assert_eq!(glyph('é'), glyph('?'));
    assert_eq!(glyph(' '), [0; 7]);
}

#[test]
fn fill_lands_inside_and_stroke_surrounds_it() {
    let (w, h) = (40u32, 20u32);
    let mut data = vec![0u8; (w * h * 4) as usize];
    let mut target = BitmapTarget {
        data: &mut data,
        width: w,
        height: h,
    };
    let fill = Rgba8Premul::opaque(255, 255, 255);
    let stroke = Rgba8Premul::opaque(0, 0, 0);
    draw_line(&mut target, "I", (4.0, 4.0), 2.0, fill, Some((stroke, 1.0)));

    let px = |x: u32, y: u32| {
        let i = ((y * w + x) * 4) as usize;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    };
    // 'I' top row is 0b01110: cells 1..4 lit, cell 0 dark.
    assert_eq!(px(4 + 2 * 2, 4), [255, 255, 255, 255]);
    // Left of the first lit cell is stroke only.
    assert_eq!(px(4 + 2 - 1, 4), [0, 0, 0, 255]);
    // Far away stays transparent.
    assert_eq!(px(39, 19), [0, 0, 0, 0]);
}

#[test]
fn drawing_off_canvas_is_clipped() {
    let mut data = vec![0u8; 4 * 4 * 4];
    let mut target = BitmapTarget {
        data: &mut data,
        width: 4,
        height: 4,
    };
    draw_line(
        &mut target,
        "WWW",
        (-10.0, -10.0),
        4.0,
        Rgba8Premul::opaque(1, 2, 3),
        None,
    );
    draw_line(
        &mut target,
        "W",
        (100.0, 100.0),
        4.0,
        Rgba8Premul::opaque(1, 2, 3),
        None,
    );
}
