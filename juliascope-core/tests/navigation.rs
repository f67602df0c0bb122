use juliascope_core::{crossed_tiles, visible_tiles, Complex, TileKey, Viewport, TILE_SIZE};

const EPSILON: f64 = 1e-9;

/// Simulate a drag: accumulate a pixel offset, convert whole-tile
/// crossings into centre shifts, retain the sub-tile remainder.
fn settle_drag(vp: &mut Viewport, drag_x: f64, drag_y: f64) -> (f64, f64) {
    let (tx, ty, rx, ry) = crossed_tiles(drag_x, drag_y, TILE_SIZE);
    vp.pan_by_pixels(tx as f64 * TILE_SIZE as f64, ty as f64 * TILE_SIZE as f64);
    (rx, ry)
}

#[test]
fn drag_recentering_keeps_visible_set_consistent() {
    let mut vp = Viewport::new(Complex::ZERO, 200.0, 1024, 768).unwrap();
    let before: Vec<TileKey> = visible_tiles(&vp, TILE_SIZE, 1);

    // A long drag crosses tiles; after re-centering, the visible window
    // has shifted by exactly the crossed whole tiles.
    let (rx, ry) = settle_drag(&mut vp, 300.0, -50.0);
    assert!((rx - 44.0).abs() < EPSILON);
    assert!((ry - (-50.0)).abs() < EPSILON);

    let after: Vec<TileKey> = visible_tiles(&vp, TILE_SIZE, 1);
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(a.x, b.x - 2, "content dragged right ⇒ window moved left");
        assert_eq!(a.y, b.y);
    }
}

#[test]
fn zoom_sequence_preserves_anchor_across_steps() {
    let mut vp = Viewport::new(Complex::new(-0.5, 0.1), 300.0, 800, 600).unwrap();
    let (px, py) = (200.0, 450.0);
    let anchor = vp.pixel_to_plane(px, py);

    // Ten discrete wheel steps in, five out — the anchor must not drift.
    for _ in 0..10 {
        vp.zoom_about_cursor(px, py, 1.1);
    }
    for _ in 0..5 {
        vp.zoom_about_cursor(px, py, 1.0 / 1.1);
    }

    let now = vp.pixel_to_plane(px, py);
    assert!((now.re - anchor.re).abs() < 1e-9);
    assert!((now.im - anchor.im).abs() < 1e-9);
}

#[test]
fn repeated_small_drags_equal_one_large_drag() {
    let mut a = Viewport::new(Complex::ZERO, 150.0, 640, 480).unwrap();
    let mut b = a;

    // Many small crossings versus one large one: both end up with the
    // same centre once their remainders are committed.
    let mut rem = (0.0, 0.0);
    for _ in 0..10 {
        let (_, _, rx, ry) = crossed_tiles(rem.0 + 70.0, rem.1 - 33.0, TILE_SIZE);
        let tx = (rem.0 + 70.0 - rx) / TILE_SIZE as f64;
        let ty = (rem.1 - 33.0 - ry) / TILE_SIZE as f64;
        a.pan_by_pixels(tx * TILE_SIZE as f64, ty * TILE_SIZE as f64);
        rem = (rx, ry);
    }
    a.pan_by_pixels(rem.0, rem.1);

    b.pan_by_pixels(700.0, -330.0);

    assert!((a.center.re - b.center.re).abs() < 1e-9);
    assert!((a.center.im - b.center.im).abs() < 1e-9);
}
