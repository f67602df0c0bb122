use std::time::{Duration, Instant};

use juliascope_core::{Complex, FractalParams, TileKey, Viewport, TILE_SIZE};
use juliascope_stream::{RequestScheduler, Tile, TileCache, TilePixels, COARSE_LOD};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn pixels(fill: u8) -> TilePixels {
    TilePixels {
        width: 32,
        height: 32,
        rgba: vec![fill; 32 * 32 * 4],
    }
}

/// Deliver every key of a request into the cache, retiring it from the
/// scheduler's pending set — what the connection event loop does for real.
fn deliver_all(sched: &mut RequestScheduler, cache: &mut TileCache, keys: &[TileKey]) {
    for key in keys {
        sched.on_tile_received(key);
        cache.put(Tile {
            key: *key,
            pixels: pixels(1),
            received_at: Instant::now(),
        });
    }
}

#[test]
fn settle_fetch_refine_cycle() {
    let start = Instant::now();
    let vp = Viewport::new(Complex::ZERO, 150.0, 512, 384).unwrap();
    let params = FractalParams::default();
    let mut sched = RequestScheduler::with_timing(TILE_SIZE, ms(100), ms(400), ms(120));
    let mut cache = TileCache::new();

    // One settle: coarse batch fires after the quiet window.
    sched.settle_viewport(vp, params, start);
    let coarse = sched.tick(start + ms(100), &cache);
    assert_eq!(coarse.len(), 1);
    assert_eq!(coarse[0].params.lod, COARSE_LOD);

    // Coarse tiles arrive; the fine pass follows and requests the same
    // grid at full detail.
    deliver_all(&mut sched, &mut cache, &coarse[0].keys());
    let fine = sched.tick(start + ms(220), &cache);
    assert_eq!(fine.len(), 1);
    assert_eq!(fine[0].params.lod, 1);
    assert_eq!(fine[0].keys().len(), coarse[0].keys().len());

    deliver_all(&mut sched, &mut cache, &fine[0].keys());
    assert_eq!(sched.in_flight(), 0);

    // Compositing order: every coarse tile precedes every fine tile.
    let lods: Vec<u32> = cache.ordered_by_lod().iter().map(|t| t.key.lod).collect();
    assert!(lods.windows(2).all(|w| w[0] >= w[1]));

    // Fully warm: an identical settle produces no traffic at all.
    sched.settle_viewport(vp, params, start + ms(500));
    assert!(sched.tick(start + ms(600), &cache).is_empty());
    assert!(sched.tick(start + ms(800), &cache).is_empty());
}

#[test]
fn pan_keeps_cache_param_change_clears_it() {
    let start = Instant::now();
    let vp = Viewport::new(Complex::ZERO, 150.0, 512, 384).unwrap();
    let params = FractalParams::default();
    let mut sched = RequestScheduler::with_timing(TILE_SIZE, ms(100), ms(400), ms(120));
    let mut cache = TileCache::new();

    sched.settle_viewport(vp, params, start);
    let coarse = sched.tick(start + ms(100), &cache);
    deliver_all(&mut sched, &mut cache, &coarse[0].keys());
    let cached_before = cache.len();
    assert!(cached_before > 0);

    // Pure pan: nothing is evicted, previously cached tiles stay
    // retrievable under their keys.
    let mut panned = vp;
    panned.pan_by_pixels(3.0 * TILE_SIZE as f64, 0.0);
    sched.settle_viewport(panned, params, start + ms(300));
    let reqs = sched.tick(start + ms(400), &cache);
    assert_eq!(cache.len(), cached_before);
    for key in &coarse[0].keys() {
        assert!(cache.has(key));
    }
    // Only the newly exposed column is requested.
    if let Some(req) = reqs.first() {
        for key in req.keys() {
            assert!(!coarse[0].keys().contains(&key));
        }
    }

    // Parameter change: the cache is invalidated wholesale (by the owner
    // of the cache, on the settle event).
    let hotter = params.with_max_iterations(2048);
    cache.clear();
    sched.settle_params(panned, hotter, start + ms(600));
    assert!(cache.is_empty());

    let reqs = sched.tick(start + ms(1000), &cache);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].params.max_iterations, 2048);
}

#[test]
fn reconnect_replays_state_at_drop_time() {
    let start = Instant::now();
    let vp = Viewport::new(Complex::new(-0.3, 0.7), 220.0, 640, 480).unwrap();
    let params = FractalParams::default().with_max_iterations(512);
    let mut sched = RequestScheduler::with_timing(TILE_SIZE, ms(100), ms(400), ms(120));
    let cache = TileCache::new();

    sched.settle_viewport(vp, params, start);
    let sent = sched.tick(start + ms(100), &cache);
    assert_eq!(sent.len(), 1);

    // The connection drops with tiles still in flight. On reconnect the
    // replay produces exactly one coarse batch carrying the state in
    // effect at drop time — pending bookkeeping from before is void.
    assert!(sched.in_flight() > 0);
    sched.replay(start + ms(5000));

    let replayed = sched.tick(start + ms(5100), &cache);
    assert_eq!(replayed.len(), 1);
    assert_eq!(replayed[0].viewport.center, vp.center);
    assert_eq!(replayed[0].viewport.zoom, vp.zoom);
    assert_eq!(replayed[0].params.max_iterations, 512);
    assert_eq!(replayed[0].keys(), sent[0].keys());
}

#[test]
fn late_tile_for_superseded_view_is_still_cached() {
    let start = Instant::now();
    let vp = Viewport::new(Complex::ZERO, 150.0, 512, 384).unwrap();
    let params = FractalParams::default();
    let mut sched = RequestScheduler::with_timing(TILE_SIZE, ms(100), ms(400), ms(120));
    let mut cache = TileCache::new();

    sched.settle_viewport(vp, params, start);
    let coarse = sched.tick(start + ms(100), &cache);
    let old_key = coarse[0].keys()[0];

    // The user pans far away before anything arrives.
    let mut panned = vp;
    panned.pan_by_pixels(40.0 * TILE_SIZE as f64, 0.0);
    sched.settle_viewport(panned, params, start + ms(150));
    let _ = sched.tick(start + ms(250), &cache);

    // A tile for the old view straggles in: accepted, never rejected —
    // tiles stay reusable until parameters change.
    deliver_all(&mut sched, &mut cache, &[old_key]);
    assert!(cache.has(&old_key));
}
