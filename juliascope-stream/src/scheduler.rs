use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use juliascope_core::{visible_tiles, FractalParams, TileKey, Viewport};

use crate::cache::TileCache;
use crate::debounce::{Debounce, Delayed};
use crate::protocol::TileRequest;

/// LOD tier used for the immediate coarse pass.
pub const COARSE_LOD: u32 = 4;

/// Quiet window for viewport gestures (pan/zoom settle).
pub const FAST_SETTLE: Duration = Duration::from_millis(30);

/// Quiet window for parameter edits, which are expensive to recompute
/// remotely.
pub const SLOW_SETTLE: Duration = Duration::from_millis(400);

/// Gap between dispatching the coarse batch and its fine refinement.
pub const FINE_DELAY: Duration = Duration::from_millis(120);

/// How long a dispatched key stays pending before it may be re-requested.
pub const PENDING_TIMEOUT: Duration = Duration::from_secs(10);

/// A settled (viewport, parameters) snapshot — the unit the debounce
/// timers coalesce over.
#[derive(Debug, Clone, Copy)]
struct Settle {
    viewport: Viewport,
    params: FractalParams,
}

/// Decides when and what to request from the remote renderer.
///
/// Two explicit debounce classes coalesce input — fast for viewport
/// gestures, slow for parameter edits — and each firing produces a coarse
/// batch immediately with a fine refinement armed behind a cancellable
/// delay. Coarse-before-fine is strict: the fine batch of a generation is
/// only ever dispatched after its coarse batch, and a new settle cancels
/// any not-yet-fired fine batch outright.
///
/// The scheduler is synchronous and driven from the UI loop: callers poke
/// settles as input arrives and call [`tick`](Self::tick) once per frame,
/// sending whatever requests it returns. All timing flows through explicit
/// `Instant` arguments.
#[derive(Debug)]
pub struct RequestScheduler {
    tile_size: u32,
    fast: Debounce<Settle>,
    slow: Debounce<Settle>,
    fine: Delayed<Settle>,
    fine_delay: Duration,
    /// Keys dispatched and not yet delivered, with their send time.
    pending: BTreeMap<TileKey, Instant>,
    /// The most recent settled state, replayed after a reconnect.
    last_state: Option<Settle>,
}

impl RequestScheduler {
    pub fn new(tile_size: u32) -> Self {
        Self::with_timing(tile_size, FAST_SETTLE, SLOW_SETTLE, FINE_DELAY)
    }

    /// Construct with explicit windows. Used by tests to pin timing.
    pub fn with_timing(
        tile_size: u32,
        fast_window: Duration,
        slow_window: Duration,
        fine_delay: Duration,
    ) -> Self {
        Self {
            tile_size,
            fast: Debounce::new(fast_window),
            slow: Debounce::new(slow_window),
            fine: Delayed::new(),
            fine_delay,
            pending: BTreeMap::new(),
            last_state: None,
        }
    }

    /// Record a viewport gesture settle (pan committed, zoom step).
    ///
    /// Any armed fine batch is for a superseded viewport and is cancelled
    /// rather than sent.
    pub fn settle_viewport(&mut self, viewport: Viewport, params: FractalParams, now: Instant) {
        self.fine.cancel();
        self.fast.poke(Settle { viewport, params }, now);
    }

    /// Record a parameter edit settle.
    ///
    /// The caller clears the tile cache itself — parameter changes
    /// invalidate all pixel content; the scheduler additionally forgets
    /// in-flight keys since their deliveries are now worthless.
    pub fn settle_params(&mut self, viewport: Viewport, params: FractalParams, now: Instant) {
        self.fine.cancel();
        self.pending.clear();
        self.slow.poke(Settle { viewport, params }, now);
    }

    /// Re-arm an immediate settle from the last known state.
    ///
    /// Called on reconnect: everything requested before the drop is
    /// presumed lost, so pending state is discarded and the current
    /// visible set re-derived.
    pub fn replay(&mut self, now: Instant) {
        if let Some(state) = self.last_state {
            debug!("Replaying state after reconnect");
            self.pending.clear();
            self.fine.cancel();
            self.fast.poke(state, now);
        }
    }

    /// A delivered tile retires its pending entry.
    ///
    /// Returns whether the key was actually in flight. A `false` during a
    /// parameter refresh means the delivery predates the change and its
    /// content is stale.
    pub fn on_tile_received(&mut self, key: &TileKey) -> bool {
        self.pending.remove(key).is_some()
    }

    /// Number of dispatched-but-undelivered keys, for the HUD.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// `true` while any debounce or delay timer is armed — the caller
    /// must keep ticking until it drains.
    pub fn has_armed_timers(&self) -> bool {
        self.fast.is_armed() || self.slow.is_armed() || self.fine.is_armed()
    }

    /// Advance timers and produce the requests to send right now.
    ///
    /// At most one coarse batch (from a fired settle) and one fine batch
    /// (from the armed delay) per call, coarse first.
    pub fn tick(&mut self, now: Instant, cache: &TileCache) -> Vec<TileRequest> {
        self.expire_pending(now);

        let mut out = Vec::new();

        // Slow class first so a parameter settle that fires in the same
        // frame as a gesture settle wins (it carries newer parameters).
        let fired = self.slow.fire(now).or_else(|| self.fast.fire(now));
        if let Some(state) = fired {
            self.last_state = Some(state);

            let coarse = self.missing_keys(&state, COARSE_LOD, cache);
            if !coarse.is_empty() {
                out.push(self.dispatch(&state, COARSE_LOD, coarse, now));
            }

            // Arm the refinement pass unless the fine tier is the coarse
            // tier (nothing finer to fetch).
            if state.params.lod < COARSE_LOD {
                self.fine.arm(state, self.fine_delay, now);
            }
        }

        if let Some(state) = self.fine.fire(now) {
            let fine = self.missing_keys(&state, state.params.lod, cache);
            if !fine.is_empty() {
                out.push(self.dispatch(&state, state.params.lod, fine, now));
            }
        }

        out
    }

    /// Visible keys at `lod` that are neither cached nor in flight.
    fn missing_keys(&self, state: &Settle, lod: u32, cache: &TileCache) -> Vec<TileKey> {
        visible_tiles(&state.viewport, self.tile_size, lod)
            .into_iter()
            .filter(|k| !cache.has(k) && !self.pending.contains_key(k))
            .collect()
    }

    fn dispatch(&mut self, state: &Settle, lod: u32, keys: Vec<TileKey>, now: Instant) -> TileRequest {
        trace!(lod, count = keys.len(), "Dispatching tile batch");
        for key in &keys {
            self.pending.insert(*key, now);
        }
        TileRequest::new(&state.viewport, &state.params, lod, &keys)
    }

    /// Drop pending entries older than the timeout so their keys become
    /// requestable again on the next settle.
    fn expire_pending(&mut self, now: Instant) {
        let timeout = PENDING_TIMEOUT;
        let before = self.pending.len();
        self.pending.retain(|_, sent| now.duration_since(*sent) < timeout);
        let expired = before - self.pending.len();
        if expired > 0 {
            debug!(expired, "Pending tile requests timed out");
        }
    }
}
