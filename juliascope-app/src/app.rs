use std::collections::HashMap;
use std::time::{Duration, Instant};

use eframe::egui;
use tracing::debug;

use juliascope_core::{Complex, FractalParams, TileKey, Viewport, TILE_SIZE};
use juliascope_stream::{
    connection, ConnEvent, ConnState, ConnectionHandle, RequestScheduler, Tile, TileCache,
    TilePixels,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Zoom ratio per discrete wheel notch (×1.1 in, ×1/1.1 out).
pub(crate) const WHEEL_STEP: f64 = 1.1;
/// Scroll distance, in points, that counts as one wheel notch.
pub(crate) const WHEEL_NOTCH: f64 = 50.0;
/// Fraction of the viewport to pan per arrow-key press.
pub(crate) const PAN_FRACTION: f64 = 0.1;
/// Maximum undo/redo history entries.
pub(crate) const MAX_HISTORY: usize = 200;

/// Coloring functions offered by the remote renderer, by index.
pub(crate) const COLORING_NAMES: &[&str] = &["Smooth", "Bands", "Fire", "Ocean"];

/// How soon to wake up again while scheduler timers are armed.
const TIMER_WAKEUP: Duration = Duration::from_millis(30);

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

pub struct JuliaScopeApp {
    // Exploration state
    pub(crate) viewport: Viewport,
    pub(crate) params: FractalParams,

    // Streaming
    pub(crate) cache: TileCache,
    pub(crate) scheduler: RequestScheduler,
    pub(crate) conn: ConnectionHandle,
    pub(crate) conn_state: ConnState,

    // Uploaded tile textures, keyed like the cache and dropped with it.
    pub(crate) textures: HashMap<TileKey, egui::TextureHandle>,
    /// Full-frame texture for the no-tiling delivery mode.
    pub(crate) frame_texture: Option<egui::TextureHandle>,

    // Input state
    pub(crate) drag_active: bool,
    /// Live sub-tile pan offset in points. Whole-tile crossings are folded
    /// into the viewport centre as they happen, so this stays smaller than
    /// one tile in magnitude.
    pub(crate) pan_offset: egui::Vec2,
    pub(crate) cursor_plane: Option<Complex>,

    // View history
    pub(crate) history: Vec<Viewport>,
    pub(crate) history_pos: usize,

    // UI state
    pub(crate) panel_size: [u32; 2],
    pub(crate) show_hud: bool,
    pub(crate) show_controls: bool,
    pub(crate) tiles_received: u64,

    /// Set between a parameter change and the dispatch of its first batch.
    /// Deliveries in this window that do not retire a pending key were
    /// computed under the old parameters and must not repopulate the
    /// freshly cleared cache (a cached stale key would suppress its own
    /// re-request).
    awaiting_refresh: bool,
}

impl JuliaScopeApp {
    pub fn new(egui_ctx: &egui::Context, endpoint: String) -> Self {
        let viewport = Viewport::default_view(1280, 800);

        // The connection worker nudges the UI awake whenever it has
        // produced events, so tile deliveries repaint promptly.
        let repaint_ctx = egui_ctx.clone();
        let conn = connection::spawn(endpoint, move || repaint_ctx.request_repaint());

        Self {
            viewport,
            params: FractalParams::default(),

            cache: TileCache::new(),
            scheduler: RequestScheduler::new(TILE_SIZE),
            conn,
            conn_state: ConnState::Disconnected,

            textures: HashMap::new(),
            frame_texture: None,

            drag_active: false,
            pan_offset: egui::Vec2::ZERO,
            cursor_plane: None,

            history: vec![viewport],
            history_pos: 0,

            panel_size: [1280, 800],
            show_hud: true,
            show_controls: false,
            tiles_received: 0,

            awaiting_refresh: false,
        }
    }

    // -- Connection events -----------------------------------------------------

    /// Drain worker events: tile deliveries feed the cache (and retire
    /// their pending entries), state changes drive the reconnect replay.
    pub(crate) fn poll_connection(&mut self, ctx: &egui::Context, now: Instant) {
        for event in self.conn.poll_events() {
            match event {
                ConnEvent::State(state) => {
                    debug!(state = state.label(), "Connection state changed");
                    self.conn_state = state;
                    if state == ConnState::Connected {
                        // Tiles requested before the drop are lost; replay
                        // the current state in full.
                        self.scheduler.replay(now);
                    }
                }
                ConnEvent::Tile { key, pixels } => {
                    let retired_pending = self.scheduler.on_tile_received(&key);
                    if self.awaiting_refresh && !retired_pending {
                        debug!(%key, "Dropping delivery computed under old parameters");
                        continue;
                    }
                    self.upload_tile_texture(ctx, key, &pixels);
                    self.cache.put(Tile {
                        key,
                        pixels,
                        received_at: now,
                    });
                    self.tiles_received += 1;
                }
                ConnEvent::Frame { pixels } => {
                    self.frame_texture = Some(Self::upload_frame_texture(ctx, &pixels));
                }
            }
        }
    }

    fn upload_tile_texture(&mut self, ctx: &egui::Context, key: TileKey, pixels: &TilePixels) {
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [pixels.width as usize, pixels.height as usize],
            &pixels.rgba,
        );
        let name = format!("tile_{}_{}_{}", key.x, key.y, key.lod);
        self.textures
            .insert(key, ctx.load_texture(name, image, egui::TextureOptions::LINEAR));
    }

    fn upload_frame_texture(ctx: &egui::Context, pixels: &TilePixels) -> egui::TextureHandle {
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [pixels.width as usize, pixels.height as usize],
            &pixels.rgba,
        );
        ctx.load_texture("frame", image, egui::TextureOptions::LINEAR)
    }

    // -- Scheduler -------------------------------------------------------------

    /// Advance the scheduler and forward whatever it wants sent.
    pub(crate) fn pump_scheduler(&mut self, ctx: &egui::Context, now: Instant) {
        let requests = self.scheduler.tick(now, &self.cache);
        if !requests.is_empty() {
            // The first batch after a parameter change carries the new
            // parameters; deliveries retiring its keys are trustworthy.
            self.awaiting_refresh = false;
        }
        for request in requests {
            self.conn.send(request);
        }
        // Armed timers need ticks to fire even with no input arriving.
        if self.scheduler.has_armed_timers() {
            ctx.request_repaint_after(TIMER_WAKEUP);
        }
    }

    /// A settled viewport gesture: poke the fast debounce class.
    pub(crate) fn settle_view(&mut self, now: Instant) {
        self.scheduler
            .settle_viewport(self.viewport, self.params, now);
    }

    /// A parameter edit: pixel content is now invalid everywhere.
    pub(crate) fn on_params_changed(&mut self, now: Instant) {
        self.cache.clear();
        self.textures.clear();
        self.frame_texture = None;
        self.awaiting_refresh = true;
        self.scheduler.settle_params(self.viewport, self.params, now);
    }

    // -- Pan offset ------------------------------------------------------------

    /// Fold the live sub-tile offset into the viewport centre.
    ///
    /// Called before history operations and programmatic viewport jumps so
    /// snapshots land on the visually current view.
    pub(crate) fn commit_pan_offset(&mut self) {
        if self.pan_offset != egui::Vec2::ZERO {
            self.viewport
                .pan_by_pixels(self.pan_offset.x as f64, self.pan_offset.y as f64);
            self.pan_offset = egui::Vec2::ZERO;
        }
    }

    // -- History ---------------------------------------------------------------

    pub(crate) fn push_history(&mut self) {
        self.commit_pan_offset();
        self.history.truncate(self.history_pos + 1);
        self.history.push(self.viewport);
        self.history_pos = self.history.len() - 1;
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
            self.history_pos = self.history.len() - 1;
        }
    }

    pub(crate) fn go_back(&mut self, now: Instant) {
        self.commit_pan_offset();
        if self.history_pos > 0 {
            self.history_pos -= 1;
            self.restore_viewport(self.history[self.history_pos], now);
        }
    }

    pub(crate) fn go_forward(&mut self, now: Instant) {
        self.commit_pan_offset();
        if self.history_pos + 1 < self.history.len() {
            self.history_pos += 1;
            self.restore_viewport(self.history[self.history_pos], now);
        }
    }

    /// Snapshots carry the canvas size they were taken at; the window may
    /// have been resized since.
    fn restore_viewport(&mut self, mut viewport: Viewport, now: Instant) {
        viewport.width = self.panel_size[0];
        viewport.height = self.panel_size[1];
        self.viewport = viewport;
        self.settle_view(now);
    }

    pub(crate) fn reset_view(&mut self, now: Instant) {
        self.push_history();
        self.viewport = Viewport::default_view(self.panel_size[0], self.panel_size[1]);
        self.settle_view(now);
    }

    // -- Resize ----------------------------------------------------------------

    pub(crate) fn check_resize(&mut self, width: u32, height: u32, now: Instant) {
        if width > 0 && height > 0 && (width != self.panel_size[0] || height != self.panel_size[1])
        {
            self.panel_size = [width, height];
            self.viewport.width = width;
            self.viewport.height = height;
            self.settle_view(now);
        }
    }
}

impl eframe::App for JuliaScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        self.poll_connection(ctx, now);
        self.handle_keyboard(ctx, now);

        if self.show_controls {
            self.show_controls_panel(ctx, now);
        }

        self.show_canvas(ctx, now);
        self.show_hud(ctx);

        self.pump_scheduler(ctx, now);
    }
}
