use std::time::Instant;

use eframe::egui;

use juliascope_core::{crossed_tiles, TILE_SIZE};

use crate::app::{JuliaScopeApp, PAN_FRACTION, WHEEL_NOTCH, WHEEL_STEP};

impl JuliaScopeApp {
    pub(crate) fn handle_canvas_input(
        &mut self,
        ctx: &egui::Context,
        response: &egui::Response,
        now: Instant,
    ) {
        // Track the cursor's plane position. The live pan offset is part
        // of what is on screen, so subtract it to stay in viewport space.
        self.cursor_plane = response.hover_pos().map(|pos| {
            let px = (pos.x - response.rect.min.x - self.pan_offset.x) as f64;
            let py = (pos.y - response.rect.min.y - self.pan_offset.y) as f64;
            self.viewport.pixel_to_plane(px, py)
        });

        // -- Mouse wheel: zoom about the cursor -------------------------------
        let scroll_y = ctx.input(|i| i.raw_scroll_delta.y);
        if scroll_y.abs() > 0.0 && response.hovered() {
            if let Some(pos) = response.hover_pos() {
                let px = (pos.x - response.rect.min.x - self.pan_offset.x) as f64;
                let py = (pos.y - response.rect.min.y - self.pan_offset.y) as f64;
                let factor = WHEEL_STEP.powf(scroll_y as f64 / WHEEL_NOTCH);
                if !self.drag_active {
                    self.push_history();
                }
                self.viewport.zoom_about_cursor(px, py, factor);
                self.settle_view(now);
            }
        }

        // -- Left drag: pan ---------------------------------------------------
        // The offset accumulates per frame; whenever it spans a whole tile
        // the crossing is folded into the viewport centre and only the
        // sub-tile remainder stays live. Cached tiles remain valid — the
        // drag merely changes where they are drawn.
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.drag_active = true;
            self.push_history();
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            self.pan_offset += response.drag_delta();

            let (tiles_x, tiles_y, rem_x, rem_y) = crossed_tiles(
                self.pan_offset.x as f64,
                self.pan_offset.y as f64,
                TILE_SIZE,
            );
            if tiles_x != 0 || tiles_y != 0 {
                self.viewport.pan_by_pixels(
                    tiles_x as f64 * TILE_SIZE as f64,
                    tiles_y as f64 * TILE_SIZE as f64,
                );
                self.pan_offset = egui::vec2(rem_x as f32, rem_y as f32);
                // Newly exposed rows/columns can start loading mid-drag.
                self.settle_view(now);
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.drag_active = false;
            self.settle_view(now);
        }
    }

    pub(crate) fn handle_keyboard(&mut self, ctx: &egui::Context, now: Instant) {
        // Suppress single-letter shortcuts while a text widget has focus.
        let text_editing = ctx.memory(|m| m.focused().is_some());

        ctx.input(|input| {
            // Arrow keys: pan by a fixed viewport fraction.
            if input.key_pressed(egui::Key::ArrowLeft) {
                self.pan_by_fraction(-PAN_FRACTION, 0.0, now);
            }
            if input.key_pressed(egui::Key::ArrowRight) {
                self.pan_by_fraction(PAN_FRACTION, 0.0, now);
            }
            if input.key_pressed(egui::Key::ArrowUp) {
                self.pan_by_fraction(0.0, PAN_FRACTION, now);
            }
            if input.key_pressed(egui::Key::ArrowDown) {
                self.pan_by_fraction(0.0, -PAN_FRACTION, now);
            }

            // +/- : zoom about the canvas centre.
            if input.key_pressed(egui::Key::Plus) || input.key_pressed(egui::Key::Equals) {
                self.zoom_center(WHEEL_STEP * WHEEL_STEP, now);
            }
            if input.key_pressed(egui::Key::Minus) {
                self.zoom_center(1.0 / (WHEEL_STEP * WHEEL_STEP), now);
            }

            if text_editing {
                return;
            }

            if input.key_pressed(egui::Key::R) {
                self.reset_view(now);
            }
            if input.key_pressed(egui::Key::H) {
                self.show_hud = !self.show_hud;
            }
            if input.key_pressed(egui::Key::C) {
                self.show_controls = !self.show_controls;
            }
        });

        if text_editing {
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Backspace) && !i.modifiers.shift) {
            self.go_back(now);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Backspace) && i.modifiers.shift) {
            self.go_forward(now);
        }
    }

    // -- Navigation helpers ----------------------------------------------------

    fn pan_by_fraction(&mut self, fx: f64, fy: f64, now: Instant) {
        self.push_history();
        // A positive fx moves the view right: content slides left.
        self.viewport.pan_by_pixels(
            -fx * self.viewport.width as f64,
            fy * self.viewport.height as f64,
        );
        self.settle_view(now);
    }

    fn zoom_center(&mut self, factor: f64, now: Instant) {
        self.push_history();
        let (cx, cy) = (
            self.viewport.width as f64 / 2.0,
            self.viewport.height as f64 / 2.0,
        );
        self.viewport.zoom_about_cursor(cx, cy, factor);
        self.settle_view(now);
    }
}
