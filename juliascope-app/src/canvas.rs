use std::time::Instant;

use eframe::egui;

use juliascope_core::{tile_plane_origin, TILE_SIZE};

use crate::app::JuliaScopeApp;

impl JuliaScopeApp {
    /// The fractal canvas: input handling plus tile compositing.
    pub(crate) fn show_canvas(&mut self, ctx: &egui::Context, now: Instant) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

                self.check_resize(rect.width() as u32, rect.height() as u32, now);
                self.handle_canvas_input(ctx, &response, now);
                self.draw_tiles(ui, rect);
            });
    }

    /// Composite cached tiles onto the canvas, coarsest LOD first so finer
    /// tiles at the same location paint over the placeholders.
    ///
    /// Pure consumption of the cache — called every frame during drags
    /// without triggering any fetches. Each tile is placed by mapping its
    /// plane origin through the viewport transform and adding the live
    /// sub-tile pan offset; the payload may be lower resolution than the
    /// tile's screen footprint (coarse LODs) and is scaled up by the draw.
    fn draw_tiles(&self, ui: &egui::Ui, rect: egui::Rect) {
        let painter = ui.painter_at(rect);
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        // Full-frame mode delivers one canvas-sized buffer; it goes
        // underneath so any tiles refine on top of it.
        if let Some(frame) = &self.frame_texture {
            painter.image(frame.id(), rect, uv, egui::Color32::WHITE);
        }

        let tile_side = TILE_SIZE as f32;
        for tile in self.cache.ordered_by_lod() {
            let Some(texture) = self.textures.get(&tile.key) else {
                continue;
            };
            let origin = tile_plane_origin(&tile.key, self.viewport.zoom, TILE_SIZE);
            let (px, py) = self.viewport.plane_to_pixel(origin);
            let min = rect.min
                + egui::vec2(px as f32 + self.pan_offset.x, py as f32 + self.pan_offset.y);
            let tile_rect = egui::Rect::from_min_size(min, egui::vec2(tile_side, tile_side));
            if tile_rect.intersects(rect) {
                painter.image(texture.id(), tile_rect, uv, egui::Color32::WHITE);
            }
        }
    }
}
