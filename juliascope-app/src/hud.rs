use std::time::Instant;

use eframe::egui;

use juliascope_stream::ConnState;

use crate::app::{JuliaScopeApp, COLORING_NAMES};

/// HUD box margin and corner radius, shared by all panels.
const HUD_MARGIN: f32 = 8.0;
const HUD_CORNER_RADIUS: f32 = 6.0;

impl JuliaScopeApp {
    pub(crate) fn show_hud(&mut self, ctx: &egui::Context) {
        if !self.show_hud {
            return;
        }

        egui::Area::new(egui::Id::new("hud_view"))
            .anchor(egui::Align2::LEFT_TOP, [HUD_MARGIN, HUD_MARGIN])
            .show(ctx, |ui| {
                egui::Frame::NONE
                    .fill(egui::Color32::from_black_alpha(160))
                    .inner_margin(egui::Margin::same(8))
                    .corner_radius(HUD_CORNER_RADIUS)
                    .show(ui, |ui| {
                        ui.style_mut().visuals.override_text_color =
                            Some(egui::Color32::from_rgb(220, 220, 220));

                        ui.label(format!(
                            "Center: {:.10} {:+.10}i",
                            self.viewport.center.re, self.viewport.center.im
                        ));
                        ui.label(format!("Zoom: {:.2e} px/unit", self.viewport.zoom));
                        ui.label(format!(
                            "c: {:.6} {:+.6}i",
                            self.params.c.re, self.params.c.im
                        ));
                        ui.label(format!("Iterations: {}", self.params.max_iterations));
                        if let Some(cursor) = self.cursor_plane {
                            ui.label(format!("Cursor: {:.6} {:+.6}i", cursor.re, cursor.im));
                        }

                        let (color, label) = match self.conn_state {
                            ConnState::Connected => {
                                (egui::Color32::from_rgb(80, 220, 80), "Connected")
                            }
                            ConnState::Connecting => {
                                (egui::Color32::from_rgb(240, 200, 60), "Connecting\u{2026}")
                            }
                            ConnState::Disconnected => {
                                (egui::Color32::from_rgb(240, 90, 70), "Disconnected")
                            }
                        };
                        ui.colored_label(color, label);

                        ui.label(format!(
                            "Tiles: {} cached, {} in flight, {} received",
                            self.cache.len(),
                            self.scheduler.in_flight(),
                            self.tiles_received
                        ));
                    });
            });
    }

    /// Parameter controls. Any edit fires the slow settle class and wipes
    /// the cache — every previously rendered pixel is stale.
    pub(crate) fn show_controls_panel(&mut self, ctx: &egui::Context, now: Instant) {
        let before = self.params;

        egui::SidePanel::right("controls")
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Parameters");
                ui.separator();

                ui.label("Julia constant");
                ui.add(
                    egui::Slider::new(&mut self.params.c.re, -2.0..=2.0)
                        .text("re")
                        .fixed_decimals(4),
                );
                ui.add(
                    egui::Slider::new(&mut self.params.c.im, -2.0..=2.0)
                        .text("im")
                        .fixed_decimals(4),
                );

                ui.separator();
                ui.label("Max iterations");
                ui.add(
                    egui::Slider::new(&mut self.params.max_iterations, 16..=8192).logarithmic(true),
                );

                ui.separator();
                ui.label("Coloring");
                egui::ComboBox::from_id_salt("coloring")
                    .selected_text(
                        COLORING_NAMES
                            .get(self.params.coloring as usize)
                            .copied()
                            .unwrap_or("?"),
                    )
                    .show_ui(ui, |ui| {
                        for (i, name) in COLORING_NAMES.iter().enumerate() {
                            ui.selectable_value(&mut self.params.coloring, i as u32, *name);
                        }
                    });

                ui.separator();
                ui.label("Detail");
                egui::ComboBox::from_id_salt("detail")
                    .selected_text(format!("1/{}", self.params.lod))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.params.lod, 1, "Full");
                        ui.selectable_value(&mut self.params.lod, 2, "Half");
                    });
            });

        if self.params != before {
            self.on_params_changed(now);
        }
    }
}
