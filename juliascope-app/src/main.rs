mod app;
mod canvas;
mod hud;
mod input;

use eframe::egui;
use tracing::info;

use app::JuliaScopeApp;

/// Renderer endpoint used when neither the CLI argument nor the
/// environment provides one.
const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8700/ws";

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let endpoint = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("JULIASCOPE_ENDPOINT").ok())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    info!(%endpoint, "Starting JuliaScope");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("JuliaScope")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "JuliaScope",
        options,
        Box::new(move |cc| Ok(Box::new(JuliaScopeApp::new(&cc.egui_ctx, endpoint)))),
    )
}
