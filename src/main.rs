mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::AirQualityApp;
use config::AppConfig;
use data::registry::ModelRegistry;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        log::error!("Falling back to default configuration: {e:#}");
        AppConfig::default()
    });
    let registry = config.registry().unwrap_or_else(|e| {
        log::error!("Falling back to default models: {e:#}");
        ModelRegistry::with_defaults(&config.artifacts_dir)
    });
    if registry.is_empty() {
        log::warn!("No models registered, predictions will be empty");
    }
    log::info!(
        "Registered models: {:?}",
        registry.names().collect::<Vec<_>>()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let state = AppState::new(config, registry);
    eframe::run_native(
        "Air Quality – Smart Prediction",
        options,
        Box::new(|_cc| Ok(Box::new(AirQualityApp::new(state)))),
    )
}
