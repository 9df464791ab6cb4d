mod api;
mod app;
mod config;
mod console_log;
mod controller;
mod dom;
mod labels;
mod surface;

use config::MapConfig;

fn main() {
    console_error_panic_hook::set_once();

    let (config, config_error) = match MapConfig::from_window() {
        Ok(config) => (config, None),
        Err(e) => (MapConfig::default(), Some(e)),
    };
    console_log::init(&config.log_filter);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "using default map settings");
    }

    app::start(config);
}
