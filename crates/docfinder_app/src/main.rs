mod app;
mod commands;
mod config;
mod effects;
mod persistence;
mod render;

use docfinder_logging::{parse_level, DEFAULT_LOG_FILE};

use crate::config::ClientConfig;

fn main() -> anyhow::Result<()> {
    let config = ClientConfig::load()?;
    docfinder_logging::initialize(
        config.log_destination,
        parse_level(&config.log_level),
        Some(&config.state_dir.join(DEFAULT_LOG_FILE)),
    );
    if std::env::args().any(|arg| arg == "--help" || arg == "-h") {
        app::print_help();
        return Ok(());
    }
    app::run(config)
}
