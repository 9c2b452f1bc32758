use anyhow::Context;
use log::*;

use devwatch_core::config::default_watch_list;
use devwatch_core::LogSink;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<(), anyhow::Error> {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    info!("Starting devwatch {} ({})", VERSION, std::env::consts::OS);

    let watch_list = default_watch_list()
        .context("Invalid compiled-in watch-list")?;
    for id in watch_list.entries() {
        debug!("Watching {}", id);
    }

    if !devwatch_usb::watch_supported() {
        warn!("Device change notifications are not supported on this platform");
    }
    devwatch_usb::watch_start(watch_list, LogSink)
}
