/*
 *  main.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use anyhow::Context;
use env_logger::Env;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind}; // Import specific Unix signals

use piweatherrock::app::{self, Driver, RunSettings};
use piweatherrock::config;
use piweatherrock::display::ConsoleSink;
use piweatherrock::input;
use piweatherrock::weather::{ForecastSource, OpenMeteoClient};
use piweatherrock::BUILD_DATE;

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
/// Once a signal is caught it logs the event and returns,
/// allowing for graceful shutdown.
#[cfg(unix)]
async fn signal_handler() -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn signal_handler() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received. Initiating graceful shutdown.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("piweatherrock: {}", e);
            std::process::exit(2);
        }
    };

    // Initialize the logger, RUST_LOG still wins when set
    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("{} - weather at a glance", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let (latitude, longitude) = cfg.weather.coordinates()
        .context("weather.latitude/longitude missing from the config")?;
    info!("Forecast location: {:.4}, {:.4}", latitude, longitude);

    let source: Arc<dyn ForecastSource> = Arc::new(
        OpenMeteoClient::new(&cfg.weather, latitude, longitude).context("building forecast client")?,
    );

    let sink = ConsoleSink::stdout(&cfg.display);
    let driver = Driver::from_config(&cfg, Box::new(sink))?;
    info!("Rotation: {}",
        driver.scheduler().plan().slots().iter()
            .map(|s| format!("{}({}s)", s.kind, s.pause))
            .collect::<Vec<_>>()
            .join(" -> "));

    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    if let Err(e) = input::spawn_keyboard_reader(cmd_tx) {
        warn!("Keyboard control unavailable: {}", e);
    }
    info!("Keys: d daily, h hourly, i info, r rss, t speedtest, s screenshot, q quit (then Enter)");

    app::run(driver, source, RunSettings::from_config(&cfg), cmd_rx, signal_handler()).await?;

    info!("Shutdown complete");
    // the keyboard thread may still be parked on stdin
    std::process::exit(0);
}
