/*
 *  app.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Main loop - ticks the scheduler once a second, renders the active
 *	screen, refreshes the forecast in the background and takes key commands
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

use anyhow::anyhow;
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use std::future::Future;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::config::{Config, ConfigError};
use crate::display::{DisplayManager, FrameSink, RenderContext, ScreenScheduler, ScreenTable};
use crate::forecast_cache::ForecastCache;
use crate::input::Command;
use crate::pacer::Pacer;
use crate::weather::{FetchError, ForecastData, ForecastSource};

/// Give up when the output has failed this many frames in a row
pub const MAX_RENDER_FAILURES: u32 = 30;

/// Owns all mutable state of the running display
pub struct Driver {
    scheduler: ScreenScheduler,
    cache: ForecastCache,
    display: DisplayManager,
    forecast: Option<ForecastData>,
    retry_backoff: u64,
    fetch_in_flight: bool,
    render_failures: u32,
    screenshot_dir: PathBuf,
    screenshot_width: usize,
}

impl Driver {
    pub fn new(
        scheduler: ScreenScheduler,
        cache: ForecastCache,
        display: DisplayManager,
        retry_backoff: u64,
    ) -> Self {
        Self {
            scheduler,
            cache,
            display,
            forecast: None,
            retry_backoff,
            fetch_in_flight: false,
            render_failures: 0,
            screenshot_dir: PathBuf::from("."),
            screenshot_width: 48,
        }
    }

    /// Wire up scheduler, cache and screens from a validated config
    pub fn from_config(config: &Config, sink: Box<dyn FrameSink>) -> Result<Self, ConfigError> {
        let scheduler = ScreenScheduler::new(config.scheduler_config(), config.rotation_plan()?);
        let display = DisplayManager::new(ScreenTable::from_config(config), sink);
        let mut driver = Self::new(scheduler, ForecastCache::new(config.update_freq), display, config.retry_backoff);
        driver.screenshot_dir = config.display.screenshot_dir.clone();
        driver.screenshot_width = config.display.width;
        Ok(driver)
    }

    pub fn scheduler(&self) -> &ScreenScheduler {
        &self.scheduler
    }

    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    pub fn forecast(&self) -> Option<&ForecastData> {
        self.forecast.as_ref()
    }

    pub fn render_failures(&self) -> u32 {
        self.render_failures
    }

    /// One wall-clock second: advance the scheduler and redraw.
    /// Returns true when a forecast fetch should be started.
    pub fn tick(&mut self, now: DateTime<Local>) -> bool {
        if self.scheduler.on_tick() {
            debug!("Mode now {}", self.scheduler.current_mode());
        }
        self.render(now);
        self.fetch_due(now.timestamp())
    }

    pub fn fetch_due(&self, now_unix: i64) -> bool {
        !self.fetch_in_flight && self.cache.is_stale(now_unix)
    }

    pub fn begin_fetch(&mut self) {
        self.fetch_in_flight = true;
    }

    /// Take the outcome of a background fetch
    pub fn apply_fetch(&mut self, result: Result<ForecastData, FetchError>, now: DateTime<Local>) {
        self.fetch_in_flight = false;
        let now_unix = now.timestamp();
        match result {
            Ok(data) => {
                info!("Forecast updated: {:.1}°{} {}, {} day(s)",
                    data.current.temperature, data.units.temperature_symbol(),
                    data.current.condition.description, data.daily.len());
                self.forecast = Some(data);
                self.cache.mark_refreshed(now_unix);
                self.render(now);
            }
            Err(e) => {
                if self.cache.last_refresh_unix() == 0 {
                    warn!("Forecast fetch failed: {}. No data yet, retrying", e);
                } else {
                    warn!("Forecast fetch failed: {}. Retrying in {}s", e, self.retry_backoff);
                }
                self.cache.mark_failed_retry_later(now_unix, self.retry_backoff);
            }
        }
    }

    pub fn handle_command(&mut self, cmd: Command, now: DateTime<Local>) -> ControlFlow<()> {
        match cmd {
            Command::Show(mode) => {
                if self.scheduler.on_manual_switch(mode) {
                    self.render(now);
                } else {
                    info!("{} screen is not enabled", mode);
                }
                ControlFlow::Continue(())
            }
            Command::Screenshot => {
                match self.display.save_screenshot(&self.screenshot_dir, self.screenshot_width, now) {
                    Ok(path) => info!("Screen capture complete: {}", path.display()),
                    Err(e) => warn!("Screen capture failed: {}", e),
                }
                ControlFlow::Continue(())
            }
            Command::Quit => {
                info!("Quit requested from keyboard");
                ControlFlow::Break(())
            }
        }
    }

    /// Blank the output on the way out
    pub fn shutdown(&mut self) {
        if let Err(e) = self.display.clear() {
            warn!("Clearing the display failed: {}", e);
        }
    }

    fn render(&mut self, now: DateTime<Local>) {
        let ctx = RenderContext {
            now,
            forecast: self.forecast.as_ref(),
            last_refresh: self.cache.last_refresh_unix(),
        };
        match self.display.render(self.scheduler.current_mode(), &ctx) {
            Ok(()) => self.render_failures = 0,
            Err(e) => {
                self.render_failures += 1;
                error!("Render of {} failed: {}", self.scheduler.current_mode(), e);
            }
        }
    }
}

/// Loop timing
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub poll_hz: u32,
    pub fetch_timeout: Duration,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_hz: config.poll_hz,
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
        }
    }
}

fn spawn_fetch(
    source: Arc<dyn ForecastSource>,
    timeout: Duration,
    tx: mpsc::Sender<Result<ForecastData, FetchError>>,
) {
    tokio::spawn(async move {
        let result = match tokio::time::timeout(timeout, source.fetch_forecast()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout)),
        };
        if tx.send(result).await.is_err() {
            debug!("Driver stopped before the fetch finished");
        }
    });
}

/// Run until `q` is pressed, `shutdown` resolves or the output keeps failing.
/// Fetches never block the loop, ticks keep coming while one is in flight.
/// The display is cleared on every way out.
pub async fn run(
    mut driver: Driver,
    source: Arc<dyn ForecastSource>,
    settings: RunSettings,
    mut commands: mpsc::Receiver<Command>,
    shutdown: impl Future<Output = anyhow::Result<()>>,
) -> anyhow::Result<()> {
    let (fetch_tx, mut fetch_rx) = mpsc::channel(1);
    let mut pacer = Pacer::new(settings.poll_hz);
    let mut interval = tokio::time::interval(pacer.frame());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut input_open = true;
    tokio::pin!(shutdown);
    let mut outcome = Ok(());

    info!("Entering main display loop");
    loop {
        tokio::select! {
            res = &mut shutdown => {
                outcome = res;
                break;
            }
            _ = interval.tick() => {
                let now = Local::now();
                if !pacer.should_tick(now.timestamp()) {
                    continue;
                }
                if driver.tick(now) {
                    debug!("Forecast stale, fetching");
                    driver.begin_fetch();
                    spawn_fetch(source.clone(), settings.fetch_timeout, fetch_tx.clone());
                }
                if driver.render_failures() >= MAX_RENDER_FAILURES {
                    outcome = Err(anyhow!("display output failed {} times in a row", driver.render_failures()));
                    break;
                }
            }
            Some(result) = fetch_rx.recv() => {
                driver.apply_fetch(result, Local::now());
            }
            cmd = commands.recv(), if input_open => {
                match cmd {
                    Some(cmd) => {
                        if driver.handle_command(cmd, Local::now()).is_break() {
                            break;
                        }
                    }
                    None => {
                        debug!("Command channel closed, running without keyboard");
                        input_open = false;
                    }
                }
            }
        }
    }
    driver.shutdown();
    info!("Display loop finished");
    outcome
}
