/*
 *  display/manager.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Screen dispatch table and the manager that renders the active mode
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

use chrono::{DateTime, Local};
use log::{debug, info};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::{Config, DisplayConfig};
use crate::display::components::{DailyScreen, FeedScreen, HourlyScreen, InfoScreen};
use crate::display::error::DisplayError;
use crate::display::sink::ConsoleSink;
use crate::display::traits::{Frame, FrameSink, RenderContext, Screen};
use crate::display::{PluginKind, ScreenMode};

const FEED_ITEMS: usize = 6;

/// Mode to screen dispatch, built once at startup
pub struct ScreenTable {
    screens: HashMap<ScreenMode, Box<dyn Screen>>,
}

impl ScreenTable {
    pub fn new() -> Self {
        Self { screens: HashMap::new() }
    }

    /// Screens for every enabled plugin plus the info screen
    pub fn from_config(config: &Config) -> Self {
        let mut table = Self::new();
        table.insert(Box::new(InfoScreen));
        for plugin in config.plugins.iter().filter(|p| p.enabled) {
            let screen: Box<dyn Screen> = match plugin.name {
                PluginKind::Daily => Box::new(DailyScreen::new(usize::from(config.weather.forecast_days))),
                PluginKind::Hourly => Box::new(HourlyScreen::new(config.weather.hourly_slots)),
                PluginKind::Rss | PluginKind::Speedtest => {
                    Box::new(FeedScreen::new(plugin.name, plugin.source.clone(), FEED_ITEMS))
                }
            };
            table.insert(screen);
        }
        info!("Screen table: {} screen(s)", table.len());
        table
    }

    pub fn insert(&mut self, screen: Box<dyn Screen>) {
        self.screens.insert(screen.mode(), screen);
    }

    pub fn get(&self, mode: ScreenMode) -> Option<&dyn Screen> {
        self.screens.get(&mode).map(|s| s.as_ref())
    }

    fn len(&self) -> usize {
        self.screens.len()
    }
}

impl Default for ScreenTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the active mode to the sink
pub struct DisplayManager {
    table: ScreenTable,
    sink: Box<dyn FrameSink>,
    /// what is on the output now, for screen captures
    last_frame: Option<Frame>,
}

impl DisplayManager {
    pub fn new(table: ScreenTable, sink: Box<dyn FrameSink>) -> Self {
        Self { table, sink, last_frame: None }
    }

    pub fn render(&mut self, mode: ScreenMode, ctx: &RenderContext<'_>) -> Result<(), DisplayError> {
        let screen = self.table.get(mode).ok_or(DisplayError::MissingScreen(mode))?;
        let frame = screen.compose(ctx);
        self.sink.present(&frame)?;
        debug!("Rendered {} ({} lines)", mode, frame.lines.len());
        self.last_frame = Some(frame);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), DisplayError> {
        self.last_frame = None;
        self.sink.clear()
    }

    /// Write the frame on screen to a timestamped text file in `dir`
    pub fn save_screenshot(
        &self,
        dir: &Path,
        width: usize,
        now: DateTime<Local>,
    ) -> Result<PathBuf, DisplayError> {
        let frame = self.last_frame.as_ref()
            .ok_or_else(|| DisplayError::Other("nothing on screen to capture".to_string()))?;
        let path = dir.join(format!("screenshot-{}.txt", now.format("%Y%m%d-%H%M%S")));
        let config = DisplayConfig { clear_screen: false, width, screenshot_dir: dir.to_path_buf() };
        let mut capture = ConsoleSink::new(BufWriter::new(File::create(&path)?), &config);
        capture.present(frame)?;
        Ok(path)
    }
}
