/*
 *  display/traits.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Seams of the display subsystem: frame sinks and screens
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

use crate::display::error::DisplayError;
use crate::display::ScreenMode;
use crate::weather::ForecastData;

/// One composed screen: a header line and body lines
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub title: String,
    pub lines: Vec<String>,
}

impl Frame {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), lines: Vec::new() }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

/// Everything a screen may look at while composing
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub now: DateTime<Local>,
    /// Latest forecast, None until the first successful fetch
    pub forecast: Option<&'a ForecastData>,
    /// Unix time of the last successful fetch, 0 when never fetched
    pub last_refresh: i64,
}

/// Output device abstraction - all frame outputs must implement this trait
pub trait FrameSink: Send {
    /// Show a composed frame, replacing whatever was shown before
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Blank the output
    fn clear(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}

/// A screen that can be shown for one mode
///
/// Screens are resolved once at startup into the `ScreenTable`; composing
/// must not fail, missing data is rendered as such.
pub trait Screen: Send {
    fn mode(&self) -> ScreenMode;

    fn compose(&self, ctx: &RenderContext<'_>) -> Frame;
}
