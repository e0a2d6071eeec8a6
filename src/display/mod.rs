/*
 *  display/mod.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Display subsystem - screen modes, rotation scheduling and rendering
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

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod traits;
pub mod error;
pub mod sink;
pub mod manager;
pub mod components;

// Screen rotation state machine
pub mod scheduler;

// Re-exports for convenience
pub use traits::{Frame, FrameSink, RenderContext, Screen};
pub use error::DisplayError;
pub use sink::{ConsoleSink, MockSink};
pub use manager::{DisplayManager, ScreenTable};
pub use scheduler::{PlanError, PluginSlot, RotationPlan, SchedulerConfig, ScreenScheduler};

/// Rotating screen types, in the order they are usually configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Daily,     // Daily forecast
    Hourly,    // Hourly forecast
    Rss,       // RSS headlines
    Speedtest, // Last speedtest result
}

impl PluginKind {
    pub fn name(&self) -> &'static str {
        match self {
            PluginKind::Daily => "daily",
            PluginKind::Hourly => "hourly",
            PluginKind::Rss => "rss",
            PluginKind::Speedtest => "speedtest",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Screen mode - controls what content is shown on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenMode {
    Plugin(PluginKind), // one of the rotating plugin screens
    Info,               // sunrise/sunset and status screen
}

impl fmt::Display for ScreenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenMode::Plugin(kind) => write!(f, "{}", kind),
            ScreenMode::Info => f.write_str("info"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names_match_config_names() {
        assert_eq!(ScreenMode::Plugin(PluginKind::Speedtest).to_string(), "speedtest");
        assert_eq!(ScreenMode::Info.to_string(), "info");
        let kind: PluginKind = serde_yaml::from_str("hourly").unwrap();
        assert_eq!(ScreenMode::Plugin(kind).to_string(), "hourly");
    }
}
