/*
 *  display/components/info.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Info screen - sunrise, sunset, daylight left and the last update
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

use crate::daylight::{format_span, Daylight};
use crate::display::ScreenMode;
use crate::display::traits::{Frame, RenderContext, Screen};
use super::{forecast_time, header};

pub struct InfoScreen;

impl Screen for InfoScreen {
    fn mode(&self) -> ScreenMode {
        ScreenMode::Info
    }

    fn compose(&self, ctx: &RenderContext<'_>) -> Frame {
        let mut frame = Frame::new(header(&ctx.now));
        frame.push(format!("PiWeatherRock {} - weather by Open-Meteo", env!("CARGO_PKG_VERSION")));
        frame.push("");

        let daylight = ctx.forecast
            .and_then(|data| Daylight::from_forecast(&data.daily, ctx.now.timestamp()).map(|d| (data, d)));
        match daylight {
            Some((data, d)) => {
                frame.push(format!("Sunrise: {} {}",
                    forecast_time(data, d.sunrise.at).format("%I:%M %p"), d.sunrise.label.as_str()));
                frame.push(format!("Sunset:  {} {}",
                    forecast_time(data, d.sunset.at).format("%I:%M %p"), d.sunset.label.as_str()));
                frame.push(format!("Daylight: {} hrs {:02} min", d.day_hours, d.day_minutes));
                frame.push("");
                if d.is_daytime {
                    frame.push(format!("Sunset in {}", format_span(d.secs_until_dark)));
                } else {
                    frame.push(format!("Sunrise in {}", format_span(d.secs_until_daylight)));
                }
            }
            None => frame.push("Sunrise/sunset: no data"),
        }
        frame.push("");

        frame.push("Weather checked at");
        if ctx.last_refresh == 0 {
            frame.push("    never");
        } else {
            let checked = DateTime::from_timestamp(ctx.last_refresh, 0)
                .map(|t| t.with_timezone(&Local).format("%I:%M:%S %p on %a. %d %b %Y").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            frame.push(format!("    {}", checked));
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::components::fixtures;
    use chrono::TimeZone;

    #[test]
    fn test_info_daytime() {
        let data = fixtures::forecast();
        let now = Local.timestamp_opt(fixtures::DAY0 + 12 * 3600, 0).unwrap();
        let ctx = RenderContext { now, forecast: Some(&data), last_refresh: 0 };
        let frame = InfoScreen.compose(&ctx);

        assert!(frame.lines.contains(&"Sunrise: 05:30 AM today".to_string()));
        assert!(frame.lines.contains(&"Sunset:  08:15 PM tonight".to_string()));
        assert!(frame.lines.contains(&"Daylight: 14 hrs 45 min".to_string()));
        assert!(frame.lines.contains(&"Sunset in 8:15".to_string()));
        assert_eq!(frame.lines.last().map(String::as_str), Some("    never"));
    }

    #[test]
    fn test_info_after_sunset_shows_tomorrow() {
        let data = fixtures::forecast();
        let now = Local.timestamp_opt(fixtures::DAY0 + 22 * 3600, 0).unwrap();
        let ctx = RenderContext { now, forecast: Some(&data), last_refresh: fixtures::DAY0 };
        let frame = InfoScreen.compose(&ctx);

        assert!(frame.lines.contains(&"Sunrise: 05:30 AM tomorrow".to_string()));
        assert!(frame.lines.contains(&"Sunrise in 7:30".to_string()));
        assert!(frame.lines.last().is_some_and(|l| l.contains("2024")));
    }

    #[test]
    fn test_info_without_forecast() {
        let ctx = RenderContext { now: Local::now(), forecast: None, last_refresh: 0 };
        let frame = InfoScreen.compose(&ctx);
        assert!(frame.lines.contains(&"Sunrise/sunset: no data".to_string()));
    }
}
