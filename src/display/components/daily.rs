/*
 *  display/components/daily.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Daily forecast screen - current conditions and the next days
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

use crate::display::{PluginKind, ScreenMode};
use crate::display::traits::{Frame, RenderContext, Screen};
use super::{forecast_time, header, no_data_frame};

/// Current conditions followed by one line per forecast day
pub struct DailyScreen {
    days: usize,
}

impl DailyScreen {
    pub fn new(days: usize) -> Self {
        Self { days: days.max(1) }
    }
}

impl Screen for DailyScreen {
    fn mode(&self) -> ScreenMode {
        ScreenMode::Plugin(PluginKind::Daily)
    }

    fn compose(&self, ctx: &RenderContext<'_>) -> Frame {
        let Some(data) = ctx.forecast else {
            return no_data_frame(&ctx.now, "Daily forecast");
        };
        let deg = data.units.temperature_symbol();

        let mut frame = Frame::new(header(&ctx.now));
        frame.push(format!("Now {:.0}°{}  {}", data.current.temperature, deg, data.current.condition.description));
        frame.push(format!("Wind {:.0} {} {}",
            data.current.wind_speed, data.units.wind_speed_label(), data.current.wind_direction));
        if let Some(today) = data.daily.first() {
            frame.push(format!("High {:.0}°  Low {:.0}°  Rain {:.0}%",
                today.temperature_max, today.temperature_min, today.precipitation_probability));
        }
        frame.push("");

        for (i, day) in data.daily.iter().take(self.days).enumerate() {
            let name = if i == 0 {
                "Today".to_string()
            } else {
                forecast_time(data, day.date).format("%a").to_string()
            };
            frame.push(format!("{:<6}{:>4.0}/{:<4.0}{:>4.0}%  {}",
                name, day.temperature_max, day.temperature_min,
                day.precipitation_probability, day.condition.description));
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::components::fixtures;
    use chrono::Local;

    #[test]
    fn test_daily_lists_days() {
        let data = fixtures::forecast();
        let ctx = RenderContext { now: Local::now(), forecast: Some(&data), last_refresh: 0 };
        let frame = DailyScreen::new(3).compose(&ctx);

        assert!(frame.lines[0].starts_with("Now 14°C"));
        assert!(frame.lines[0].ends_with("Partly cloudy"));
        assert_eq!(frame.lines[1], "Wind 11 km/h SW");
        let days: Vec<&String> = frame.lines.iter().skip(4).collect();
        assert_eq!(days.len(), 3);
        assert!(days[0].starts_with("Today"));
        // 2024-05-02 was a Thursday
        assert!(days[1].starts_with("Thu"));
        assert!(days[2].ends_with("Overcast"));
    }

    #[test]
    fn test_daily_without_forecast() {
        let ctx = RenderContext { now: Local::now(), forecast: None, last_refresh: 0 };
        let frame = DailyScreen::new(3).compose(&ctx);
        assert_eq!(frame.lines, vec!["Daily forecast: no data".to_string()]);
    }
}
