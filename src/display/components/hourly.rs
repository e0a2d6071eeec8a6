/*
 *  display/components/hourly.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Hourly forecast screen - the next few hours
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

pub struct HourlyScreen {
    slots: usize,
}

impl HourlyScreen {
    pub fn new(slots: usize) -> Self {
        Self { slots: slots.max(1) }
    }
}

impl Screen for HourlyScreen {
    fn mode(&self) -> ScreenMode {
        ScreenMode::Plugin(PluginKind::Hourly)
    }

    fn compose(&self, ctx: &RenderContext<'_>) -> Frame {
        let Some(data) = ctx.forecast else {
            return no_data_frame(&ctx.now, "Hourly forecast");
        };
        if data.hourly.is_empty() {
            return no_data_frame(&ctx.now, "Hourly forecast");
        }
        let deg = data.units.temperature_symbol();

        let mut frame = Frame::new(header(&ctx.now));
        frame.push(format!("Now {:.0}°{}  {}", data.current.temperature, deg, data.current.condition.description));
        frame.push("");
        for hour in data.hourly.iter().take(self.slots) {
            let at = forecast_time(data, hour.time);
            frame.push(format!("{}  {:>3.0}°{} feels {:.0}°  {:>3.0}%  {}",
                at.format("%I %p"), hour.temperature, deg, hour.apparent_temperature,
                hour.precipitation_probability, hour.condition.description));
        }
        frame
    }
}
