/*
 *  display/components/mod.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Screen implementations and the helpers they share
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

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};

use crate::weather::ForecastData;
use super::traits::Frame;

pub mod daily;
pub mod hourly;
pub mod info;
pub mod feed;

// Re-exports
pub use daily::DailyScreen;
pub use hourly::HourlyScreen;
pub use info::InfoScreen;
pub use feed::FeedScreen;

/// Top bar shown on every screen
pub fn header(now: &DateTime<Local>) -> String {
    now.format("%I:%M %p  %a, %b %-d").to_string()
}

/// Forecast timestamp in the forecast location's own offset
pub fn forecast_time(forecast: &ForecastData, unix: i64) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(forecast.utc_offset_seconds)
        .unwrap_or_else(|| Utc.fix());
    offset.from_utc_datetime(
        &DateTime::<Utc>::from_timestamp(unix, 0).unwrap_or_default().naive_utc(),
    )
}

/// Frame for a screen that has nothing to show yet
pub fn no_data_frame(now: &DateTime<Local>, what: &str) -> Frame {
    let mut frame = Frame::new(header(now));
    frame.push(format!("{}: no data", what));
    frame
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::weather::{
        describe_weather_code, CurrentConditions, DailyForecast, ForecastData, HourlyForecast, Units,
    };

    // 2024-05-01 00:00 UTC
    pub const DAY0: i64 = 1_714_521_600;

    pub fn forecast() -> ForecastData {
        ForecastData {
            latitude: 51.5,
            longitude: -0.12,
            timezone: "GMT".to_string(),
            utc_offset_seconds: 0,
            units: Units::Metric,
            current: CurrentConditions {
                time: DAY0 + 12 * 3600,
                temperature: 14.2,
                wind_speed: 11.0,
                wind_direction: "SW",
                condition: describe_weather_code(2),
            },
            hourly: (12..16)
                .map(|h| HourlyForecast {
                    time: DAY0 + h * 3600,
                    temperature: h as f64,
                    apparent_temperature: h as f64 - 1.0,
                    humidity: 70.0,
                    precipitation_probability: 10.0,
                    condition: describe_weather_code(61),
                })
                .collect(),
            daily: (0..3)
                .map(|d| DailyForecast {
                    date: DAY0 + d * 86_400,
                    temperature_max: 18.0 + d as f64,
                    temperature_min: 8.0,
                    precipitation_probability: 40.0,
                    sunrise: DAY0 + d * 86_400 + 5 * 3600 + 30 * 60,
                    sunset: DAY0 + d * 86_400 + 20 * 3600 + 15 * 60,
                    condition: describe_weather_code(3),
                })
                .collect(),
        }
    }
}
