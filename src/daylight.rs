/*
 *  daylight.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Daylight figures for the info screen, taken from the forecast's
 *	sunrise/sunset rather than calculated locally
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

use crate::weather::DailyForecast;

/// Which day a sun event belongs to, relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Tonight,
    Tomorrow,
}

impl DayLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayLabel::Today => "today",
            DayLabel::Tonight => "tonight",
            DayLabel::Tomorrow => "tomorrow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunEvent {
    pub at: i64,
    pub label: DayLabel,
}

/// Daylight state at a moment, all times in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Daylight {
    pub is_daytime: bool,
    pub day_hours: i64,
    pub day_minutes: i64,
    /// 0 during the day
    pub secs_until_daylight: i64,
    /// 0 during the night
    pub secs_until_dark: i64,
    pub sunrise: SunEvent,
    pub sunset: SunEvent,
}

impl Daylight {
    /// Work out daylight from today's (and, after dark, tomorrow's) sun times.
    /// None when the forecast has no daily entries.
    pub fn from_forecast(daily: &[DailyForecast], now: i64) -> Option<Self> {
        let today = daily.first()?;
        let tomorrow = daily.get(1);

        let day_secs = (today.sunset - today.sunrise).max(0);
        let day_hours = day_secs / 3600;
        let day_minutes = (day_secs % 3600) / 60;

        let is_daytime = now > today.sunrise && now < today.sunset;
        let (secs_until_daylight, secs_until_dark) = if is_daytime {
            (0, today.sunset - now)
        } else if now >= today.sunset {
            // evening, next daybreak is tomorrow's sunrise
            let next = tomorrow.map_or(today.sunrise + 86_400, |d| d.sunrise);
            ((next - now).max(0), 0)
        } else {
            (today.sunrise - now, 0)
        };

        // before sunset show today's pair, after sunset tomorrow's
        let (sunrise, sunset) = match tomorrow {
            Some(next) if now >= today.sunset => (
                SunEvent { at: next.sunrise, label: DayLabel::Tomorrow },
                SunEvent { at: next.sunset, label: DayLabel::Tomorrow },
            ),
            _ => (
                SunEvent { at: today.sunrise, label: DayLabel::Today },
                SunEvent { at: today.sunset, label: DayLabel::Tonight },
            ),
        };

        Some(Self {
            is_daytime,
            day_hours,
            day_minutes,
            secs_until_daylight,
            secs_until_dark,
            sunrise,
            sunset,
        })
    }
}

/// "H:MM" for a span of seconds
pub fn format_span(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{}:{:02}", secs / 3600, (secs % 3600) / 60)
}
