/*
 *  pacer.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Main loop pacing - poll several times a second, tick once a second
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
use std::time::Duration;

pub struct Pacer {
    last_second: Option<i64>,
    frame: Duration,
}

// polling faster than 1Hz keeps key presses responsive,
// the scheduler still only sees one tick per wall-clock second
impl Pacer {
    pub fn new(poll_hz: u32) -> Self {
        let frame = Duration::from_micros((1_000_000u32 / poll_hz.max(1)) as u64);
        Self { last_second: None, frame }
    }

    #[inline]
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Returns true once per distinct wall-clock second.
    #[inline]
    pub fn should_tick(&mut self, now_unix: i64) -> bool {
        if self.last_second == Some(now_unix) {
            false
        } else {
            self.last_second = Some(now_unix);
            true
        }
    }
}
