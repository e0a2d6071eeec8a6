/*
 *  display/sink.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Frame outputs - a boxed text console and a recording mock
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

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::traits::{Frame, FrameSink};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Draws frames as a box of text
pub struct ConsoleSink<W: Write + Send> {
    out: W,
    width: usize,
    clear_screen: bool,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout(config: &DisplayConfig) -> Self {
        Self::new(io::stdout(), config)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W, config: &DisplayConfig) -> Self {
        Self {
            out,
            width: config.width,
            clear_screen: config.clear_screen,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn boxed_line(&self, text: &str) -> String {
        let inner = self.width.saturating_sub(4);
        let mut clipped: String = text.chars().take(inner).collect();
        let pad = inner - clipped.chars().count();
        clipped.extend(std::iter::repeat_n(' ', pad));
        format!("| {} |", clipped)
    }
}

impl<W: Write + Send> FrameSink for ConsoleSink<W> {
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let rule = format!("+{}+", "-".repeat(self.width.saturating_sub(2)));
        let mut text = String::new();
        if self.clear_screen {
            text.push_str(CLEAR_SCREEN);
        }
        text.push_str(&rule);
        text.push('\n');
        text.push_str(&self.boxed_line(&frame.title));
        text.push('\n');
        text.push_str(&rule);
        text.push('\n');
        for line in &frame.lines {
            text.push_str(&self.boxed_line(line));
            text.push('\n');
        }
        text.push_str(&rule);
        text.push('\n');

        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Internal state for the mock sink (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockSinkState {
    /// Every frame presented, oldest first
    pub frames: Vec<Frame>,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Simulate failures (for error testing)
    pub simulate_failure: bool,
}

/// Recording sink for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    state: Arc<Mutex<MockSinkState>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the shared state, clones see the same frames
    pub fn state(&self) -> MutexGuard<'_, MockSinkState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.state().frames.clone()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.state().frames.last().cloned()
    }
}

impl FrameSink for MockSink {
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let mut state = self.state();
        if state.simulate_failure {
            return Err(DisplayError::Other("simulated present failure".to_string()));
        }
        state.frames.push(frame.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.state().clear_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        let mut f = Frame::new("12:00  Wed May 1");
        f.push("Today   15/7  Slight rain");
        f.push("a line that is far too long to fit inside the narrow box at all");
        f
    }

    #[test]
    fn test_console_sink_draws_box() {
        let config = DisplayConfig { clear_screen: false, width: 30, ..DisplayConfig::default() };
        let mut sink = ConsoleSink::new(Vec::new(), &config);
        sink.present(&frame()).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().all(|l| l.chars().count() == 30));
        assert_eq!(lines[0], format!("+{}+", "-".repeat(28)));
        assert!(lines[1].starts_with("| 12:00"));
    }

    #[test]
    fn test_console_sink_clears_when_asked() {
        let config = DisplayConfig { clear_screen: true, width: 30, ..DisplayConfig::default() };
        let mut sink = ConsoleSink::new(Vec::new(), &config);
        sink.present(&frame()).unwrap();
        assert!(String::from_utf8(sink.into_inner()).unwrap().starts_with(CLEAR_SCREEN));
    }

    #[test]
    fn test_mock_sink_records_frames() {
        let sink = MockSink::new();
        let mut boxed: Box<dyn FrameSink> = Box::new(sink.clone());
        boxed.present(&frame()).unwrap();
        boxed.clear().unwrap();

        assert_eq!(sink.frames().len(), 1);
        assert_eq!(sink.state().clear_count, 1);

        sink.state().simulate_failure = true;
        assert!(boxed.present(&frame()).is_err());
    }
}
