/*
 *  display/components/feed.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	RSS and speedtest screens, fed from a hand-off file written by another process
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

use log::debug;
use std::fs;
use std::path::PathBuf;

use crate::display::{PluginKind, ScreenMode};
use crate::display::traits::{Frame, RenderContext, Screen};
use super::{header, no_data_frame};

/// Shows the first lines of a text file, one item per line
pub struct FeedScreen {
    kind: PluginKind,
    source: Option<PathBuf>,
    max_items: usize,
}

impl FeedScreen {
    pub fn new(kind: PluginKind, source: Option<PathBuf>, max_items: usize) -> Self {
        Self { kind, source, max_items }
    }

    fn label(&self) -> &'static str {
        match self.kind {
            PluginKind::Rss => "Headlines",
            PluginKind::Speedtest => "Speedtest",
            PluginKind::Daily => "Daily",
            PluginKind::Hourly => "Hourly",
        }
    }

    fn read_items(&self) -> Option<Vec<String>> {
        let path = self.source.as_ref()?;
        let text = fs::read_to_string(path)
            .inspect_err(|e| debug!("{} source {} unreadable: {}", self.kind, path.display(), e))
            .ok()?;
        let items: Vec<String> = text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(self.max_items)
            .map(String::from)
            .collect();
        (!items.is_empty()).then_some(items)
    }
}

impl Screen for FeedScreen {
    fn mode(&self) -> ScreenMode {
        ScreenMode::Plugin(self.kind)
    }

    fn compose(&self, ctx: &RenderContext<'_>) -> Frame {
        let Some(items) = self.read_items() else {
            return no_data_frame(&ctx.now, self.label());
        };
        let mut frame = Frame::new(header(&ctx.now));
        frame.push(self.label());
        frame.push("");
        frame.lines.extend(items);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::io::Write;

    fn ctx() -> RenderContext<'static> {
        RenderContext { now: Local::now(), forecast: None, last_refresh: 0 }
    }

    #[test]
    fn test_feed_reads_items() {
        let path = std::env::temp_dir().join(format!("piweatherrock-feed-{}.txt", std::process::id()));
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "First headline\n\n  Second headline  \nThird\nFourth").unwrap();
        drop(f);

        let screen = FeedScreen::new(PluginKind::Rss, Some(path.clone()), 3);
        let frame = screen.compose(&ctx());
        fs::remove_file(&path).unwrap();

        assert_eq!(screen.mode(), ScreenMode::Plugin(PluginKind::Rss));
        assert_eq!(frame.lines, vec!["Headlines", "", "First headline", "Second headline", "Third"]);
    }

    #[test]
    fn test_feed_without_source_shows_no_data() {
        let frame = FeedScreen::new(PluginKind::Speedtest, None, 5).compose(&ctx());
        assert_eq!(frame.lines, vec!["Speedtest: no data".to_string()]);

        let missing = FeedScreen::new(PluginKind::Speedtest, Some(PathBuf::from("/nonexistent/speed.txt")), 5);
        assert_eq!(missing.compose(&ctx()).lines, vec!["Speedtest: no data".to_string()]);
    }
}
