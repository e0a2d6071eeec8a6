use log::{debug, warn};
use std::io::BufRead;
use tokio::sync::mpsc;

use crate::display::{PluginKind, ScreenMode};

/// User request from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Show(ScreenMode),
    /// save the frame on screen to a file
    Screenshot,
    Quit,
}

/// Map a key to a command, None for keys we do not use
pub fn parse_key(key: char) -> Option<Command> {
    match key.to_ascii_lowercase() {
        'd' => Some(Command::Show(ScreenMode::Plugin(PluginKind::Daily))),
        'h' => Some(Command::Show(ScreenMode::Plugin(PluginKind::Hourly))),
        'r' => Some(Command::Show(ScreenMode::Plugin(PluginKind::Rss))),
        't' => Some(Command::Show(ScreenMode::Plugin(PluginKind::Speedtest))),
        'i' => Some(Command::Show(ScreenMode::Info)),
        's' => Some(Command::Screenshot),
        'q' => Some(Command::Quit),
        _ => None,
    }
}

/// Commands in one line of input, in typed order
pub fn parse_line(line: &str) -> impl Iterator<Item = Command> + '_ {
    line.chars().filter(|c| !c.is_whitespace()).filter_map(parse_key)
}

/// Read stdin line by line on a plain thread and forward commands.
///
/// A blocking thread rather than tokio's stdin so a pending read never
/// holds up runtime shutdown.
pub fn spawn_keyboard_reader(tx: mpsc::Sender<Command>) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("keyboard".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!("Keyboard input error: {}", e);
                        break;
                    }
                };
                for cmd in parse_line(&line) {
                    debug!("Key command: {:?}", cmd);
                    if tx.blocking_send(cmd).is_err() {
                        return; // driver gone
                    }
                }
            }
            debug!("Keyboard input closed");
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(parse_key('H'), Some(Command::Show(ScreenMode::Plugin(PluginKind::Hourly))));
        assert_eq!(parse_key('i'), Some(Command::Show(ScreenMode::Info)));
        assert_eq!(parse_key('S'), Some(Command::Screenshot));
        assert_eq!(parse_key('q'), Some(Command::Quit));
        assert_eq!(parse_key('x'), None);
    }

    #[test]
    fn test_line_keeps_order() {
        let cmds: Vec<Command> = parse_line(" d x i\n").collect();
        assert_eq!(cmds, vec![
            Command::Show(ScreenMode::Plugin(PluginKind::Daily)),
            Command::Show(ScreenMode::Info),
        ]);
    }
}
