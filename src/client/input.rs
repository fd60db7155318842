//! Direction changes to send to the server

use crate::ws::protocol::Direction;

/// Remembers the last direction sent so unchanged input is not resent
#[derive(Debug, Default)]
pub struct InputTracker {
    last_sent: Option<Direction>,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the direction to send, or `None` when nothing changed
    pub fn update(&mut self, direction: Direction) -> Option<Direction> {
        if self.last_sent == Some(direction) {
            return None;
        }
        self.last_sent = Some(direction);
        Some(direction)
    }
}

/// Parse one line of typed input into a direction
pub fn parse_direction(line: &str) -> Option<Direction> {
    match line.trim().to_ascii_lowercase().as_str() {
        "up" | "w" => Some(Direction::Up),
        "down" | "s" => Some(Direction::Down),
        "left" | "a" => Some(Direction::Left),
        "right" | "d" => Some(Direction::Right),
        "stop" | "x" | "" => Some(Direction::Stop),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sends_only_changes() {
        let mut tracker = InputTracker::new();
        assert_eq!(tracker.update(Direction::Stop), Some(Direction::Stop));
        assert_eq!(tracker.update(Direction::Stop), None);
        assert_eq!(tracker.update(Direction::Up), Some(Direction::Up));
        assert_eq!(tracker.update(Direction::Up), None);

        assert_eq!(tracker.update(Direction::Stop), Some(Direction::Stop));
    }

    #[test]
    fn parses_words_and_keys() {
        assert_eq!(parse_direction("up"), Some(Direction::Up));
        assert_eq!(parse_direction(" D \n"), Some(Direction::Right));
        assert_eq!(parse_direction("a"), Some(Direction::Left));
        assert_eq!(parse_direction(""), Some(Direction::Stop));
        assert_eq!(parse_direction("jump"), None);
    }
}
