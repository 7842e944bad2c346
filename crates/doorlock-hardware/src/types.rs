//! Value types exchanged with peripherals.

use crate::{HardwareError, Result};
use doorlock_core::{FingerprintId, constants::DISPLAY_LINES};
use std::fmt;

/// One key from the 4x4 matrix keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Star key (*).
    Star,

    /// Hash/pound key (#).
    Hash,

    /// Letter key (A-D).
    Function(char),
}

impl Key {
    /// Map a keypad character to a key.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::Key;
    ///
    /// assert_eq!(Key::from_char('7'), Some(Key::Digit(7)));
    /// assert_eq!(Key::from_char('#'), Some(Key::Hash));
    /// assert_eq!(Key::from_char('x'), None);
    /// ```
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => c.to_digit(10).map(|d| Key::Digit(d as u8)),
            '*' => Some(Key::Star),
            '#' => Some(Key::Hash),
            'A'..='D' => Some(Key::Function(c)),
            'a'..='d' => Some(Key::Function(c.to_ascii_uppercase())),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Key::Digit(d) => char::from(b'0' + d),
            Key::Star => '*',
            Key::Hash => '#',
            Key::Function(c) => c,
        }
    }

    #[must_use]
    pub fn as_digit(self) -> Option<u8> {
        match self {
            Key::Digit(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Text for the four display lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    lines: [String; DISPLAY_LINES],
}

impl Screen {
    /// Build a screen from up to four lines; missing lines are blank and
    /// extra lines are dropped.
    ///
    /// ```
    /// use doorlock_hardware::Screen;
    ///
    /// let screen = Screen::from_lines(&["Wrong Pass!"]);
    /// assert_eq!(screen.line(0), "Wrong Pass!");
    /// assert_eq!(screen.line(3), "");
    /// ```
    pub fn from_lines(lines: &[&str]) -> Self {
        let mut screen = Self::default();
        for (slot, text) in screen.lines.iter_mut().zip(lines) {
            *slot = (*text).to_string();
        }
        screen
    }

    /// Single-message screen.
    pub fn message(text: &str) -> Self {
        Self::from_lines(&[text])
    }

    #[must_use]
    pub fn with_line(mut self, index: usize, text: impl Into<String>) -> Self {
        if let Some(slot) = self.lines.get_mut(index) {
            *slot = text.into();
        }
        self
    }

    /// Text of one line, empty when out of range.
    #[must_use]
    pub fn line(&self, index: usize) -> &str {
        self.lines.get(index).map(String::as_str).unwrap_or_default()
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.lines.iter().any(|line| line.contains(text))
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.lines.join(" | "))
    }
}

/// Status lamp pair state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Red lamp on, green off.
    Locked,
    /// Green lamp on, red off.
    Unlocked,
}

/// Outcome of a fingerprint search that reached the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Matched(FingerprintId),
    NoMatch,
}

impl SearchOutcome {
    /// Decode the sensor's raw search result code.
    ///
    /// Positive codes are the matched slot, zero means no match, negative
    /// codes mean the sensor failed.
    ///
    /// # Errors
    /// Returns `HardwareError::CommunicationError` for negative codes and
    /// `HardwareError::InvalidData` for slots outside 1-127.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(SearchOutcome::NoMatch),
            c if c < 0 => Err(HardwareError::communication(format!(
                "Sensor search failed with code {c}"
            ))),
            c => u16::try_from(c)
                .ok()
                .and_then(|id| FingerprintId::new(id).ok())
                .map(SearchOutcome::Matched)
                .ok_or_else(|| HardwareError::invalid_data(format!("Slot {c} out of range"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('0', Key::Digit(0))]
    #[case('9', Key::Digit(9))]
    #[case('*', Key::Star)]
    #[case('#', Key::Hash)]
    #[case('A', Key::Function('A'))]
    #[case('d', Key::Function('D'))]
    fn test_key_from_char(#[case] c: char, #[case] expected: Key) {
        assert_eq!(Key::from_char(c), Some(expected));
    }

    #[rstest]
    #[case('E')]
    #[case(' ')]
    #[case('\n')]
    fn test_key_from_char_rejects(#[case] c: char) {
        assert_eq!(Key::from_char(c), None);
    }

    #[test]
    fn test_key_char_round_trip() {
        for c in "0123456789*#ABCD".chars() {
            assert_eq!(Key::from_char(c).unwrap().as_char(), c);
        }
        assert_eq!(Key::Digit(5).as_digit(), Some(5));
        assert_eq!(Key::Hash.as_digit(), None);
    }

    #[test]
    fn test_screen_builder() {
        let screen = Screen::message("Timeout").with_line(1, "Auto exiting...");
        assert_eq!(screen.line(0), "Timeout");
        assert_eq!(screen.line(1), "Auto exiting...");
        assert_eq!(screen.line(7), "");
        assert!(screen.contains("exiting"));
    }

    #[test]
    fn test_screen_extra_lines_dropped() {
        let screen = Screen::from_lines(&["1", "2", "3", "4", "5"]);
        assert_eq!(screen.lines().len(), 4);
        assert_eq!(screen.line(3), "4");
    }

    #[rstest]
    #[case(1, Some(SearchOutcome::Matched(FingerprintId::new(1).unwrap())))]
    #[case(127, Some(SearchOutcome::Matched(FingerprintId::new(127).unwrap())))]
    #[case(0, Some(SearchOutcome::NoMatch))]
    #[case(-1, None)]
    #[case(128, None)]
    fn test_search_outcome_from_code(#[case] code: i32, #[case] expected: Option<SearchOutcome>) {
        assert_eq!(SearchOutcome::from_code(code).ok(), expected);
    }

    #[test]
    fn test_search_negative_is_communication_failure() {
        let err = SearchOutcome::from_code(-1).unwrap_err();
        assert!(err.is_communication_failure());
    }
}
