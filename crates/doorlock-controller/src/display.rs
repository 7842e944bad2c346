//! Virtual 4x20 character LCD.
//!
//! [`VirtualDisplay`] implements [`DisplaySink`] without hardware: it keeps
//! a fixed-width text buffer, renders every change to the log and counts
//! buzzer pulses. The console emulator uses it in place of a real panel.
//!
//! # Character Handling
//!
//! The panel is ASCII only. Control characters are stripped, non-ASCII
//! characters are replaced with `?`, and each line is truncated to the
//! column width and padded with spaces.
//!
//! # Examples
//!
//! ```
//! use doorlock_controller::VirtualDisplay;
//!
//! let mut display = VirtualDisplay::new(4, 20);
//! display.set_line(0, "Enter Password:").unwrap();
//!
//! assert_eq!(display.get_line(0).unwrap(), "Enter Password:     ");
//! ```

use doorlock_core::constants::{DISPLAY_COLUMNS, DISPLAY_LINES};
use doorlock_hardware::{DisplaySink, HardwareError, Result, Screen};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct VirtualDisplay {
    lines: usize,
    columns: usize,
    buffer: Vec<String>,
    beeps: usize,
    beep_time: Duration,
}

impl VirtualDisplay {
    /// Blank display of the given size.
    pub fn new(lines: usize, columns: usize) -> Self {
        Self {
            lines,
            columns,
            buffer: vec![" ".repeat(columns); lines],
            beeps: 0,
            beep_time: Duration::ZERO,
        }
    }

    /// Set a line, truncated or padded to the column width.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InvalidData` if `line` is out of range.
    pub fn set_line(&mut self, line: usize, text: &str) -> Result<()> {
        let (lines, columns) = (self.lines, self.columns);
        let slot = self.buffer.get_mut(line).ok_or_else(|| {
            HardwareError::invalid_data(format!(
                "Line {line} out of range (0-{})",
                lines.saturating_sub(1)
            ))
        })?;

        *slot = fit_line(&sanitize_text(text), columns);
        Ok(())
    }

    pub fn clear(&mut self) {
        for line in &mut self.buffer {
            *line = " ".repeat(self.columns);
        }
    }

    /// # Errors
    ///
    /// Returns `HardwareError::InvalidData` if `line` is out of range.
    pub fn get_line(&self, line: usize) -> Result<&str> {
        self.buffer
            .get(line)
            .map(String::as_str)
            .ok_or_else(|| HardwareError::invalid_data(format!("Line {line} out of range")))
    }

    /// Number of buzzer pulses so far.
    pub fn beeps(&self) -> usize {
        self.beeps
    }

    /// Total buzzer time so far.
    pub fn beep_time(&self) -> Duration {
        self.beep_time
    }

    fn render(&self) {
        let border = format!("+{}+", "-".repeat(self.columns));
        info!(target: "doorlock::lcd", "{border}");
        for line in &self.buffer {
            info!(target: "doorlock::lcd", "|{line}|");
        }
        info!(target: "doorlock::lcd", "{border}");
    }
}

impl Default for VirtualDisplay {
    fn default() -> Self {
        Self::new(DISPLAY_LINES, DISPLAY_COLUMNS)
    }
}

impl DisplaySink for VirtualDisplay {
    async fn show(&mut self, screen: &Screen) -> Result<()> {
        self.clear();
        for (index, text) in screen.lines().iter().enumerate().take(self.lines) {
            self.set_line(index, text)?;
        }
        self.render();
        Ok(())
    }

    async fn feedback(&mut self, duration: Duration) -> Result<()> {
        self.beeps += 1;
        self.beep_time += duration;
        debug!(target: "doorlock::lcd", duration_ms = duration.as_millis() as u64, "beep");
        Ok(())
    }
}

/// Keep at most `width` characters, padding short text with spaces.
fn fit_line(text: &str, width: usize) -> String {
    let fitted: String = text.chars().take(width).collect();
    let padding = width - fitted.chars().count();
    format!("{fitted}{}", " ".repeat(padding))
}

fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_display_is_blank() {
        let display = VirtualDisplay::default();
        for line in 0..4 {
            assert_eq!(display.get_line(line).unwrap(), " ".repeat(20));
        }
        assert!(display.get_line(4).is_err());
    }

    #[test]
    fn test_set_line_invalid_index() {
        let mut display = VirtualDisplay::default();
        assert!(display.set_line(4, "nope").is_err());
        assert!(display.get_line(4).is_err());
    }

    #[test]
    fn test_long_text_truncated() {
        let mut display = VirtualDisplay::default();
        display.set_line(0, "========MENU========EXTRA").unwrap();
        assert_eq!(display.get_line(0).unwrap(), "========MENU========");
    }

    #[rstest]
    #[case("Wrong\tPass!", "WrongPass!")]
    #[case("Caf\u{e9}", "Caf?")]
    #[case("\u{7}OK", "OK")]
    fn test_sanitize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_text(input), expected);
    }

    #[rstest]
    #[case("abc", 5, "abc  ")]
    #[case("abcde", 5, "abcde")]
    #[case("abcdef", 5, "abcde")]
    #[case("", 3, "   ")]
    fn test_fit_line(#[case] text: &str, #[case] width: usize, #[case] expected: &str) {
        assert_eq!(fit_line(text, width), expected);
    }

    #[tokio::test]
    async fn test_show_replaces_content() {
        let mut display = VirtualDisplay::default();
        display
            .show(&Screen::from_lines(&["Enter Password:", "**", "", "Press # for finger"]))
            .await
            .unwrap();
        display.show(&Screen::message("Wrong Pass!")).await.unwrap();

        assert_eq!(display.get_line(0).unwrap().trim_end(), "Wrong Pass!");
        assert_eq!(display.get_line(1).unwrap().trim_end(), "");
        assert_eq!(display.get_line(3).unwrap().trim_end(), "");
    }

    #[tokio::test]
    async fn test_feedback_counts_beeps() {
        let mut display = VirtualDisplay::default();
        display.feedback(Duration::from_millis(30)).await.unwrap();
        display.feedback(Duration::from_millis(200)).await.unwrap();

        assert_eq!(display.beeps(), 2);
        assert_eq!(display.beep_time(), Duration::from_millis(230));
    }
}
