use chess::Color;

use crate::models::RemainingTime;

/// Width of one line on the 16x2 LCD
pub const DEFAULT_LCD_WIDTH: usize = 16;

/// Both clock lines, ready for the display: white's line then black's
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame(String);

impl DisplayFrame {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lays remaining times out as fixed-width `<label>: <time>` lines
#[derive(Debug, Clone, Copy)]
pub struct DurationFormatter {
    width: usize,
}

impl DurationFormatter {
    pub fn new(width: usize) -> Self {
        DurationFormatter { width }
    }

    /// One line, truncated or space padded to exactly the configured width
    pub fn line(&self, label: &str, remaining: RemainingTime) -> String {
        let mut line: String = format!("{}: {}", label, remaining)
            .chars()
            .take(self.width)
            .collect();
        let length = line.chars().count();
        line.extend(std::iter::repeat(' ').take(self.width - length));
        line
    }

    pub fn frame(&self, white: RemainingTime, black: RemainingTime) -> DisplayFrame {
        let mut frame = self.line(side_label(Color::White), white);
        frame.push_str(&self.line(side_label(Color::Black), black));
        DisplayFrame(frame)
    }
}

impl Default for DurationFormatter {
    fn default() -> Self {
        DurationFormatter::new(DEFAULT_LCD_WIDTH)
    }
}

fn side_label(side: Color) -> &'static str {
    match side {
        Color::White => "W",
        Color::Black => "B",
    }
}
