//! Turns the time into a full screen of text.
//!
//! Every frame is built from scratch for the terminal size it is given, the
//! terminal may have been resized since the last tick.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use crossterm::style::Stylize;
use serde::{Deserialize, Serialize};

use crate::{
    alarm::Alarm,
    segment::{encode, Digit, Segment, Segments},
};

/// Width of one digit glyph.
pub const DIGIT_WIDTH: usize = 3;
/// Width of the `○` separator between hours, minutes and seconds.
pub const SEPARATOR_WIDTH: usize = 3;
pub const CLOCK_WIDTH: usize = 6 * DIGIT_WIDTH + 2 * SEPARATOR_WIDTH;
pub const CLOCK_HEIGHT: usize = 3;
// clock, blank line, date
const BLOCK_HEIGHT: usize = CLOCK_HEIGHT + 2;

const MENU_HINT: &str = "press any key for the alarm menu";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: u16,
    pub rows: u16,
}

impl TerminalSize {
    #[must_use]
    pub const fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

/// Language of the weekday and month abbreviations on the date line.
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Italian,
}

impl Language {
    const fn weekdays(self) -> [&'static str; 7] {
        match self {
            Self::English => ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"],
            Self::Italian => ["LUN", "MAR", "MER", "GIO", "VEN", "SAB", "DOM"],
        }
    }

    const fn months(self) -> [&'static str; 12] {
        match self {
            Self::English => [
                "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
            ],
            Self::Italian => [
                "GEN", "FEB", "MAR", "APR", "MAG", "GIU", "LUG", "AGO", "SET", "OTT", "NOV", "DIC",
            ],
        }
    }

    /// `WWD DD MON YYYY`, e.g. `MON 01 JAN 2024`.
    #[must_use]
    pub fn format_date(self, now: NaiveDateTime) -> String {
        let weekday = self.weekdays()[now.weekday().num_days_from_monday() as usize];
        let month = self.months()[now.month0() as usize];
        format!("{weekday} {:02} {month} {}", now.day(), now.year())
    }
}

/// A rendered screen, one string per terminal row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    lines: Vec<String>,
}

impl Frame {
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn blank(&mut self, count: usize) {
        self.lines.extend(std::iter::repeat(String::new()).take(count));
    }
}

impl From<Vec<String>> for Frame {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

impl fmt::Display for Frame {
    // raw mode needs the carriage return
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\r\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Encodes `HH:MM:SS` into the six digit slots, left to right.
#[must_use]
pub fn encode_time(hour: u32, minute: u32, second: u32) -> [Segments; 6] {
    let [h1, h0] = Digit::pair(hour);
    let [m1, m0] = Digit::pair(minute);
    let [s1, s0] = Digit::pair(second);
    [h1, h0, m1, m0, s1, s0].map(encode)
}

/// The three text rows of the big digits, without padding.
#[must_use]
pub fn clock_rows(slots: &[Segments; 6]) -> [String; CLOCK_HEIGHT] {
    let stroke = |segments: Segments, segment: Segment, glyph: char| {
        if segments.is_lit(segment) {
            glyph
        } else {
            ' '
        }
    };
    let mut rows: [String; CLOCK_HEIGHT] = Default::default();
    for (slot, &segments) in slots.iter().enumerate() {
        rows[0].push(' ');
        rows[0].push(stroke(segments, Segment::Top, '_'));
        rows[0].push(' ');
        for (row, [left, middle, right]) in [
            (1, [Segment::UpperLeft, Segment::Middle, Segment::UpperRight]),
            (2, [Segment::LowerLeft, Segment::Bottom, Segment::LowerRight]),
        ] {
            rows[row].push(stroke(segments, left, '|'));
            rows[row].push(stroke(segments, middle, '_'));
            rows[row].push(stroke(segments, right, '|'));
        }
        // after the hours and after the minutes
        if slot == 1 || slot == 3 {
            rows[0].push_str("   ");
            rows[1].push_str(" ○ ");
            rows[2].push_str(" ○ ");
        }
    }
    rows
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClockRenderer {
    language: Language,
}

impl ClockRenderer {
    #[must_use]
    pub const fn new(language: Language) -> Self {
        Self { language }
    }

    /// The clock screen: big digits and the date, centered, with the menu hint
    /// on the last row.
    ///
    /// Terminals too small for the clock get zero padding and a frame taller or
    /// wider than the screen, the terminal cuts it off.
    #[must_use]
    pub fn render(&self, now: NaiveDateTime, size: TerminalSize) -> Frame {
        let columns = usize::from(size.columns);
        let rows = usize::from(size.rows);
        let date = self.language.format_date(now);

        let top = rows.saturating_sub(BLOCK_HEIGHT + 1) / 2;
        let bottom = rows.saturating_sub(top + BLOCK_HEIGHT + 1);
        let clock_pad = " ".repeat(columns.saturating_sub(CLOCK_WIDTH) / 2);
        let date_pad = " ".repeat(columns.saturating_sub(date.chars().count()) / 2);

        let mut frame = Frame::default();
        frame.blank(top);
        let slots = encode_time(now.hour(), now.minute(), now.second());
        for row in clock_rows(&slots) {
            frame.push(format!("{clock_pad}{row}"));
        }
        frame.blank(1);
        frame.push(format!("{date_pad}{}", date.as_str().magenta()));
        frame.blank(bottom);
        frame.push(MENU_HINT);
        frame
    }
}

/// The screen shown while an alarm rings.
#[must_use]
pub fn ring_screen(alarm: &Alarm) -> Frame {
    let mut frame = Frame::default();
    frame.blank(7);
    frame.push("#".repeat(56));
    frame.push(format!("#{:54}#", ""));
    frame.push(format!("#{:^54}#", "ALARM!"));
    frame.push(format!("#{:54}#", ""));
    frame.push("#".repeat(56));
    frame.blank(1);
    frame.push(format!("{:02}:{:02}  {}", alarm.hour(), alarm.minute(), alarm.description()));
    frame.blank(1);
    if let Some(command) = &alarm.command {
        frame.push(format!("Running command: {command}"));
        frame.blank(1);
    }
    frame.push("Press any key to stop the alarm...");
    frame
}
