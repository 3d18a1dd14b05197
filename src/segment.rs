//! Seven-segment encoding of decimal digits.
//!
//! Segment indices are fixed and the renderer relies on them:
//!
//! ```text
//!  _        0
//! |_|     1 2 3
//! |_|     4 5 6
//! ```
//!
//! Index 0 is the top bar, 1/3 the upper verticals with 2 (the middle bar)
//! between them, and 4/6 the lower verticals around 5 (the bottom bar).
//! This is also the order in which the strokes appear when the digit is
//! printed left-to-right, top-to-bottom.

/// One stroke of a seven-segment glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Top = 0,
    UpperLeft = 1,
    Middle = 2,
    UpperRight = 3,
    LowerLeft = 4,
    Bottom = 5,
    LowerRight = 6,
}

impl Segment {
    pub const ALL: [Self; 7] = [
        Self::Top,
        Self::UpperLeft,
        Self::Middle,
        Self::UpperRight,
        Self::LowerLeft,
        Self::Bottom,
        Self::LowerRight,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A decimal digit, 0 through 9.
///
/// Out of range values can't be constructed, so encoding never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Digit(u8);

impl Digit {
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= 9 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Splits a two digit clock field into tens and ones.
    ///
    /// Values of 100 or more wrap, clock fields never get there.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn pair(value: u32) -> [Self; 2] {
        // both halves are < 10 after the modulo
        let value = value % 100;
        [Self((value / 10) as u8), Self((value % 10) as u8)]
    }
}

impl TryFrom<u8> for Digit {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

/// Which of the seven strokes are lit, one bit per [`Segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Segments(u8);

impl Segments {
    #[must_use]
    pub const fn is_lit(self, segment: Segment) -> bool {
        self.0 & segment.bit() != 0
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

// bit i is Segment index i
const PATTERNS: [u8; 10] = [
    0b111_1011, // 0
    0b100_1000, // 1
    0b011_1101, // 2
    0b110_1101, // 3
    0b100_1110, // 4
    0b110_0111, // 5
    0b111_0111, // 6
    0b100_1001, // 7
    0b111_1111, // 8
    0b110_1111, // 9
];

#[must_use]
pub const fn encode(digit: Digit) -> Segments {
    Segments(PATTERNS[digit.0 as usize])
}
