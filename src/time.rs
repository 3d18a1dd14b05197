use chrono::{FixedOffset, Local, NaiveDateTime, Utc};
use log::warn;

pub trait TimeSource {
    /// the time to show and to match alarms against
    fn now(&self) -> NaiveDateTime;
}

/// The system clock, in local time or at a fixed offset from UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallClock {
    offset: Option<FixedOffset>,
}

impl WallClock {
    #[must_use]
    pub const fn local() -> Self {
        Self { offset: None }
    }

    /// `None`, or an offset outside of ±24h, uses local time.
    #[must_use]
    pub fn with_offset_minutes(minutes: Option<i32>) -> Self {
        let offset = minutes.and_then(|minutes| {
            let offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt);
            if offset.is_none() {
                warn!("ignoring invalid utc offset of {minutes} minutes, using local time");
            }
            offset
        });
        Self { offset }
    }

    #[must_use]
    pub const fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }
}

impl TimeSource for WallClock {
    fn now(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset).naive_local(),
            None => Local::now().naive_local(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn offsets_in_range_are_kept() {
        let clock = WallClock::with_offset_minutes(Some(-300));
        assert_eq!(clock.offset(), FixedOffset::west_opt(5 * 3600));
        assert_eq!(WallClock::with_offset_minutes(None), WallClock::local());
    }

    #[test]
    fn bad_offsets_fall_back_to_local() {
        assert_eq!(WallClock::with_offset_minutes(Some(24 * 60)).offset(), None);
        assert_eq!(WallClock::with_offset_minutes(Some(i32::MAX)).offset(), None);
    }

    #[test]
    fn fixed_offset_is_applied() {
        let utc = WallClock::with_offset_minutes(Some(0)).now();
        let ahead = WallClock::with_offset_minutes(Some(90)).now();
        let diff = ahead - utc;
        assert!((diff - Duration::minutes(90)).num_seconds().abs() <= 1);
    }
}
