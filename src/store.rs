//! The in-memory list of alarms.
//!
//! Order is insertion order and users see it: menus number alarms from 1, so
//! every index taken by the public operations here is 1-based.

use log::warn;

use crate::{
    alarm::{Alarm, AlarmEdit},
    error::StoreError,
};

pub const MAX_ALARMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmStore {
    alarms: Vec<Alarm>,
    capacity: usize,
}

impl Default for AlarmStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmStore {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_capacity(MAX_ALARMS)
    }

    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            alarms: Vec::new(),
            capacity,
        }
    }

    /// Builds a store from loaded alarms, dropping any past the capacity.
    #[must_use]
    pub fn from_alarms(alarms: Vec<Alarm>) -> Self {
        let mut store = Self::new();
        let total = alarms.len();
        store.alarms = alarms
            .into_iter()
            .take(store.capacity)
            .map(Alarm::normalized)
            .collect();
        if total > store.capacity {
            warn!(
                "ignoring {} alarms past the limit of {}",
                total - store.capacity,
                store.capacity
            );
        }
        store
    }

    /// Appends an alarm and returns its 1-based number.
    ///
    /// # Errors
    /// [`StoreError::CapacityExceeded`] when the store is full, nothing changes.
    pub fn add(&mut self, alarm: Alarm) -> Result<usize, StoreError> {
        if self.is_full() {
            return Err(StoreError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.alarms.push(alarm);
        Ok(self.alarms.len())
    }

    /// Removes the alarm numbered `index`, later alarms move up by one.
    ///
    /// # Errors
    /// [`StoreError::OutOfRange`] unless `1 <= index <= len`.
    pub fn remove(&mut self, index: usize) -> Result<Alarm, StoreError> {
        let position = self.position(index)?;
        Ok(self.alarms.remove(position))
    }

    /// Overwrites fields of the alarm numbered `index` in place.
    ///
    /// # Errors
    /// [`StoreError::OutOfRange`] unless `1 <= index <= len`; no edit is
    /// applied in that case.
    pub fn modify(
        &mut self,
        index: usize,
        edits: impl IntoIterator<Item = AlarmEdit>,
    ) -> Result<(), StoreError> {
        let position = self.position(index)?;
        let alarm = &mut self.alarms[position];
        for edit in edits {
            alarm.apply(edit);
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Alarm> {
        index.checked_sub(1).and_then(|i| self.alarms.get(i))
    }

    #[must_use]
    pub fn list(&self) -> &[Alarm] {
        &self.alarms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.alarms.len() >= self.capacity
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn position(&self, index: usize) -> Result<usize, StoreError> {
        if (1..=self.alarms.len()).contains(&index) {
            Ok(index - 1)
        } else {
            Err(StoreError::OutOfRange {
                index,
                len: self.alarms.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn alarm(hour: u32, minute: u32, description: &str) -> Alarm {
        Alarm::new(NaiveTime::from_hms_opt(hour, minute, 0).unwrap(), description)
    }

    fn store_of(n: usize) -> AlarmStore {
        let mut store = AlarmStore::new();
        for i in 0..n {
            store.add(alarm(6, u32::try_from(i).unwrap(), &format!("alarm {i}"))).unwrap();
        }
        store
    }

    #[test]
    fn add_returns_one_based_numbers() {
        let mut store = AlarmStore::new();
        assert_eq!(store.add(alarm(7, 0, "a")), Ok(1));
        assert_eq!(store.add(alarm(8, 0, "b")), Ok(2));
        assert_eq!(store.get(2).map(Alarm::description), Some("b"));
        assert_eq!(store.get(0), None);
    }

    #[test]
    fn eleventh_alarm_is_rejected() {
        let mut store = store_of(MAX_ALARMS);
        let before = store.clone();
        assert_eq!(
            store.add(alarm(9, 0, "one too many")),
            Err(StoreError::CapacityExceeded {
                capacity: MAX_ALARMS
            })
        );
        assert_eq!(store.len(), MAX_ALARMS);
        assert_eq!(store, before);
    }

    #[test]
    fn add_then_remove_restores_the_store() {
        let mut store = store_of(3);
        let before = store.clone();
        let index = store.add(alarm(22, 15, "temporary")).unwrap();
        let removed = store.remove(index).unwrap();
        assert_eq!(removed.description(), "temporary");
        assert_eq!(store, before);
    }

    #[test]
    fn remove_shifts_later_alarms_up() {
        let mut store = store_of(3);
        store.remove(1).unwrap();
        let names: Vec<_> = store.list().iter().map(Alarm::description).collect();
        assert_eq!(names, ["alarm 1", "alarm 2"]);
    }

    #[test]
    fn remove_out_of_range() {
        let mut store = store_of(2);
        assert_eq!(
            store.remove(3),
            Err(StoreError::OutOfRange { index: 3, len: 2 })
        );
        assert_eq!(
            store.remove(0),
            Err(StoreError::OutOfRange { index: 0, len: 2 })
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn modify_keeps_the_position() {
        let mut store = store_of(3);
        store
            .modify(
                2,
                [
                    AlarmEdit::Description("renamed".to_string()),
                    AlarmEdit::Repeat(true),
                ],
            )
            .unwrap();
        let modified = store.get(2).unwrap();
        assert_eq!(modified.description(), "renamed");
        assert!(modified.repeat);
        assert_eq!((modified.hour(), modified.minute()), (6, 1));
        assert_eq!(store.get(1).unwrap().description(), "alarm 0");
    }

    #[test]
    fn modify_out_of_range_changes_nothing() {
        let mut store = store_of(2);
        let before = store.clone();
        for index in [0, store.len() + 1] {
            assert_eq!(
                store.modify(index, [AlarmEdit::Repeat(true)]),
                Err(StoreError::OutOfRange { index, len: 2 })
            );
        }
        assert_eq!(store, before);
    }

    #[test]
    fn loading_too_many_alarms_truncates() {
        let alarms: Vec<_> = (0..15).map(|i| alarm(5, i, "x")).collect();
        let store = AlarmStore::from_alarms(alarms);
        assert_eq!(store.len(), MAX_ALARMS);
        assert!(store.is_full());
        assert_eq!(store.list()[9].minute(), 9);
    }
}
