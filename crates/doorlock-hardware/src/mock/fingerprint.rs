//! Mock fingerprint sensor with an in-memory slot table.

use crate::{FingerprintSensor, HardwareError, Result, SearchOutcome};
use doorlock_core::FingerprintId;
use std::{
    collections::{BTreeSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

#[derive(Debug, Default)]
struct SensorState {
    /// Occupied slots.
    slots: BTreeSet<u8>,
    /// Scripted results for upcoming searches; empty means no match.
    searches: VecDeque<Result<SearchOutcome>>,
    /// Fail the next enrollment after the slot lookup.
    fail_next_enroll: bool,
    /// Fail the next clear-all request.
    fail_next_clear: bool,
    /// Every call fails with a communication error.
    offline: bool,
    /// Number of `exists` calls made.
    lookups: usize,
}

/// Mock fingerprint sensor for testing and development.
///
/// # Examples
///
/// ```
/// use doorlock_core::FingerprintId;
/// use doorlock_hardware::{FingerprintSensor, SearchOutcome, mock::MockFingerprintSensor};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut sensor, handle) = MockFingerprintSensor::new();
///     let id = FingerprintId::new(3).unwrap();
///
///     sensor.enroll(id).await?;
///     assert!(handle.is_occupied(3));
///
///     handle.queue_match(id);
///     assert_eq!(sensor.search().await?, SearchOutcome::Matched(id));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockFingerprintSensor {
    state: Arc<Mutex<SensorState>>,
}

impl MockFingerprintSensor {
    pub fn new() -> (Self, MockFingerprintHandle) {
        let state = Arc::new(Mutex::new(SensorState::default()));
        let sensor = Self {
            state: Arc::clone(&state),
        };
        (sensor, MockFingerprintHandle { state })
    }

    fn state(&self) -> MutexGuard<'_, SensorState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<SensorState>) -> MutexGuard<'_, SensorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn offline_error() -> HardwareError {
    HardwareError::communication("Sensor not responding")
}

impl FingerprintSensor for MockFingerprintSensor {
    async fn exists(&mut self, id: FingerprintId) -> Result<bool> {
        let mut state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        state.lookups += 1;
        Ok(state.slots.contains(&id.as_u8()))
    }

    async fn enroll(&mut self, id: FingerprintId) -> Result<()> {
        let mut state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        if std::mem::take(&mut state.fail_next_enroll) {
            return Err(HardwareError::enrollment_failed("Captures did not match"));
        }
        state.slots.insert(id.as_u8());
        Ok(())
    }

    async fn search(&mut self) -> Result<SearchOutcome> {
        let mut state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        state
            .searches
            .pop_front()
            .unwrap_or(Ok(SearchOutcome::NoMatch))
    }

    async fn empty_database(&mut self) -> Result<()> {
        let mut state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        if std::mem::take(&mut state.fail_next_clear) {
            return Err(HardwareError::communication("Clear rejected"));
        }
        state.slots.clear();
        Ok(())
    }
}

/// Handle for scripting and inspecting a [`MockFingerprintSensor`].
#[derive(Debug, Clone)]
pub struct MockFingerprintHandle {
    state: Arc<Mutex<SensorState>>,
}

impl MockFingerprintHandle {
    /// Mark slots as occupied.
    pub fn occupy(&self, ids: &[u8]) {
        lock(&self.state).slots.extend(ids.iter().copied());
    }

    /// Mark every slot as occupied.
    pub fn fill(&self) {
        let mut state = lock(&self.state);
        state.slots.extend(FingerprintId::all().map(|id| id.as_u8()));
    }

    #[must_use]
    pub fn is_occupied(&self, id: u8) -> bool {
        lock(&self.state).slots.contains(&id)
    }

    #[must_use]
    pub fn occupied(&self) -> Vec<u8> {
        lock(&self.state).slots.iter().copied().collect()
    }

    /// Next search matches `id`.
    pub fn queue_match(&self, id: FingerprintId) {
        lock(&self.state)
            .searches
            .push_back(Ok(SearchOutcome::Matched(id)));
    }

    /// Next search finds no match.
    pub fn queue_no_match(&self) {
        lock(&self.state)
            .searches
            .push_back(Ok(SearchOutcome::NoMatch));
    }

    /// Next search fails with a communication error.
    pub fn queue_search_error(&self) {
        lock(&self.state)
            .searches
            .push_back(Err(HardwareError::communication("Capture failed")));
    }

    pub fn fail_next_enroll(&self) {
        lock(&self.state).fail_next_enroll = true;
    }

    pub fn fail_next_clear(&self) {
        lock(&self.state).fail_next_clear = true;
    }

    pub fn set_offline(&self, offline: bool) {
        lock(&self.state).offline = offline;
    }

    /// Number of slot lookups so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        lock(&self.state).lookups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u16) -> FingerprintId {
        FingerprintId::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_exists_reflects_slots() {
        let (mut sensor, handle) = MockFingerprintSensor::new();
        handle.occupy(&[1, 2, 4]);

        assert!(sensor.exists(id(1)).await.unwrap());
        assert!(!sensor.exists(id(3)).await.unwrap());
        assert_eq!(handle.lookups(), 2);
    }

    #[tokio::test]
    async fn test_search_script_order() {
        let (mut sensor, handle) = MockFingerprintSensor::new();
        handle.queue_match(id(5));
        handle.queue_search_error();

        assert_eq!(sensor.search().await.unwrap(), SearchOutcome::Matched(id(5)));
        assert!(sensor.search().await.is_err());
        assert_eq!(sensor.search().await.unwrap(), SearchOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_enroll_failure_is_one_shot() {
        let (mut sensor, handle) = MockFingerprintSensor::new();
        handle.fail_next_enroll();

        assert!(sensor.enroll(id(1)).await.is_err());
        assert!(!handle.is_occupied(1));
        sensor.enroll(id(1)).await.unwrap();
        assert!(handle.is_occupied(1));
    }

    #[tokio::test]
    async fn test_empty_database() {
        let (mut sensor, handle) = MockFingerprintSensor::new();
        handle.occupy(&[1, 9]);

        handle.fail_next_clear();
        assert!(sensor.empty_database().await.is_err());
        assert_eq!(handle.occupied(), vec![1, 9]);

        sensor.empty_database().await.unwrap();
        assert!(handle.occupied().is_empty());
    }

    #[tokio::test]
    async fn test_offline_fails_everything() {
        let (mut sensor, handle) = MockFingerprintSensor::new();
        handle.set_offline(true);

        assert!(sensor.exists(id(1)).await.is_err());
        assert!(sensor.enroll(id(1)).await.is_err());
        assert!(sensor.search().await.is_err());
        assert!(sensor.empty_database().await.is_err());
    }
}
