//! Fingerprint enrollment into the lowest free sensor slot.

use doorlock_core::{Error, FingerprintId, Result};
use doorlock_hardware::FingerprintSensor;
use tracing::debug;

/// Check slots 1..=127 in ascending order and return the first empty one.
///
/// Occupancy is always asked from the sensor; nothing is cached.
///
/// # Errors
///
/// Returns `Error::DatabaseFull` when every slot is taken, or the lookup's
/// communication error if the sensor stops answering.
pub async fn lowest_free_slot<F: FingerprintSensor>(sensor: &mut F) -> Result<FingerprintId> {
    for id in FingerprintId::all() {
        if !sensor.exists(id).await? {
            debug!(slot = %id, "Found free fingerprint slot");
            return Ok(id);
        }
    }
    Err(Error::DatabaseFull)
}

/// Enroll a new finger into the lowest free slot.
///
/// There is no retry: a failed capture is reported as is.
///
/// # Errors
///
/// Propagates [`lowest_free_slot`] errors and any enrollment failure.
pub async fn enroll_next<F: FingerprintSensor>(sensor: &mut F) -> Result<FingerprintId> {
    let id = lowest_free_slot(sensor).await?;
    sensor.enroll(id).await?;
    Ok(id)
}
