use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// Device wide exclusion lock.
///
/// Held around frame extraction from the GPU, each tonemap call and each canvas placement.
/// Cloning shares the same lock.
#[derive(Clone, Default)]
pub struct DeviceLock(Arc<Mutex<()>>);

/// Holds the device lock until dropped.
#[must_use = "the device is unlocked as soon as the guard is dropped"]
pub struct DeviceGuard<'a>(#[allow(dead_code)] MutexGuard<'a, ()>);

impl DeviceLock {
    /// Create a new, unshared lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the device is free.
    pub fn lock(&self) -> DeviceGuard<'_> {
        DeviceGuard(self.0.lock())
    }

    /// Returns a guard if the device is free without blocking.
    pub fn try_lock(&self) -> Option<DeviceGuard<'_>> {
        self.0.try_lock().map(DeviceGuard)
    }
}

impl core::fmt::Debug for DeviceLock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceLock")
            .field("locked", &self.0.is_locked())
            .finish()
    }
}
