//! Wall-clock effect used by token stores for validity windows.

use std::sync::Arc;

/// Physical time source.
pub trait ClockEffects: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

impl<T: ClockEffects + ?Sized> ClockEffects for Arc<T> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
