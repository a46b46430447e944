//! Low-power sleep

use core::time::Duration;

/// Timed deep sleep with the radio left disabled on wake
pub trait DeepSleep {
    /// Enter deep sleep for `duration`
    ///
    /// On hardware this never returns: the chip resets on wake and control
    /// flow restarts from the entry point. Host-side implementations return
    /// so the caller can be observed.
    fn deep_sleep(&mut self, duration: Duration);
}

impl<T: DeepSleep + ?Sized> DeepSleep for &mut T {
    fn deep_sleep(&mut self, duration: Duration) {
        T::deep_sleep(self, duration)
    }
}
