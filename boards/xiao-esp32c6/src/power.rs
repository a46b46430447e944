#![deny(unsafe_code)]
#![deny(warnings)]
//! Timed deep sleep
//!
//! Only the RTC domain stays powered; the chip resets on wake and the
//! firmware restarts from `main`. The retained region in RTC fast memory is
//! kept.

use core::time::Duration;

use defmt::info;
use esp_hal::rtc_cntl::{sleep::TimerWakeupSource, Rtc};
use plant_node_hal::DeepSleep;

/// Deep sleep woken by the RTC timer
pub struct TimerDeepSleep {
    rtc: Rtc<'static>,
}

impl TimerDeepSleep {
    /// Take ownership of the RTC controller
    pub fn new(rtc: Rtc<'static>) -> Self {
        Self { rtc }
    }

    /// Sleep for `duration`, resetting on wake
    pub fn sleep_for(&mut self, duration: Duration) -> ! {
        info!("power: deep sleep for {=u64} s", duration.as_secs());
        let wake_source = TimerWakeupSource::new(duration);
        self.rtc.sleep_deep(&[&wake_source])
    }
}

impl DeepSleep for TimerDeepSleep {
    fn deep_sleep(&mut self, duration: Duration) {
        self.sleep_for(duration)
    }
}
