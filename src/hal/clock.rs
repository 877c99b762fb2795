//! FreeRTOS-backed clock.

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::sys::esp_timer_get_time;

use gps_lora_beacon::Clock;

/// Boot-relative time from the high resolution timer, sleeping via the
/// scheduler so the other task on the core keeps running.
#[derive(Clone, Copy, Default)]
pub struct EspClock;

impl Clock for EspClock {
    #[inline]
    fn now_ms(&self) -> u32 {
        (self.now_us() / 1000) as u32
    }

    #[inline]
    fn delay_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }

    #[inline]
    fn now_us(&self) -> i64 {
        // SAFETY: read-only query of the system timer.
        unsafe { esp_timer_get_time() }
    }
}
