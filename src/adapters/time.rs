//! Uptime clock.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` (µs, monotonic).
//! - **`not(target_os = "espidf")`**: `std::time::Instant` for host tests.

pub struct Uptime {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Uptime {
    fn default() -> Self {
        Self::new()
    }
}

impl Uptime {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn micros(&self) -> u64 {
        // SAFETY: reads the RTC-backed high-resolution timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since this clock was created.
    #[cfg(not(target_os = "espidf"))]
    pub fn micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Milliseconds since boot, truncated to 32 bits (wraps after ~49 days).
    pub fn millis32(&self) -> u32 {
        (self.micros() / 1_000) as u32
    }

    pub fn secs(&self) -> u64 {
        self.micros() / 1_000_000
    }
}
