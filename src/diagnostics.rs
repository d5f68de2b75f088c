//! Runtime diagnostics.
//!
//! A snapshot of heap and flash figures collected on demand for the
//! management page.

/// Runtime diagnostics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeMetrics {
    pub uptime_secs: u64,
    pub heap_free: u32,
    pub heap_min_free: u32,
    /// Size of the application partition the firmware runs from.
    pub app_partition_size: u32,
}

impl RuntimeMetrics {
    #[cfg(target_os = "espidf")]
    pub fn collect(uptime_secs: u64) -> Self {
        use esp_idf_svc::sys::*;
        // SAFETY: read-only allocator statistics.
        let heap_free = unsafe { esp_get_free_heap_size() };
        let heap_min_free = unsafe { esp_get_minimum_free_heap_size() };

        Self {
            uptime_secs,
            heap_free,
            heap_min_free,
            app_partition_size: Self::read_app_partition_size(),
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_app_partition_size() -> u32 {
        // SAFETY: the partition table is static for the lifetime of the app;
        // a null return means no running partition could be identified.
        let part = unsafe { esp_idf_svc::sys::esp_ota_get_running_partition() };
        if part.is_null() {
            0
        } else {
            unsafe { (*part).size }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn collect(uptime_secs: u64) -> Self {
        // Synthetic figures in the range of an ESP32 running this firmware.
        let heap_free: u32 = 180_224;
        Self {
            uptime_secs,
            heap_free,
            heap_min_free: heap_free - 16_384,
            app_partition_size: 1_048_576,
        }
    }
}
