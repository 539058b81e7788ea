use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use sysinfo::System;

const BYTES_PER_GB: f64 = 1_073_741_824.0;

/// Share of physical memory the Java heap slider may reach
const MAX_HEAP_PERCENT: f64 = 80.0;

static SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| {
    let mut sys = System::new();
    sys.refresh_memory();
    Mutex::new(sys)
});

/// Physical memory of the host, in gigabytes truncated to one decimal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemMemory {
    pub total_gb: f64,
    pub free_gb: f64,
}

impl SystemMemory {
    pub fn from_bytes(total: u64, free: u64) -> Self {
        Self {
            total_gb: bytes_to_gb(total),
            free_gb: bytes_to_gb(free),
        }
    }

    /// Largest heap size (whole GB) offered to the user
    pub fn heap_slider_max_gb(&self) -> u64 {
        (MAX_HEAP_PERCENT * self.total_gb / 100.0).trunc() as u64
    }
}

/// Convert a byte count to gigabytes, truncated (not rounded) to one decimal
pub fn bytes_to_gb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_GB * 10.0).trunc() / 10.0
}

/// Probe the host's total and available memory
pub fn get_system_memory() -> SystemMemory {
    let (total, free) = match SYSTEM.lock() {
        Ok(mut sys) => {
            sys.refresh_memory();
            (sys.total_memory(), sys.available_memory())
        }
        Err(poisoned) => {
            let sys = poisoned.into_inner();
            (sys.total_memory(), sys.available_memory())
        }
    };
    SystemMemory::from_bytes(total, free)
}
