//! Shared state between the acquisition loop, the tachometer edge task and
//! the telemetry ticker.
//!
//! Every shared value sits in a [`Latest`] cell so readers always see a
//! complete value, never half of an update made by a preempting context.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

// ── Data types ────────────────────────────────────────────────────────────────

/// Written only by the tachometer edge handler.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct TachoState {
    /// Monotonic timestamp of the last falling edge, µs since boot.
    pub last_edge_us: u64,
    pub frequency_hz: f32,
}

impl TachoState {
    pub const IDLE: Self = Self {
        last_edge_us: 0,
        frequency_hz: 0.0,
    };
}

/// Latest physical values for the telemetry ticker.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct TelemetrySnapshot {
    pub thrust_n: f32,
    pub torque_nm: f32,
}

impl TelemetrySnapshot {
    pub const ZERO: Self = Self {
        thrust_n: 0.0,
        torque_nm: 0.0,
    };
}

// ── Cells ─────────────────────────────────────────────────────────────────────

/// Single-value cell, read and written whole inside a critical section.
pub struct Latest<T: Copy> {
    inner: Mutex<CriticalSectionRawMutex, Cell<T>>,
}

impl<T: Copy> Latest<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(value)),
        }
    }

    pub fn publish(&self, value: T) {
        self.inner.lock(|cell| cell.set(value));
    }

    pub fn get(&self) -> T {
        self.inner.lock(|cell| cell.get())
    }

    /// Read-modify-write as one step; returns the stored value.
    pub fn update(&self, f: impl FnOnce(T) -> T) -> T {
        self.inner.lock(|cell| {
            let next = f(cell.get());
            cell.set(next);
            next
        })
    }
}

/// Everything shared across tasks. Lives in a `static` in the firmware.
pub struct SystemState {
    pub tacho: Latest<TachoState>,
    pub telemetry: Latest<TelemetrySnapshot>,
    /// LED flag: cleared on a detected fault, set when calibration completes.
    calibrated: AtomicBool,
}

impl SystemState {
    pub const fn new() -> Self {
        Self {
            tacho: Latest::new(TachoState::IDLE),
            telemetry: Latest::new(TelemetrySnapshot::ZERO),
            calibrated: AtomicBool::new(false),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated.load(Ordering::Relaxed)
    }

    pub fn set_calibrated(&self, calibrated: bool) {
        self.calibrated.store(calibrated, Ordering::Relaxed);
    }
}

impl Default for SystemState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_returns_last_published() {
        let cell = Latest::new(TelemetrySnapshot::ZERO);
        cell.publish(TelemetrySnapshot {
            thrust_n: 1.5,
            torque_nm: 0.25,
        });
        assert_eq!(cell.get().thrust_n, 1.5);
        assert_eq!(cell.get().torque_nm, 0.25);
    }

    #[test]
    fn update_is_read_modify_write() {
        let cell = Latest::new(3u32);
        assert_eq!(cell.update(|v| v * 2), 6);
        assert_eq!(cell.get(), 6);
    }

    #[test]
    fn system_state_starts_uncalibrated() {
        let state = SystemState::new();
        assert!(!state.is_calibrated());
        assert_eq!(state.tacho.get(), TachoState::IDLE);
        state.set_calibrated(true);
        assert!(state.is_calibrated());
    }
}
