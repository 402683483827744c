//! Tachometer edge timing.
//!
//! One falling edge per revolution. Each edge replaces the stored frequency
//! with the reciprocal of the interval since the previous edge. The first
//! edge after boot is measured against t = 0 and yields one meaningless low
//! reading; it is not filtered out.

use crate::state::{SystemState, TachoState};

/// Frequency in Hz for two edge timestamps in µs.
/// `None` when the interval is zero (two edges in the same clock tick).
pub fn calc_frequency(last_edge_us: u64, now_us: u64) -> Option<f32> {
    let delta_us = now_us.wrapping_sub(last_edge_us);
    if delta_us == 0 {
        return None;
    }
    Some(1_000_000.0 / delta_us as f32)
}

impl TachoState {
    /// State after a falling edge at `now_us`.
    pub fn on_edge(self, now_us: u64) -> Self {
        match calc_frequency(self.last_edge_us, now_us) {
            Some(frequency_hz) => Self {
                last_edge_us: now_us,
                frequency_hz,
            },
            None => self,
        }
    }
}

impl SystemState {
    /// Edge handler body. Only timestamps and divides; keep it that way.
    pub fn record_tacho_edge(&self, now_us: u64) -> TachoState {
        self.tacho.update(|state| state.on_edge(now_us))
    }

    pub fn tacho_frequency(&self) -> f32 {
        self.tacho.get().frequency_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_millisecond_interval_is_one_kilohertz() {
        let hz = calc_frequency(5_000, 6_000).unwrap_or_default();
        assert!((hz - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn zero_interval_is_ignored() {
        assert_eq!(calc_frequency(42, 42), None);
        let state = TachoState {
            last_edge_us: 42,
            frequency_hz: 12.5,
        };
        assert_eq!(state.on_edge(42), state);
    }

    #[test]
    fn first_edge_is_measured_from_boot() {
        let state = SystemState::new();
        let first = state.record_tacho_edge(2_000_000);
        assert_eq!(first.last_edge_us, 2_000_000);
        assert!((first.frequency_hz - 0.5).abs() < 1e-6);
    }

    #[test]
    fn edges_track_latest_interval() {
        let state = SystemState::new();
        state.record_tacho_edge(1_000_000);
        state.record_tacho_edge(1_005_000); // 200 Hz, 12000 RPM
        assert!((state.tacho_frequency() - 200.0).abs() < 1e-3);
        state.record_tacho_edge(1_007_500); // 400 Hz
        assert!((state.tacho_frequency() - 400.0).abs() < 1e-3);
        assert_eq!(state.tacho.get().last_edge_us, 1_007_500);
    }
}
