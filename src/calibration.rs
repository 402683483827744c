use embedded_hal_async::delay::DelayNs;

use crate::config::RigConfig;
use crate::drivers::convert::adc_voltage;
use crate::drivers::filter::MovingAverage;
use crate::sensors::{LoadCell, SensorError, TorqueAdc};

/// Zero points captured at rest. Replaced as a whole by each successful run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct CalibrationState {
    /// Smoothed load-cell counts at zero thrust.
    pub thrust_zero: i32,
    /// Mean torque-sensor voltage at zero torque.
    pub torque_zero_v: f32,
    pub calibrated: bool,
}

/// Owns the zero points. Runs only from the acquisition task; a run blocks
/// that task for `calib_samples * calib_interval_ms` while the telemetry and
/// tachometer tasks keep running.
pub struct Calibrator {
    cfg: RigConfig,
    state: CalibrationState,
    runs: u32,
}

impl Calibrator {
    pub fn new(cfg: RigConfig) -> Self {
        Self {
            cfg,
            state: CalibrationState::default(),
            runs: 0,
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Completed calibration runs since boot.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Sample both channels at rest and store the new zero points.
    ///
    /// Thrust zero is the moving average after the last sample, torque zero
    /// the plain mean of the ADC voltages. A failed read leaves the previous
    /// zero points untouched.
    pub async fn zero_sensors<L, A, D>(
        &mut self,
        load_cell: &mut L,
        adc: &mut A,
        delay: &mut D,
    ) -> Result<CalibrationState, SensorError>
    where
        L: LoadCell,
        A: TorqueAdc,
        D: DelayNs,
    {
        let samples = self.cfg.calib_samples.max(1);
        let mut thrust = MovingAverage::new(self.cfg.calib_window);
        let mut thrust_zero = 0;
        let mut torque_sum = 0.0f32;

        for _ in 0..samples {
            thrust_zero = thrust.filter(load_cell.read_raw().await?);
            torque_sum += adc_voltage(adc.read_frame().await?, &self.cfg);
            delay.delay_ms(self.cfg.calib_interval_ms).await;
        }

        self.state = CalibrationState {
            thrust_zero,
            torque_zero_v: torque_sum / samples as f32,
            calibrated: true,
        };
        self.runs = self.runs.wrapping_add(1);
        info!(
            "zeroed: thrust {} counts, torque {} V (run {})",
            self.state.thrust_zero,
            self.state.torque_zero_v,
            self.runs
        );
        Ok(self.state)
    }
}

/// Per-board thrust constant in counts per Newton: hang a known force on the
/// zeroed load cell and divide the count change by it.
pub fn scale_constant(loaded_counts: i32, zero_counts: i32, force_n: f32) -> Option<f32> {
    if force_n.is_nan() || force_n <= 0.0 {
        return None;
    }
    Some((loaded_counts - zero_counts) as f32 / force_n)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;

    use super::*;

    /// Plays back scripted readings, then repeats the last one.
    pub struct ScriptedLoadCell {
        pub values: VecDeque<i32>,
        pub last: i32,
        pub reads: usize,
        pub fail: bool,
    }

    impl ScriptedLoadCell {
        pub fn constant(value: i32) -> Self {
            Self::scripted(&[], value)
        }

        pub fn scripted(values: &[i32], then: i32) -> Self {
            Self {
                values: values.iter().copied().collect(),
                last: then,
                reads: 0,
                fail: false,
            }
        }
    }

    impl LoadCell for ScriptedLoadCell {
        async fn read_raw(&mut self) -> Result<i32, SensorError> {
            if self.fail {
                return Err(SensorError::LoadCellTimeout);
            }
            self.reads += 1;
            Ok(self.values.pop_front().unwrap_or(self.last))
        }
    }

    pub struct ScriptedAdc {
        pub codes: VecDeque<i16>,
        pub last: i16,
        pub reads: usize,
        pub fail: bool,
    }

    impl ScriptedAdc {
        pub fn constant(code: i16) -> Self {
            Self::scripted(&[], code)
        }

        pub fn scripted(codes: &[i16], then: i16) -> Self {
            Self {
                codes: codes.iter().copied().collect(),
                last: then,
                reads: 0,
                fail: false,
            }
        }
    }

    impl TorqueAdc for ScriptedAdc {
        async fn read_frame(&mut self) -> Result<[u8; 3], SensorError> {
            if self.fail {
                return Err(SensorError::AdcBus);
            }
            self.reads += 1;
            let [hi, lo] = self.codes.pop_front().unwrap_or(self.last).to_be_bytes();
            Ok([hi, lo, 0x8C])
        }
    }

    /// Returns immediately, remembering how long it was asked to wait.
    #[derive(Default)]
    pub struct RecordingDelay {
        pub total_ns: u64,
    }

    impl DelayNs for RecordingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.total_ns += ms as u64 * 1_000_000;
        }
    }

    /// ADC code for a voltage on the 5 V / 14-bit scale.
    pub fn code_for(volts: f32) -> i16 {
        (volts * 16_384.0 / 5.0).round() as i16
    }
}
