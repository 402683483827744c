//! Steady-state measurement loop.
//!
//! Each pass reads the load cell and the torque ADC, applies the zero points,
//! converts to Newtons and Newton-metres, mirrors the tachometer frequency on
//! the feedback PWM and publishes the result for the telemetry ticker. Drift
//! and negative torque are corrected by re-zeroing on the spot.

use core::fmt::Write;

use embassy_futures::select::{select, Either};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::calibration::{CalibrationState, Calibrator};
use crate::config::RigConfig;
use crate::drivers::convert::{adc_voltage, duty_from_frequency, map_range, round_to, rpm};
use crate::drivers::filter::MovingAverage;
use crate::sensors::{DebugSink, FeedbackPwm, LoadCell, SensorError, TorqueAdc};
use crate::state::{SystemState, TelemetrySnapshot};

/// Back-off after a failed pass so the other tasks get the executor.
const RETRY_DELAY_MS: u32 = 10;
/// Upper bound on one debug line. A console that is connected but not
/// draining loses the line instead of stalling the loop.
pub const DEBUG_WRITE_BUDGET_MS: u32 = 20;

pub type DebugLine = heapless::String<160>;

/// Peripherals the loop drives.
pub struct RigIo<L, A, P, B, O, D> {
    pub load_cell: L,
    pub adc: A,
    pub pwm: P,
    /// Zero button, active low.
    pub button: B,
    pub led: O,
    pub delay: D,
}

/// One pass worth of values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Reading {
    pub adc_voltage: f32,
    /// Smoothed load-cell counts minus the thrust zero.
    pub thrust_counts: i32,
    pub thrust_n: f32,
    pub torque_force_n: f32,
    pub torque_nm: f32,
    pub tacho_hz: f32,
    pub rpm: f32,
    pub duty: u16,
    pub calibrated: bool,
}

impl Reading {
    pub fn debug_line(&self) -> DebugLine {
        let mut line = DebugLine::new();
        let _ = write!(
            line,
            "ADCV {}V, HX711 {}, TQF {:02.2}N, TQ {:02.3}Nm, THR {:02.3}N, TACHO {:02.1} RPM, CAL {}",
            self.adc_voltage,
            self.thrust_counts,
            self.torque_force_n,
            self.torque_nm,
            self.thrust_n,
            self.rpm,
            self.calibrated
        );
        line
    }
}

pub struct Acquisition<'s, L, A, P, B, O, D> {
    cfg: RigConfig,
    shared: &'s SystemState,
    io: RigIo<L, A, P, B, O, D>,
    thrust: MovingAverage,
    calibrator: Calibrator,
}

impl<'s, L, A, P, B, O, D> Acquisition<'s, L, A, P, B, O, D>
where
    L: LoadCell,
    A: TorqueAdc,
    P: FeedbackPwm,
    B: InputPin,
    O: OutputPin,
    D: DelayNs,
{
    pub fn new(cfg: RigConfig, shared: &'s SystemState, io: RigIo<L, A, P, B, O, D>) -> Self {
        Self {
            cfg,
            shared,
            io,
            thrust: MovingAverage::new(cfg.thrust_window),
            calibrator: Calibrator::new(cfg),
        }
    }

    pub fn calibration(&self) -> CalibrationState {
        self.calibrator.state()
    }

    pub fn calibration_runs(&self) -> u32 {
        self.calibrator.runs()
    }

    pub fn io(&self) -> &RigIo<L, A, P, B, O, D> {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut RigIo<L, A, P, B, O, D> {
        &mut self.io
    }

    /// Never returns. Failed passes are logged and retried.
    pub async fn run<S: DebugSink>(&mut self, console: &mut S) -> ! {
        info!("acquisition running");
        loop {
            match self.step().await {
                Ok(reading) => {
                    self.report(console, &reading).await;
                }
                Err(e) => {
                    warn!("acquisition pass failed: {}", e);
                    self.io.delay.delay_ms(RETRY_DELAY_MS).await;
                }
            }
        }
    }

    /// One pass of the loop.
    pub async fn step(&mut self) -> Result<Reading, SensorError> {
        if matches!(self.io.button.is_low(), Ok(true)) {
            info!("zero button pressed");
            self.recalibrate().await?;
            let drift = self.read_thrust_counts().await?;
            if drift.abs() > self.cfg.drift_band {
                warn!("thrust {} counts off zero after calibration, retrying", drift);
                self.set_led(false);
                self.recalibrate().await?;
            }
        }

        let thrust_counts = self.read_thrust_counts().await?;
        let thrust_n = round_to(thrust_counts as f32 / self.cfg.thrust_scale, 3).abs();

        let volts = round_to(adc_voltage(self.io.adc.read_frame().await?, &self.cfg), 3);
        let mut torque_force_n = self.torque_force(volts);
        if torque_force_n < 0.0 {
            // Sensor unloaded below its zero: drop the LED and re-zero before
            // anything else is computed from the stale zero point.
            torque_force_n = 0.0;
            self.set_led(false);
            warn!("negative torque force, re-zeroing");
            self.recalibrate().await?;
        }
        // -0.0 from rounding would print as "-0.000".
        if torque_force_n.is_nan() || torque_force_n == 0.0 {
            torque_force_n = 0.0;
        }
        let torque_nm = torque_force_n * self.cfg.torque_arm_m();

        let tacho_hz = self.shared.tacho_frequency();
        let duty = duty_from_frequency(tacho_hz, self.cfg.max_frequency());
        self.io.pwm.set_duty_u16(duty);

        self.shared.telemetry.publish(TelemetrySnapshot {
            thrust_n,
            torque_nm,
        });

        let calibrated = self.shared.is_calibrated();
        self.set_led(calibrated);

        Ok(Reading {
            adc_voltage: volts,
            thrust_counts,
            thrust_n,
            torque_force_n,
            torque_nm,
            tacho_hz,
            rpm: rpm(tacho_hz),
            duty,
            calibrated,
        })
    }

    /// Write the debug line for `reading`, giving up after
    /// [`DEBUG_WRITE_BUDGET_MS`]. Returns whether the line went out whole.
    pub async fn report<S: DebugSink>(&mut self, console: &mut S, reading: &Reading) -> bool {
        let line = reading.debug_line();
        match select(
            console.write_line(&line),
            self.io.delay.delay_ms(DEBUG_WRITE_BUDGET_MS),
        )
        .await
        {
            Either::First(()) => true,
            Either::Second(()) => {
                debug!("debug console stalled, line dropped");
                false
            }
        }
    }

    /// Run the calibration manager and light the LED on success.
    pub async fn recalibrate(&mut self) -> Result<CalibrationState, SensorError> {
        let state = self
            .calibrator
            .zero_sensors(&mut self.io.load_cell, &mut self.io.adc, &mut self.io.delay)
            .await?;
        self.shared.set_calibrated(true);
        Ok(state)
    }

    async fn read_thrust_counts(&mut self) -> Result<i32, SensorError> {
        let raw = self.io.load_cell.read_raw().await?;
        Ok(self.thrust.filter(raw) - self.calibrator.state().thrust_zero)
    }

    /// Torque-sensor voltage to the force at the arm, in Newtons (2 dp).
    fn torque_force(&self, volts: f32) -> f32 {
        let zero = self.calibrator.state().torque_zero_v;
        round_to(
            map_range(
                volts,
                zero,
                self.cfg.torque_full_scale_v,
                0.0,
                self.cfg.torque_full_scale_n,
            ),
            2,
        )
    }

    fn set_led(&mut self, on: bool) {
        self.shared.set_calibrated(on);
        let _ = if on {
            self.io.led.set_high()
        } else {
            self.io.led.set_low()
        };
    }
}
