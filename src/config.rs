/// Rig tunables. Everything is fixed at build time; `DEFAULT` is the
/// configuration flashed on the production board.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigConfig {
    /// Load-cell counts per Newton. Re-measure per board with the `bench` binary.
    pub thrust_scale: f32,
    /// Moving-average window used by the acquisition loop.
    pub thrust_window: usize,
    /// Samples taken per calibration run.
    pub calib_samples: usize,
    /// Moving-average window used while calibrating.
    pub calib_window: usize,
    pub calib_interval_ms: u32,
    /// Post-zero thrust counts tolerated before a button calibration is redone.
    pub drift_band: i32,
    pub adc_full_scale_v: f32,
    pub adc_counts: f32,
    /// Torque sensor output at full-scale force.
    pub torque_full_scale_v: f32,
    /// 4.53 kgf load cell limit, in Newtons.
    pub torque_full_scale_n: f32,
    /// Motor centre to torque load cell.
    pub torque_arm_mm: f32,
    pub max_rpm: f32,
    pub telemetry_hz: u64,
}

impl RigConfig {
    pub const DEFAULT: Self = Self {
        thrust_scale: 86_006.493,
        thrust_window: 15,
        calib_samples: 10,
        calib_window: 10,
        calib_interval_ms: 50,
        drift_band: 50,
        adc_full_scale_v: 5.0,
        adc_counts: 16_384.0,
        torque_full_scale_v: 4.50,
        torque_full_scale_n: 44.39,
        torque_arm_mm: 50.0,
        max_rpm: 25_000.0,
        telemetry_hz: 20,
    };

    /// Tachometer frequency that maps to full PWM duty.
    pub fn max_frequency(&self) -> f32 {
        self.max_rpm / 60.0
    }

    pub fn torque_arm_m(&self) -> f32 {
        self.torque_arm_mm / 1000.0
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
