//! Interfaces to the rig's peripherals. The firmware implements these over
//! the STM32 HAL; tests implement them with scripted values.
//!
//! Button and LED use the `embedded-hal` digital traits directly, delays use
//! `embedded_hal_async::delay::DelayNs`.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum SensorError {
    /// HX711 never signalled a finished conversion.
    LoadCellTimeout,
    /// I²C transfer to the torque ADC failed.
    AdcBus,
}

/// HX711-class load-cell amplifier.
#[allow(async_fn_in_trait)]
pub trait LoadCell {
    /// Next signed 24-bit conversion, in raw counts.
    async fn read_raw(&mut self) -> Result<i32, SensorError>;
}

/// ADS1100 torque channel.
#[allow(async_fn_in_trait)]
pub trait TorqueAdc {
    /// One 3-byte read: result high, result low, config register.
    async fn read_frame(&mut self) -> Result<[u8; 3], SensorError>;
}

/// Frequency feedback output with a 16-bit duty register.
pub trait FeedbackPwm {
    fn set_duty_u16(&mut self, duty: u16);
}

/// Human-readable debug console. Best effort, may drop lines.
#[allow(async_fn_in_trait)]
pub trait DebugSink {
    async fn write_line(&mut self, line: &str);
}
