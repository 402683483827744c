use blackbox::acquisition::Acquisition;
use embassy_executor::task;
use embassy_stm32::gpio::{AnyPin, Input, Output};
use embassy_stm32::peripherals::{DMA1_CH0, DMA1_CH7, I2C1};
use embassy_time::Delay;

use crate::hw::ads1100::Ads1100;
use crate::hw::feedback_pwm::FeedbackPwmOut;
use crate::hw::hx711::Hx711;
use crate::usb::UsbConsole;

pub type RigAcquisition = Acquisition<
    'static,
    Hx711,
    Ads1100<'static, I2C1, DMA1_CH7, DMA1_CH0>,
    FeedbackPwmOut,
    Input<'static, AnyPin>,
    Output<'static, AnyPin>,
    Delay,
>;

/// Acquisition task — the foreground loop. Runs forever; calibration runs
/// inside it and yields to the other tasks while waiting between samples.
#[task]
pub async fn acquisition_task(mut acquisition: RigAcquisition, mut console: UsbConsole) {
    acquisition.run(&mut console).await
}
