#![no_std]
#![no_main]

//! # Black box bench utility
//!
//! Bring-up tool for a freshly built rig. It lights the status LED, drives
//! the feedback PWM at a fixed test speed so the downstream receiver can be
//! checked, zeroes the load cell and then streams raw readings over the USB
//! console as CSV.
//!
//! ## Measuring `thrust_scale`
//! 1. Flash this binary and open the console (`minicom -D /dev/ttyACM0`).
//! 2. Leave the rig unloaded while it zeroes (LED on, then a `# zero` line).
//!    Press the zero button to re-zero at any time.
//! 3. Hang the reference mass (`REFERENCE_MASS_KG`) on the thrust arm.
//! 4. Read the `# scale` line (printed every 5 s) and copy the value into
//!    `RigConfig::thrust_scale`.
//!
//! ## CSV
//! `ms,hx711_counts,hx711_minus_zero,adc_v`

#[path = "../board.rs"]
mod board;
#[path = "../hw/mod.rs"]
mod hw;
#[path = "../usb.rs"]
mod usb;

use core::fmt::Write;

use blackbox::calibration::scale_constant;
use blackbox::config::RigConfig;
use blackbox::drivers::convert::{adc_voltage, duty_from_frequency};
use blackbox::drivers::filter::MovingAverage;
use blackbox::sensors::{DebugSink, FeedbackPwm, LoadCell, SensorError, TorqueAdc};
use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Input, Level, Output, Pin, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::{Duration, Instant, Ticker, Timer};
use {defmt_rtt as _, panic_probe as _};

use crate::board::{Board, I2C_FREQ};
use crate::hw::ads1100::{Ads1100, CONFIG_16SPS_GAIN1};
use crate::hw::feedback_pwm::FeedbackPwmOut;
use crate::hw::hx711::{Gain, Hx711, Rate};
use crate::usb::UsbConsole;

// ── Parameters ────────────────────────────────────────────────────────────────

/// Speed emitted on the feedback PWM for the receiver check.
const TEST_RPM: f32 = 12_000.0;
const REFERENCE_MASS_KG: f32 = 1.0;
const STANDARD_GRAVITY: f32 = 9.81;
const STREAM_RATE_HZ: u64 = 10;
const SCALE_REPORT_EVERY: u32 = 50;

bind_interrupts!(struct Irqs {
    I2C1_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

/// Drive the feedback PWM as if the tachometer read `rpm`.
fn emit_speed(pwm: &mut impl FeedbackPwm, rpm: f32, cfg: &RigConfig) {
    pwm.set_duty_u16(duty_from_frequency(rpm / 60.0, cfg.max_frequency()));
}

/// Smoothed load-cell zero over one calibration window.
async fn zero_load_cell(hx: &mut impl LoadCell, cfg: &RigConfig) -> Result<i32, SensorError> {
    let mut avg = MovingAverage::new(cfg.calib_window);
    for _ in 0..cfg.calib_samples {
        avg.filter(hx.read_raw().await?);
        Timer::after(Duration::from_millis(cfg.calib_interval_ms as u64)).await;
    }
    Ok(avg.value())
}

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let cfg = RigConfig::DEFAULT;
    let board = Board::init();
    let p = board.p;

    let (usb_dev, usb_serial) = usb::init(p.USB_OTG_FS, p.PA12, p.PA11);
    spawner.spawn(usb::usb_task(usb_dev)).unwrap();
    let mut console = UsbConsole::new(usb_serial);

    let mut led = Output::new(p.PC13.degrade(), Level::High, Speed::Low);
    let button = Input::new(p.PB5.degrade(), Pull::Up);

    let mut pwm = FeedbackPwmOut::new(p.TIM3, p.PB0);
    emit_speed(&mut pwm, TEST_RPM, &cfg);

    let mut hx = Hx711::new(
        Output::new(p.PB6.degrade(), Level::Low, Speed::VeryHigh),
        Input::new(p.PB7.degrade(), Pull::None),
    );
    if let Err(e) = hx.start(Gain::A128, Rate::Sps80).await {
        warn!("HX711 start failed: {}", e);
    }

    let i2c = I2c::new(
        p.I2C1, p.PB8, p.PB9, Irqs,
        p.DMA1_CH7, p.DMA1_CH0,
        I2C_FREQ, Default::default(),
    );
    let mut adc = Ads1100::new(i2c);
    if let Err(e) = adc.configure(CONFIG_16SPS_GAIN1) {
        warn!("ADS1100 config failed: {}", e);
    }

    // ── Wait for a terminal (max 30 s, then stream anyway) ────────────────────
    for _ in 0..300u32 {
        led.toggle();
        Timer::after(Duration::from_millis(100)).await;
        if console.connected() { break; }
    }
    led.set_high();

    let mut zero = zero_load_cell(&mut hx, &cfg).await.unwrap_or(0);
    let mut line = heapless::String::<96>::new();
    let _ = write!(line, "# zero {} counts, PWM at {} RPM", zero, TEST_RPM);
    console.write_line(&line).await;
    console.write_line("# ms,hx711_counts,hx711_minus_zero,adc_v").await;
    info!("bench streaming, zero = {}", zero);

    // ── Stream ────────────────────────────────────────────────────────────────
    let start = Instant::now();
    let mut ticker = Ticker::every(Duration::from_hz(STREAM_RATE_HZ));
    let mut smoothed = MovingAverage::new(cfg.thrust_window);
    let mut n: u32 = 0;

    loop {
        ticker.next().await;

        if button.is_low() {
            led.set_low();
            zero = zero_load_cell(&mut hx, &cfg).await.unwrap_or(zero);
            smoothed.reset();
            led.set_high();
            line.clear();
            let _ = write!(line, "# zero {} counts", zero);
            console.write_line(&line).await;
        }

        let counts = match hx.read_raw().await {
            Ok(c) => c,
            Err(e) => { warn!("HX711 read failed: {}", e); continue; }
        };
        let volts = match adc.read_frame().await {
            Ok(frame) => adc_voltage(frame, &cfg),
            Err(e) => { warn!("ADS1100 read failed: {}", e); continue; }
        };
        let avg = smoothed.filter(counts);

        line.clear();
        let _ = write!(
            line,
            "{},{},{},{:.3}",
            start.elapsed().as_millis(),
            counts,
            counts - zero,
            volts
        );
        console.write_line(&line).await;

        n = n.wrapping_add(1);
        if n % SCALE_REPORT_EVERY == 0 {
            line.clear();
            match scale_constant(avg, zero, REFERENCE_MASS_KG * STANDARD_GRAVITY) {
                Some(k) => {
                    let _ = write!(line, "# scale {:.3} counts/N for {} kg", k, REFERENCE_MASS_KG);
                }
                None => {
                    let _ = write!(line, "# scale unavailable");
                }
            }
            console.write_line(&line).await;
        }
    }
}
