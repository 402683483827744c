//! HX711 load-cell amplifier, bit-banged on two GPIOs.
//!
//! DOUT goes low when a conversion is ready; 24 clock pulses shift it out MSB
//! first and 1-3 extra pulses select the gain for the next conversion.
//! Holding SCK high for more than 60 µs powers the chip down.

use blackbox::sensors::{LoadCell, SensorError};
use cortex_m::asm;
use embassy_stm32::gpio::{AnyPin, Input, Output};
use embassy_time::{Duration, Instant, Timer};

/// Half clock period at 168 MHz, ~1 µs. The HX711 wants ≥0.2 µs and <50 µs high.
const HALF_PERIOD_CYCLES: u32 = 168;
const POWER_DOWN_HOLD: Duration = Duration::from_micros(100);
const READY_POLL: Duration = Duration::from_micros(500);
const READY_TIMEOUT: Duration = Duration::from_millis(500);

#[allow(dead_code)]
#[derive(Clone, Copy)]
pub enum Gain {
    /// Channel A, ×128.
    A128,
    /// Channel B, ×32.
    B32,
    /// Channel A, ×64.
    A64,
}

impl Gain {
    fn extra_pulses(self) -> u8 {
        match self {
            Self::A128 => 1,
            Self::B32 => 2,
            Self::A64 => 3,
        }
    }
}

/// Output data rate, strapped on the RATE pin.
#[allow(dead_code)]
#[derive(Clone, Copy)]
pub enum Rate {
    Sps10,
    Sps80,
}

impl Rate {
    fn settle(self) -> Duration {
        match self {
            Self::Sps10 => Duration::from_millis(400),
            Self::Sps80 => Duration::from_millis(50),
        }
    }
}

pub struct Hx711 {
    sck: Output<'static, AnyPin>,
    dout: Input<'static, AnyPin>,
    gain: Gain,
}

impl Hx711 {
    pub fn new(sck: Output<'static, AnyPin>, dout: Input<'static, AnyPin>) -> Self {
        Self {
            sck,
            dout,
            gain: Gain::A128,
        }
    }

    pub fn power_up(&mut self) {
        self.sck.set_low();
    }

    pub async fn power_down(&mut self) {
        self.sck.set_low();
        self.sck.set_high();
        Timer::after(POWER_DOWN_HOLD).await;
    }

    /// Gain takes effect from the conversion after the next read.
    pub async fn set_gain(&mut self, gain: Gain) -> Result<(), SensorError> {
        self.gain = gain;
        self.wait_ready().await?;
        self.shift_in();
        Ok(())
    }

    /// Startup sequence: select gain, power cycle, wait for the filter to settle.
    pub async fn start(&mut self, gain: Gain, rate: Rate) -> Result<(), SensorError> {
        self.power_up();
        self.set_gain(gain).await?;
        self.power_down().await;
        self.power_up();
        Timer::after(rate.settle()).await;
        Ok(())
    }

    async fn wait_ready(&mut self) -> Result<(), SensorError> {
        let start = Instant::now();
        while self.dout.is_high() {
            if start.elapsed() > READY_TIMEOUT {
                return Err(SensorError::LoadCellTimeout);
            }
            Timer::after(READY_POLL).await;
        }
        Ok(())
    }

    /// Clock one conversion out. SCK must not stay high past 60 µs, so the
    /// whole frame runs with interrupts masked (~55 µs).
    fn shift_in(&mut self) -> i32 {
        let pulses = self.gain.extra_pulses();
        let raw = critical_section::with(|_cs| {
            let mut raw: u32 = 0;
            for _ in 0..24 {
                self.sck.set_high();
                asm::delay(HALF_PERIOD_CYCLES);
                self.sck.set_low();
                raw = (raw << 1) | self.dout.is_high() as u32;
                asm::delay(HALF_PERIOD_CYCLES);
            }
            for _ in 0..pulses {
                self.sck.set_high();
                asm::delay(HALF_PERIOD_CYCLES);
                self.sck.set_low();
                asm::delay(HALF_PERIOD_CYCLES);
            }
            raw
        });
        sign_extend_24(raw)
    }
}

impl LoadCell for Hx711 {
    async fn read_raw(&mut self) -> Result<i32, SensorError> {
        self.wait_ready().await?;
        Ok(self.shift_in())
    }
}

/// Two's complement 24-bit to i32.
fn sign_extend_24(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}
