#![no_std]
#![no_main]

mod board;
mod hw;
mod tasks;
mod usb;

use blackbox::acquisition::{Acquisition, RigIo};
use blackbox::config::RigConfig;
use blackbox::state::SystemState;
use defmt::{info, warn};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, Pin, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::usart::{Config as UsartConfig, UartTx};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use crate::board::{Board, I2C_FREQ, TELEMETRY_BAUD};
use crate::hw::ads1100::{Ads1100, CONFIG_16SPS_GAIN1};
use crate::hw::feedback_pwm::FeedbackPwmOut;
use crate::hw::hx711::{Gain, Hx711, Rate};
use crate::tasks::acquisition_task::acquisition_task;
use crate::tasks::tacho_task::tacho_task;
use crate::tasks::telemetry_task::telemetry_task;
use crate::usb::UsbConsole;

// ── Shared state (tacho edges, telemetry snapshot, LED flag) ─────────────────
static SYSTEM: SystemState = SystemState::new();

// ── Edge-timed tasks preempt the acquisition loop ────────────────────────────
// UART4 is unused on this board; its vector drives the executor.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn UART4() {
    EXECUTOR_HIGH.on_interrupt()
}

// ── Interrupt bindings ────────────────────────────────────────────────────────
bind_interrupts!(struct Irqs {
    I2C1_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let cfg = RigConfig::DEFAULT;

    // 1. Board init (168 MHz PLL)
    let board = Board::init();
    let p = board.p;
    info!("black box starting");

    // 2. USB CDC-ACM debug console
    let (usb_dev, usb_serial) = usb::init(p.USB_OTG_FS, p.PA12, p.PA11);
    spawner.spawn(usb::usb_task(usb_dev)).unwrap();

    // 3. Status LED (PC13) stays dark until the first calibration; zero button (PB5)
    let led = Output::new(p.PC13.degrade(), Level::Low, Speed::Low);
    let button = Input::new(p.PB5.degrade(), Pull::Up);

    // 4. HX711 load-cell amplifier (SCK=PB6, DOUT=PB7), gain 128, 80 SPS
    let mut load_cell = Hx711::new(
        Output::new(p.PB6.degrade(), Level::Low, Speed::VeryHigh),
        Input::new(p.PB7.degrade(), Pull::None),
    );
    match load_cell.start(Gain::A128, Rate::Sps80).await {
        Ok(()) => info!("HX711 configured"),
        Err(e) => warn!("HX711 start failed: {}", e),
    }

    // 5. I2C1 @ 100 kHz — ADS1100 torque ADC (SCL=PB8, SDA=PB9)
    let i2c = I2c::new(
        p.I2C1,
        p.PB8, p.PB9,
        Irqs,
        p.DMA1_CH7,
        p.DMA1_CH0,
        I2C_FREQ,
        Default::default(),
    );
    let mut adc = Ads1100::new(i2c);
    if let Err(e) = adc.configure(CONFIG_16SPS_GAIN1) {
        warn!("ADS1100 config failed: {}", e);
    }

    // 6. Frequency feedback PWM, TIM3 CH3 on PB0 @ 100 kHz
    let pwm = FeedbackPwmOut::new(p.TIM3, p.PB0);

    // 7. Tachometer input, falling edges on PA8. Runs on the high-priority
    //    executor so blocking I2C reads in thread mode cannot delay the stamp.
    interrupt::UART4.set_priority(Priority::P6);
    let high = EXECUTOR_HIGH.start(interrupt::UART4);
    let tacho_in = ExtiInput::new(Input::new(p.PA8, Pull::Up), p.EXTI8);
    high.spawn(tacho_task(tacho_in, &SYSTEM)).unwrap();

    // 8. Telemetry USART3 TX (PB10) @ 115200
    let mut uart_config = UsartConfig::default();
    uart_config.baudrate = TELEMETRY_BAUD;
    let uart_tx = UartTx::new(p.USART3, p.PB10, p.DMA1_CH3, uart_config).unwrap();
    high.spawn(telemetry_task(uart_tx, &SYSTEM, cfg.telemetry_hz))
        .unwrap();

    // 9. Acquisition loop owns the sensors from here on
    let acquisition = Acquisition::new(
        cfg,
        &SYSTEM,
        RigIo {
            load_cell,
            adc,
            pwm,
            button,
            led,
            delay: Delay,
        },
    );
    spawner
        .spawn(acquisition_task(acquisition, UsbConsole::new(usb_serial)))
        .unwrap();
}
