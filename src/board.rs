//! Clock tree and wiring of the black box carrier board.
//!
//! | signal            | pin   | peripheral        |
//! |-------------------|-------|-------------------|
//! | status LED        | PC13  | GPIO out          |
//! | zero button       | PB5   | GPIO in, pull-up  |
//! | HX711 SCK / DOUT  | PB6 / PB7 | GPIO bit-bang |
//! | ADS1100 SCL / SDA | PB8 / PB9 | I2C1          |
//! | tachometer in     | PA8   | EXTI8, falling    |
//! | feedback PWM      | PB0   | TIM3 CH3          |
//! | telemetry TX      | PB10  | USART3            |
//! | debug console     | PA11 / PA12 | USB OTG FS  |

use embassy_stm32::rcc::*;
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::Config;

pub const I2C_FREQ: TimeHertz = TimeHertz(100_000);
pub const TELEMETRY_BAUD: u32 = 115_200;
pub const FEEDBACK_PWM_FREQ: TimeHertz = TimeHertz(100_000);

pub struct Board {
    pub p: embassy_stm32::Peripherals,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: TimeHertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        // 8 MHz / 4 x 168 = 336 MHz VCO; P gives SYSCLK, Q the OTG FS clock.
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2),
            divq: Some(PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        // APB1 42 MHz (I2C1, USART3, TIM3), APB2 84 MHz.
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        Self {
            p: embassy_stm32::init(config),
        }
    }
}
