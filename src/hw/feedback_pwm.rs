use blackbox::sensors::FeedbackPwm;
use embassy_stm32::gpio::OutputType;
use embassy_stm32::peripherals::{PB0, TIM3};
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::timer::{Channel, CountingMode};

use crate::board::FEEDBACK_PWM_FREQ;

/// Tachometer proxy output on TIM3 CH3 (PB0). Takes a full-scale 16-bit duty
/// and rescales it onto the timer's reload value.
pub struct FeedbackPwmOut {
    pwm: SimplePwm<'static, TIM3>,
    max_duty: u16,
}

impl FeedbackPwmOut {
    pub fn new(tim: TIM3, pin: PB0) -> Self {
        let ch3 = PwmPin::new_ch3(pin, OutputType::PushPull);
        let mut pwm = SimplePwm::new(
            tim,
            None,
            None,
            Some(ch3),
            None,
            FEEDBACK_PWM_FREQ,
            CountingMode::EdgeAlignedUp,
        );
        let max_duty = pwm.get_max_duty();
        pwm.set_duty(Channel::Ch3, 0);
        pwm.enable(Channel::Ch3);
        Self { pwm, max_duty }
    }
}

impl FeedbackPwm for FeedbackPwmOut {
    fn set_duty_u16(&mut self, duty: u16) {
        let scaled = duty as u32 * self.max_duty as u32 / u16::MAX as u32;
        self.pwm.set_duty(Channel::Ch3, scaled as u16);
    }
}
