pub mod ads1100;
pub mod feedback_pwm;
pub mod hx711;
