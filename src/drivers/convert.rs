#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::RigConfig;

/// Full-scale value of the 16-bit PWM duty register.
pub const DUTY_MAX: f32 = 65_535.0;

/// Linear map of `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// Not clamped: inputs outside the source range extrapolate past the target
/// range. Callers that feed a bounded register clamp on their side.
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (value - in_min) / (in_max - in_min) * (out_max - out_min)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f32, decimals: u32) -> f32 {
    let scale = 10f32.powi(decimals as i32);
    (value * scale).round() / scale
}

/// ADS1100 result register (bytes 0-1, big-endian, sign-extended) to volts.
/// Byte 2 is the config echo and is ignored.
pub fn adc_voltage(frame: [u8; 3], cfg: &RigConfig) -> f32 {
    let code = i16::from_be_bytes([frame[0], frame[1]]);
    (cfg.adc_full_scale_v / cfg.adc_counts) * code as f32
}

/// Tachometer frequency to PWM duty. The float-to-int cast saturates, which
/// stands in for the width of the duty register: above `max_hz` pins to
/// full duty, negative or NaN to zero.
pub fn duty_from_frequency(frequency_hz: f32, max_hz: f32) -> u16 {
    map_range(frequency_hz, 0.0, max_hz, 0.0, DUTY_MAX) as u16
}

pub fn rpm(frequency_hz: f32) -> f32 {
    frequency_hz * 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn map_range_hits_both_endpoints() {
        assert!(close(map_range(0.4, 0.4, 4.5, 0.0, 44.39), 0.0));
        assert!(close(map_range(4.5, 0.4, 4.5, 0.0, 44.39), 44.39));
        assert!(close(map_range(0.0, 0.0, 416.666, 0.0, DUTY_MAX), 0.0));
        assert!(close(map_range(416.666, 0.0, 416.666, 0.0, DUTY_MAX), DUTY_MAX));
    }

    #[test]
    fn map_range_is_monotonic() {
        let mut prev = f32::MIN;
        for i in 0..100 {
            let v = map_range(i as f32 * 0.05, 0.3, 4.5, 0.0, 44.39);
            assert!(v > prev);
            prev = v;
        }
    }

    #[test]
    fn map_range_extrapolates() {
        assert!(map_range(0.2, 0.3, 4.5, 0.0, 44.39) < 0.0);
        assert!(map_range(5.0, 0.3, 4.5, 0.0, 44.39) > 44.39);
    }

    #[test]
    fn round_to_decimals() {
        assert!(close(round_to(1.23456, 3), 1.235));
        assert!(close(round_to(-0.0049, 2), 0.0));
        assert!(close(round_to(2.0, 3), 2.0));
    }

    #[test]
    fn adc_code_to_volts() {
        let cfg = RigConfig::DEFAULT;
        // 0x2000 = 8192 counts = half of 5 V span
        assert!(close(adc_voltage([0x20, 0x00, 0x8C], &cfg), 2.5));
        assert!(close(adc_voltage([0x00, 0x00, 0xFF], &cfg), 0.0));
        // byte 2 never matters
        assert_eq!(
            adc_voltage([0x12, 0x34, 0x00], &cfg),
            adc_voltage([0x12, 0x34, 0xFF], &cfg)
        );
    }

    #[test]
    fn negative_adc_swing_reads_negative() {
        let cfg = RigConfig::DEFAULT;
        assert!(adc_voltage([0xFF, 0xF0, 0x00], &cfg) < 0.0);
    }

    #[test]
    fn codes_from_0x8000_up_are_negative() {
        let cfg = RigConfig::DEFAULT;
        // Top bit set is the sign, never a reading above full scale.
        assert!(close(adc_voltage([0x80, 0x00, 0x00], &cfg), -5.0 * 32_768.0 / 16_384.0));
        assert!(close(adc_voltage([0xFF, 0xFF, 0x00], &cfg), -5.0 / 16_384.0));
        assert!(adc_voltage([0x80, 0x00, 0x00], &cfg) < adc_voltage([0xFF, 0xFF, 0x00], &cfg));
        // Largest positive code stays positive.
        assert!(close(adc_voltage([0x7F, 0xFF, 0x00], &cfg), 5.0 * 32_767.0 / 16_384.0));
    }

    #[test]
    fn duty_saturates_at_register_width() {
        let max_hz = RigConfig::DEFAULT.max_frequency();
        assert_eq!(duty_from_frequency(0.0, max_hz), 0);
        assert_eq!(duty_from_frequency(max_hz, max_hz), u16::MAX);
        assert_eq!(duty_from_frequency(max_hz * 3.0, max_hz), u16::MAX);
        assert_eq!(duty_from_frequency(-10.0, max_hz), 0);
        assert_eq!(duty_from_frequency(f32::NAN, max_hz), 0);
        let half = duty_from_frequency(max_hz / 2.0, max_hz);
        assert!((32_766..=32_768).contains(&half));
    }

    #[test]
    fn rpm_from_hz() {
        assert!(close(rpm(200.0), 12_000.0));
    }
}
