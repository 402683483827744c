use blackbox::sensors::{SensorError, TorqueAdc};
use embassy_stm32::i2c::{I2c, Instance, RxDma, TxDma};

/// ADS1100A3.
pub const ADDR: u8 = 0x4B;
/// Continuous conversion, 16 SPS (14-bit result), PGA ×1.
pub const CONFIG_16SPS_GAIN1: u8 = 0x08;

/// ADS1100 on its own I²C bus. Reads return the two result bytes followed by
/// the config register.
pub struct Ads1100<'d, T: Instance, Tx, Rx> {
    i2c: I2c<'d, T, Tx, Rx>,
}

impl<'d, T: Instance, Tx: TxDma<T>, Rx: RxDma<T>> Ads1100<'d, T, Tx, Rx> {
    pub fn new(i2c: I2c<'d, T, Tx, Rx>) -> Self {
        Self { i2c }
    }

    pub fn configure(&mut self, config: u8) -> Result<(), SensorError> {
        self.i2c
            .blocking_write(ADDR, &[config])
            .map_err(|_| SensorError::AdcBus)
    }
}

impl<'d, T: Instance, Tx: TxDma<T>, Rx: RxDma<T>> TorqueAdc for Ads1100<'d, T, Tx, Rx> {
    async fn read_frame(&mut self) -> Result<[u8; 3], SensorError> {
        let mut buf = [0u8; 3];
        self.i2c
            .blocking_read(ADDR, &mut buf)
            .map_err(|_| SensorError::AdcBus)?;
        Ok(buf)
    }
}
