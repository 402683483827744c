use blackbox::state::SystemState;
use blackbox::telemetry::TelemetryFramer;
use embassy_executor::task;
use embassy_stm32::peripherals::{DMA1_CH3, USART3};
use embassy_stm32::usart::UartTx;
use embassy_time::{Duration, Ticker};

/// Telemetry task — one frame per tick on USART3, independent of how fast
/// the acquisition loop runs. During a calibration the frames repeat the
/// values from before it started.
#[task]
pub async fn telemetry_task(
    mut uart_tx: UartTx<'static, USART3, DMA1_CH3>,
    shared: &'static SystemState,
    rate_hz: u64,
) {
    let mut framer = TelemetryFramer::new();
    let mut ticker = Ticker::every(Duration::from_hz(rate_hz));
    let mut dropped: u32 = 0;

    loop {
        ticker.next().await;

        let frame = framer.next_frame(shared.telemetry.get());
        if uart_tx.write(frame.as_bytes()).await.is_err() {
            dropped = dropped.wrapping_add(1);
            defmt::debug!("telemetry frame dropped ({} total)", dropped);
        }
    }
}
