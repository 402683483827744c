use blackbox::state::SystemState;
use embassy_executor::task;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::peripherals::PA8;
use embassy_time::Instant;

/// Tachometer edge task. Timestamps every falling edge on PA8.
/// Spawned on the interrupt executor, so it runs straight out of the EXTI
/// wake-up even while thread mode sits in a blocking bus transfer.
/// Nothing but the timestamp and the division happen here.
#[task]
pub async fn tacho_task(mut tacho_in: ExtiInput<'static, PA8>, shared: &'static SystemState) {
    loop {
        tacho_in.wait_for_falling_edge().await;
        shared.record_tacho_edge(Instant::now().as_micros());
    }
}
