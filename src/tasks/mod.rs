pub mod acquisition_task;
pub mod tacho_task;
pub mod telemetry_task;
