//! Thrust/torque black box: hardware-independent acquisition core.
//!
//! The firmware binaries wire these pieces to the STM32 peripherals; everything
//! here is `no_std` and runs unchanged in host unit tests.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod acquisition;
pub mod calibration;
pub mod config;
pub mod drivers;
pub mod sensors;
pub mod state;
pub mod telemetry;
