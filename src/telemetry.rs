//! Wire telemetry: `<FFF,T.TTT,Q.QQQ>` at a fixed rate on the serial link.
//!
//! `FFF` is the frame id, zero-padded to three digits and wrapping at 1000.
//! Thrust (N) and torque (N·m) carry three decimals and are zero-padded to a
//! minimum width of two. No line terminator.

use core::fmt::Write;

use crate::state::TelemetrySnapshot;

/// Frame ids run `0..FRAME_ID_WRAP`.
pub const FRAME_ID_WRAP: u16 = 1000;

/// Fits two `f32::MAX` fields.
pub const MAX_FRAME_LEN: usize = 96;

pub type Frame = heapless::String<MAX_FRAME_LEN>;

pub fn format_frame(frame_id: u16, thrust_n: f32, torque_nm: f32) -> Frame {
    let mut frame = Frame::new();
    let _ = write!(
        frame,
        "<{:03},{:02.3},{:02.3}>",
        frame_id % FRAME_ID_WRAP,
        thrust_n,
        torque_nm
    );
    frame
}

/// Owns the frame counter. Called once per telemetry tick.
pub struct TelemetryFramer {
    next_id: u16,
}

impl TelemetryFramer {
    pub const fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Id the next frame will carry.
    pub fn frame_id(&self) -> u16 {
        self.next_id
    }

    /// Format the snapshot and advance the counter.
    pub fn next_frame(&mut self, snapshot: TelemetrySnapshot) -> Frame {
        let frame = format_frame(self.next_id, snapshot.thrust_n, snapshot.torque_nm);
        self.next_id = (self.next_id + 1) % FRAME_ID_WRAP;
        frame
    }
}

impl Default for TelemetryFramer {
    fn default() -> Self {
        Self::new()
    }
}
