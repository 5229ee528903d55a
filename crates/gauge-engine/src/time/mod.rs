//! Frame timing.
//!
//! One `FrameClock` per display surface; call `tick()` once per host frame
//! callback.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
