//! Frame loop: monotonic clock, per-tick uniform updates, draw submission.
//!
//! # Invariants
//! - Elapsed time never decreases; every delta is >= 0.
//! - `u_time` equals elapsed seconds times the scene's time scale after each tick.
//! - Ticks run in a fixed order: clock, uniforms, controls, draw.
//! - The loop only stops on cancellation or host teardown, never on its own.

pub mod clock;
pub mod driver;

pub use clock::{Clock, ManualTime, MonotonicTime, ScriptedTime, TimeSource};
pub use driver::{
    CancelToken, FixedFrames, FrameContext, FrameError, FrameHost, FrameLoop, HostSignal, LoopState,
    StopReason,
};
