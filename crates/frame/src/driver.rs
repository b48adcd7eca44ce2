use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use skyfield_common::{FrameTime, PerspectiveCamera};
use skyfield_input::OrbitControls;
use skyfield_render::{FrameView, Renderer};
use skyfield_scene::Scene;

use crate::clock::{Clock, MonotonicTime, TimeSource};

/// Shared flag that stops a [`FrameLoop`] before its next tick.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What the host reports when asked for the next refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// A refresh is due; run one tick.
    Frame,
    /// The host is going away.
    Teardown,
}

/// The host's "call me on the next refresh" primitive.
pub trait FrameHost {
    /// Block (or yield) until the next refresh, then report it.
    fn next_frame(&mut self) -> HostSignal;
}

/// Host that grants a fixed number of frames, then tears down.
#[derive(Debug, Clone, Copy)]
pub struct FixedFrames {
    remaining: u64,
}

impl FixedFrames {
    pub fn new(frames: u64) -> Self {
        Self { remaining: frames }
    }
}

impl FrameHost for FixedFrames {
    fn next_frame(&mut self) -> HostSignal {
        match self.remaining.checked_sub(1) {
            Some(rest) => {
                self.remaining = rest;
                HostSignal::Frame
            }
            None => HostSignal::Teardown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    HostTeardown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::HostTeardown => f.write_str("host teardown"),
        }
    }
}

/// Lifecycle of a frame loop: `Idle → Running → Stopped`. Stopped is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped(StopReason),
}

/// Errors from driving a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame loop stopped: {0}")]
    Stopped(StopReason),
    #[error("render failed: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// State the loop works on each tick: the scene, its camera, the controls.
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
}

impl FrameContext {
    /// Place the camera and controls as the scene's camera config asks.
    pub fn new(scene: Scene) -> Self {
        let cfg = *scene.camera_config();
        let camera = PerspectiveCamera {
            position: cfg.position,
            target: cfg.target,
            fov: cfg.fov_degrees.to_radians(),
            near: cfg.near,
            far: cfg.far,
            ..PerspectiveCamera::default()
        };
        let controls = OrbitControls::new(cfg.enable_damping, cfg.damping_factor);
        Self {
            scene,
            camera,
            controls,
        }
    }

    /// Propagate a new viewport size to the camera and the sky uniforms.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
        self.scene.set_resolution(width, height);
    }
}

/// Drives ticks: clock, time uniforms, controls, draw.
///
/// The loop does not own the scene or the renderer; both are lent to each
/// tick so a windowing host can drive it from its own event callbacks.
#[derive(Debug)]
pub struct FrameLoop<S = MonotonicTime> {
    clock: Clock<S>,
    state: LoopState,
    cancel: CancelToken,
    last_frame: Option<FrameTime>,
}

impl FrameLoop<MonotonicTime> {
    pub fn monotonic() -> Self {
        Self::new(MonotonicTime::new())
    }
}

impl<S: TimeSource> FrameLoop<S> {
    pub fn new(source: S) -> Self {
        Self {
            clock: Clock::new(source),
            state: LoopState::Idle,
            cancel: CancelToken::new(),
            last_frame: None,
        }
    }

    /// Token that stops this loop; clone it into whatever handles shutdown.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn clock(&self) -> &Clock<S> {
        &self.clock
    }

    pub fn last_frame(&self) -> Option<FrameTime> {
        self.last_frame
    }

    /// Stop the loop. Later ticks fail with [`FrameError::Stopped`].
    pub fn stop(&mut self, reason: StopReason) {
        if !matches!(self.state, LoopState::Stopped(_)) {
            tracing::info!(%reason, frames = self.clock.frames(), "frame loop stopped");
            self.state = LoopState::Stopped(reason);
        }
    }

    /// Run one tick:
    /// 1. read the clock,
    /// 2. write `u_time` into the scene's time-driven materials,
    /// 3. ease the orbit controls into the camera,
    /// 4. draw.
    pub fn tick<R: Renderer>(
        &mut self,
        ctx: &mut FrameContext,
        renderer: &mut R,
    ) -> Result<FrameTime, FrameError> {
        if self.cancel.is_cancelled() {
            self.stop(StopReason::Cancelled);
        }
        match self.state {
            LoopState::Stopped(reason) => return Err(FrameError::Stopped(reason)),
            LoopState::Idle => {
                tracing::info!(scene = ctx.scene.name(), "frame loop started");
                self.state = LoopState::Running;
            }
            LoopState::Running => {}
        }

        let time = self.clock.tick();
        let u_time = ctx.scene.apply_time(time.elapsed);
        ctx.controls.update(&mut ctx.camera);

        let view = FrameView {
            time,
            scene: &ctx.scene,
            camera: &ctx.camera,
        };
        renderer
            .render(&view)
            .map_err(|e| FrameError::Render(Box::new(e)))?;

        tracing::trace!(
            frame = time.index,
            elapsed = time.elapsed,
            delta = time.delta,
            u_time,
            "tick"
        );
        self.last_frame = Some(time);
        Ok(time)
    }

    /// Tick once per host refresh until cancelled or the host tears down.
    /// Render errors end the run and are returned.
    pub fn run<H: FrameHost, R: Renderer>(
        &mut self,
        host: &mut H,
        ctx: &mut FrameContext,
        renderer: &mut R,
    ) -> Result<StopReason, FrameError> {
        loop {
            if let LoopState::Stopped(reason) = self.state {
                return Ok(reason);
            }
            if self.cancel.is_cancelled() {
                self.stop(StopReason::Cancelled);
                continue;
            }
            match host.next_frame() {
                HostSignal::Teardown => self.stop(StopReason::HostTeardown),
                HostSignal::Frame => match self.tick(ctx, renderer) {
                    Ok(_) | Err(FrameError::Stopped(_)) => {}
                    Err(e) => return Err(e),
                },
            }
        }
    }
}
