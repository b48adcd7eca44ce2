use std::time::Instant;

use skyfield_common::FrameTime;

/// Source of "seconds since start" readings.
pub trait TimeSource {
    fn now(&mut self) -> f64;
}

/// Wall-clock source backed by [`Instant`].
///
/// The clock starts on the first reading, so the first frame sees zero no
/// matter how long setup took after construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicTime {
    start: Option<Instant>,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&mut self) -> f64 {
        self.start
            .get_or_insert_with(Instant::now)
            .elapsed()
            .as_secs_f64()
    }
}

/// Source that only moves when told to.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualTime {
    now: f64,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, seconds: f64) {
        self.now = seconds;
    }

    pub fn advance(&mut self, seconds: f64) {
        self.now += seconds;
    }
}

impl TimeSource for ManualTime {
    fn now(&mut self) -> f64 {
        self.now
    }
}

#[derive(Debug, Clone)]
enum Script {
    Samples(Vec<f64>),
    /// `count` readings `step` apart, generated on demand.
    Steps { step: f64, count: u64 },
}

/// Source that replays a fixed script of readings, one per call, then repeats
/// the last one. An empty script always reads zero.
#[derive(Debug, Clone)]
pub struct ScriptedTime {
    script: Script,
    next: u64,
}

impl ScriptedTime {
    pub fn new(samples: impl Into<Vec<f64>>) -> Self {
        Self {
            script: Script::Samples(samples.into()),
            next: 0,
        }
    }

    /// `frames` readings spaced evenly at `fps`, starting at zero.
    pub fn at_fps(fps: f64, frames: u64) -> Self {
        let step = if fps > 0.0 { 1.0 / fps } else { 0.0 };
        Self {
            script: Script::Steps { step, count: frames },
            next: 0,
        }
    }

    fn reading(&self, index: u64) -> Option<f64> {
        match &self.script {
            Script::Samples(samples) => {
                let last = samples.len().checked_sub(1)?;
                let index = usize::try_from(index).map_or(last, |i| i.min(last));
                Some(samples[index])
            }
            Script::Steps { step, count } => {
                let last = count.checked_sub(1)?;
                Some(index.min(last) as f64 * *step)
            }
        }
    }
}

impl Default for ScriptedTime {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TimeSource for ScriptedTime {
    fn now(&mut self) -> f64 {
        let Some(sample) = self.reading(self.next) else {
            return 0.0;
        };
        self.next = self.next.saturating_add(1);
        sample
    }
}

/// Monotonic elapsed-time counter.
///
/// Starts at zero. Each tick records the previous reading and the new one.
/// Readings that go backwards (or are NaN) are held at the previous value, so
/// `delta` is never negative.
#[derive(Debug, Clone)]
pub struct Clock<S = MonotonicTime> {
    source: S,
    elapsed: f64,
    last_elapsed: f64,
    frames: u64,
}

impl Clock<MonotonicTime> {
    pub fn monotonic() -> Self {
        Self::new(MonotonicTime::new())
    }
}

impl<S: TimeSource> Clock<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            elapsed: 0.0,
            last_elapsed: 0.0,
            frames: 0,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn last_elapsed(&self) -> f64 {
        self.last_elapsed
    }

    pub fn delta(&self) -> f64 {
        self.elapsed - self.last_elapsed
    }

    /// Number of ticks taken so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Read the source and advance.
    pub fn tick(&mut self) -> FrameTime {
        let now = self.source.now();
        self.advance_to(now)
    }

    /// Advance to an externally supplied reading.
    pub fn advance_to(&mut self, seconds: f64) -> FrameTime {
        let now = if seconds >= self.elapsed {
            seconds
        } else {
            tracing::debug!(
                reading = seconds,
                elapsed = self.elapsed,
                "time source went backwards; holding"
            );
            self.elapsed
        };

        self.last_elapsed = self.elapsed;
        self.elapsed = now;

        let time = FrameTime {
            index: self.frames,
            elapsed: self.elapsed,
            delta: self.delta(),
        };
        self.frames += 1;
        time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn three_refresh_callbacks() {
        let mut clock = Clock::new(ManualTime::new());
        let deltas: Vec<f64> = [0.0, 0.016, 0.033]
            .into_iter()
            .map(|t| clock.advance_to(t).delta)
            .collect();
        assert!(approx(deltas[0], 0.0));
        assert!(approx(deltas[1], 0.016));
        assert!(approx(deltas[2], 0.017));
        assert_eq!(clock.frames(), 3);
        assert_eq!(clock.last_elapsed(), 0.016);
    }

    #[test]
    fn backwards_reading_is_held() {
        let mut clock = Clock::new(ManualTime::new());
        clock.advance_to(1.0);
        let ft = clock.advance_to(0.5);
        assert_eq!(ft.elapsed, 1.0);
        assert_eq!(ft.delta, 0.0);

        let ft = clock.advance_to(f64::NAN);
        assert_eq!(ft.elapsed, 1.0);
        assert_eq!(ft.delta, 0.0);
    }

    #[test]
    fn monotonic_over_noisy_source() {
        let mut clock = Clock::new(ScriptedTime::new(vec![
            0.0, 0.2, 0.1, 0.4, 0.4, 0.39, 1.0,
        ]));
        let mut prev = 0.0;
        for _ in 0..7 {
            let ft = clock.tick();
            assert!(ft.elapsed >= prev);
            assert!(ft.delta >= 0.0);
            prev = ft.elapsed;
        }
        assert_eq!(clock.elapsed(), 1.0);
    }

    #[test]
    fn tick_reads_source() {
        let mut clock = Clock::new(ManualTime::new());
        clock.source_mut().advance(0.25);
        let ft = clock.tick();
        assert_eq!(ft.index, 0);
        assert_eq!(ft.elapsed, 0.25);
        assert_eq!(ft.delta, 0.25);
    }

    #[test]
    fn scripted_time_repeats_last_sample() {
        let mut source = ScriptedTime::at_fps(10.0, 3);
        let readings: Vec<f64> = (0..5).map(|_| source.now()).collect();
        assert!(approx(readings[1], 0.1));
        assert!(approx(readings[2], 0.2));
        assert!(approx(readings[4], 0.2));

        assert_eq!(ScriptedTime::default().now(), 0.0);
        assert_eq!(ScriptedTime::at_fps(60.0, 0).now(), 0.0);
    }

    #[test]
    fn long_scripts_are_generated_lazily() {
        let mut source = ScriptedTime::at_fps(50.0, u64::MAX);
        let readings: Vec<f64> = (0..1000).map(|_| source.now()).collect();
        assert_eq!(readings[0], 0.0);
        assert!(approx(readings[1], 0.02));
        assert!(approx(readings[999], 19.98));
    }

    #[test]
    fn monotonic_time_starts_on_first_reading() {
        let mut clock = Clock::monotonic();
        std::thread::sleep(std::time::Duration::from_millis(50));
        let first = clock.tick();
        assert!(first.elapsed < 0.01, "first elapsed {}", first.elapsed);
        assert!(first.delta < 0.01, "first delta {}", first.delta);

        std::thread::sleep(std::time::Duration::from_millis(20));
        let second = clock.tick();
        assert!(second.delta >= 0.02);
    }

    #[test]
    fn monotonic_source_never_decreases() {
        let mut clock = Clock::monotonic();
        let a = clock.tick();
        let b = clock.tick();
        assert!(b.elapsed >= a.elapsed);
        assert!(b.delta >= 0.0);
    }
}
