use std::time::Duration;
use std::time::Instant;

/// Timer tick resolution: 100ns, so that tick values line up with the
/// `QueryPerformanceCounter` based timers DirectX samples usually ship.
pub const TICKS_PER_SECOND: u64 = 10_000_000;

pub fn ticks_to_seconds(ticks: u64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

pub fn seconds_to_ticks(seconds: f64) -> u64 {
    (seconds * TICKS_PER_SECOND as f64) as u64
}

fn duration_to_ticks(duration: Duration) -> u64 {
    duration.as_nanos() as u64 / 100
}

/// Animation and simulation timing helper.
///
/// Runs in variable step mode by default: every [`StepTimer::tick`] calls
/// `update` exactly once with the real delta. In fixed step mode `update` runs
/// zero or more times per tick so that simulation advances in
/// `target_elapsed_ticks` increments.
pub struct StepTimer {
    last_time: Instant,
    max_delta: Duration,

    elapsed_ticks: u64,
    total_ticks: u64,
    left_over_ticks: u64,

    frame_count: u32,
    frames_per_second: u32,
    frames_this_second: u32,
    second_counter: Duration,

    is_fixed_time_step: bool,
    target_elapsed_ticks: u64,
}

impl Default for StepTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepTimer {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub(crate) fn starting_at(now: Instant) -> Self {
        Self {
            last_time: now,
            // Long pauses (debugger breaks, window drags) are clamped to 1/10th of a second.
            max_delta: Duration::from_millis(100),
            elapsed_ticks: 0,
            total_ticks: 0,
            left_over_ticks: 0,
            frame_count: 0,
            frames_per_second: 0,
            frames_this_second: 0,
            second_counter: Duration::ZERO,
            is_fixed_time_step: false,
            target_elapsed_ticks: TICKS_PER_SECOND / 60,
        }
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    pub fn elapsed_seconds(&self) -> f64 {
        ticks_to_seconds(self.elapsed_ticks)
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn total_seconds(&self) -> f64 {
        ticks_to_seconds(self.total_ticks)
    }

    /// Number of updates since the timer was created.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Frames counted during the last full second.
    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    pub fn is_fixed_time_step(&self) -> bool {
        self.is_fixed_time_step
    }

    pub fn set_fixed_time_step(&mut self, is_fixed_time_step: bool) {
        self.is_fixed_time_step = is_fixed_time_step;
    }

    pub fn set_target_elapsed_seconds(&mut self, target_elapsed: f64) {
        self.target_elapsed_ticks = seconds_to_ticks(target_elapsed);
    }

    /// Call after an intentional timing discontinuity (for instance a blocking
    /// IO operation) to avoid the fixed timestep logic attempting a set of
    /// catch-up updates.
    pub fn reset_elapsed_time(&mut self) {
        self.reset_elapsed_time_at(Instant::now());
    }

    pub(crate) fn reset_elapsed_time_at(&mut self, now: Instant) {
        self.last_time = now;
        self.left_over_ticks = 0;
        self.frames_per_second = 0;
        self.frames_this_second = 0;
        self.second_counter = Duration::ZERO;
    }

    /// Advance the timer, calling `update` the appropriate number of times.
    pub fn tick(&mut self, update: impl FnMut(&StepTimer)) {
        self.tick_at(Instant::now(), update);
    }

    pub(crate) fn tick_at(&mut self, now: Instant, mut update: impl FnMut(&StepTimer)) {
        let mut time_delta = now.saturating_duration_since(self.last_time);
        self.last_time = now;
        self.second_counter += time_delta;

        if time_delta > self.max_delta {
            time_delta = self.max_delta;
        }

        let mut delta_ticks = duration_to_ticks(time_delta);
        let last_frame_count = self.frame_count;

        if self.is_fixed_time_step {
            // If the app is running very close to the target elapsed time (within 1/4 of a
            // millisecond) just clamp the clock to exactly match the target value. This
            // prevents tiny and irrelevant errors from accumulating over time.
            if delta_ticks.abs_diff(self.target_elapsed_ticks) < TICKS_PER_SECOND / 4000 {
                delta_ticks = self.target_elapsed_ticks;
            }

            self.left_over_ticks += delta_ticks;

            while self.target_elapsed_ticks > 0 && self.left_over_ticks >= self.target_elapsed_ticks {
                self.elapsed_ticks = self.target_elapsed_ticks;
                self.total_ticks += self.target_elapsed_ticks;
                self.left_over_ticks -= self.target_elapsed_ticks;
                self.frame_count += 1;

                update(self);
            }
        } else {
            self.elapsed_ticks = delta_ticks;
            self.total_ticks += delta_ticks;
            self.left_over_ticks = 0;
            self.frame_count += 1;

            update(self);
        }

        if self.frame_count != last_frame_count {
            self.frames_this_second += 1;
        }

        if self.second_counter >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_this_second;
            self.frames_this_second = 0;
            self.second_counter =
                Duration::from_nanos((self.second_counter.as_nanos() % 1_000_000_000) as u64);
        }
    }
}
