use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const STEPS_PER_SECOND: u32 = 60;
pub const FIXED_TIMESTEP: Duration = Duration::from_nanos(NANOS_PER_SECOND as u64 / 60);

const NANOS_PER_SECOND: u128 = 1_000_000_000;

pub trait Clock {
    /// Monotonic time since an arbitrary origin fixed at construction.
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }
}

/// Read-only view of the simulation frame counter. Wraps at `u32::MAX`.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    value: Rc<Cell<u32>>,
}

impl FrameCounter {
    pub fn get(&self) -> u32 {
        self.value.get()
    }

    fn increment(&self) {
        self.value.set(self.value.get().wrapping_add(1));
    }

    #[cfg(test)]
    pub(crate) fn set_for_test(&self, value: u32) {
        self.value.set(value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklogPolicy {
    /// Run the capped number of steps now and keep the rest owed for later passes.
    Defer,
    /// Skip every whole overdue step beyond the cap; the fractional remainder is kept.
    DropBacklog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    Unbounded,
    Capped {
        max_steps_per_pass: u32,
        overflow: BacklogPolicy,
    },
}

impl Default for StepPolicy {
    /// Every due step runs in the pass it becomes due; caps are opt-in.
    fn default() -> Self {
        StepPolicy::Unbounded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub steps: u64,
    pub dropped: u64,
}

/// Fixed-timestep time base. Due steps are derived from whole nanoseconds so
/// the owed step count is always `floor(elapsed / timestep)` exactly.
#[derive(Debug)]
pub struct FrameClock {
    start: Duration,
    steps_since_start: u64,
    counter: FrameCounter,
}

impl FrameClock {
    pub fn new(start: Duration) -> Self {
        Self {
            start,
            steps_since_start: 0,
            counter: FrameCounter::default(),
        }
    }

    pub fn counter(&self) -> FrameCounter {
        self.counter.clone()
    }

    pub fn frame_counter(&self) -> u32 {
        self.counter.get()
    }

    /// Time reference of the next step that has not been run yet.
    pub fn start_time(&self) -> Duration {
        let consumed_nanos =
            self.steps_since_start as u128 * NANOS_PER_SECOND / STEPS_PER_SECOND as u128;
        self.start + nanos_to_duration(consumed_nanos)
    }

    pub fn due_steps(&self, now: Duration) -> u64 {
        let elapsed = now.saturating_sub(self.start).as_nanos();
        let total = elapsed * STEPS_PER_SECOND as u128 / NANOS_PER_SECOND;
        let total = u64::try_from(total).unwrap_or(u64::MAX);
        total.saturating_sub(self.steps_since_start)
    }

    pub fn plan(&mut self, now: Duration, policy: StepPolicy) -> StepPlan {
        let due = self.due_steps(now);
        match policy {
            StepPolicy::Unbounded => StepPlan {
                steps: due,
                dropped: 0,
            },
            StepPolicy::Capped {
                max_steps_per_pass,
                overflow,
            } => {
                let cap = u64::from(max_steps_per_pass.max(1));
                if due <= cap {
                    return StepPlan {
                        steps: due,
                        dropped: 0,
                    };
                }
                match overflow {
                    BacklogPolicy::Defer => StepPlan {
                        steps: cap,
                        dropped: 0,
                    },
                    BacklogPolicy::DropBacklog => {
                        let dropped = due - cap;
                        self.steps_since_start = self.steps_since_start.saturating_add(dropped);
                        StepPlan {
                            steps: cap,
                            dropped,
                        }
                    }
                }
            }
        }
    }

    /// Moves the start reference to `now` without touching the frame counter.
    pub(crate) fn restart(&mut self, now: Duration) {
        self.start = now;
        self.steps_since_start = 0;
    }

    /// Marks the start of one simulation step: bumps the frame counter.
    pub(crate) fn begin_step(&mut self) {
        self.counter.increment();
    }

    /// Advances the start reference by one timestep once the step's updates ran.
    pub(crate) fn finish_step(&mut self) {
        self.steps_since_start = self.steps_since_start.saturating_add(1);
    }
}

fn nanos_to_duration(nanos: u128) -> Duration {
    let secs = (nanos / NANOS_PER_SECOND) as u64;
    let subsec = (nanos % NANOS_PER_SECOND) as u32;
    Duration::new(secs, subsec)
}
