use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub passes_per_second: f32,
    pub steps_per_second: f32,
    pub renders_per_second: f32,
    pub dropped_steps: u64,
}

/// Counts loop activity and emits a rate snapshot once per interval.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Duration,
    interval: Duration,
    passes: u32,
    steps: u64,
    renders: u32,
    dropped_steps: u64,
}

impl MetricsAccumulator {
    pub(crate) fn new(now: Duration, interval: Duration) -> Self {
        Self {
            interval_start: now,
            interval,
            passes: 0,
            steps: 0,
            renders: 0,
            dropped_steps: 0,
        }
    }

    pub(crate) fn record_pass(&mut self, steps: u64, dropped: u64, rendered: bool) {
        self.passes = self.passes.saturating_add(1);
        self.steps = self.steps.saturating_add(steps);
        self.dropped_steps = self.dropped_steps.saturating_add(dropped);
        if rendered {
            self.renders = self.renders.saturating_add(1);
        }
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Duration) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_sub(self.interval_start);
        if self.interval.is_zero() || elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let snapshot = LoopMetricsSnapshot {
            passes_per_second: self.passes as f32 / elapsed_seconds,
            steps_per_second: self.steps as f32 / elapsed_seconds,
            renders_per_second: self.renders as f32 / elapsed_seconds,
            dropped_steps: self.dropped_steps,
        };

        self.interval_start = now;
        self.passes = 0;
        self.steps = 0;
        self.renders = 0;
        self.dropped_steps = 0;

        Some(snapshot)
    }
}
