use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::bootstrap::BootstrapError;
use super::clock::{BacklogPolicy, Clock, FrameClock, FrameCounter, StepPolicy};
use super::events::{Display, DisplayError, EventPump, EventSource, LoopEvent};
use super::metrics::MetricsAccumulator;
use super::platform::ToneCue;
use super::rendering::{compute_transform, LogicalViewSize, ViewportTransform};
use super::subsystems::Subsystems;

pub const MAX_STEPS_ENV_VAR: &str = "LOZ_MAX_STEPS_PER_PASS";
pub const BACKLOG_POLICY_ENV_VAR: &str = "LOZ_BACKLOG_POLICY";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub logical_size: LogicalViewSize,
    pub step_policy: StepPolicy,
    pub metrics_log_interval: Duration,
    pub tone_cues: Vec<ToneCue>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Loz".to_string(),
            logical_size: LogicalViewSize::default(),
            step_policy: StepPolicy::default(),
            metrics_log_interval: Duration::from_secs(1),
            tone_cues: ToneCue::defaults(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error(transparent)]
    Display(#[from] DisplayError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error("frame loop failed: {0}")]
    Loop(#[from] LoopError),
}

impl AppError {
    /// Process exit status for this failure; quitting normally exits with 0.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Bootstrap(err) => err.exit_code(),
            AppError::Loop(_) => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Running,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Continue { steps: u64, dirty: bool },
    Quit,
}

/// Everything the frame loop owns for the lifetime of a run.
pub struct LoopContext<E, D, C> {
    // Drops before `events` so the window goes away ahead of its event loop.
    display: D,
    events: E,
    clock: C,
    logical: LogicalViewSize,
    viewport: ViewportTransform,
    frame_clock: FrameClock,
    step_policy: StepPolicy,
    state: RunState,
}

impl<E, D, C> LoopContext<E, D, C>
where
    E: EventSource,
    D: Display,
    C: Clock,
{
    pub fn new(
        events: E,
        display: D,
        clock: C,
        logical: LogicalViewSize,
        viewport: ViewportTransform,
        step_policy: StepPolicy,
    ) -> Self {
        let frame_clock = FrameClock::new(clock.now());
        Self {
            display,
            events,
            clock,
            logical,
            viewport,
            frame_clock,
            step_policy,
            state: RunState::Initializing,
        }
    }

    pub fn frame_counter(&self) -> FrameCounter {
        self.frame_clock.counter()
    }

    pub fn viewport(&self) -> ViewportTransform {
        self.viewport
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn events(&self) -> &E {
        &self.events
    }
}

pub struct FrameScheduler<E, D, C> {
    ctx: LoopContext<E, D, C>,
    subsystems: Subsystems,
    pump: EventPump,
    metrics: MetricsAccumulator,
}

impl<E, D, C> FrameScheduler<E, D, C>
where
    E: EventSource,
    D: Display,
    C: Clock,
{
    pub fn new(
        mut ctx: LoopContext<E, D, C>,
        subsystems: Subsystems,
        metrics_log_interval: Duration,
    ) -> Self {
        let now = ctx.clock.now();
        ctx.frame_clock.restart(now);
        ctx.state = RunState::Running;
        info!(
            step_policy = ?ctx.step_policy,
            logical_width = ctx.logical.width,
            logical_height = ctx.logical.height,
            "loop_config"
        );
        Self {
            ctx,
            subsystems,
            pump: EventPump::new(),
            metrics: MetricsAccumulator::new(now, metrics_log_interval),
        }
    }

    pub fn context(&self) -> &LoopContext<E, D, C> {
        &self.ctx
    }

    pub fn run_loop(&mut self) -> Result<(), LoopError> {
        loop {
            if let PassOutcome::Quit = self.run_pass()? {
                info!(frames = self.ctx.frame_clock.frame_counter(), "shutdown");
                return Ok(());
            }
        }
    }

    /// One host-loop pass: at most one event, every due step, then at most one render.
    pub fn run_pass(&mut self) -> Result<PassOutcome, LoopError> {
        if self.ctx.state == RunState::Terminated {
            return Ok(PassOutcome::Quit);
        }

        let mut dirty = false;

        if !self.ctx.events.is_empty() {
            let event = self
                .pump
                .poll_one(&mut self.ctx.events, &mut self.ctx.display)
                .inspect_err(|error| {
                    warn!(error = %error, "display_resize_failed");
                    self.ctx.state = RunState::Terminated;
                })?;
            match event {
                LoopEvent::Quit => {
                    info!("shutdown_requested");
                    self.ctx.state = RunState::Terminated;
                    return Ok(PassOutcome::Quit);
                }
                LoopEvent::Resize { width, height } => {
                    dirty |= self.apply_resize(width, height);
                }
                LoopEvent::Ignored => {}
            }
        }

        let now = self.ctx.clock.now();
        let plan = self.ctx.frame_clock.plan(now, self.ctx.step_policy);
        if plan.dropped > 0 {
            warn!(dropped_steps = plan.dropped, "sim_backlog_dropped");
        }

        for _ in 0..plan.steps {
            self.ctx.frame_clock.begin_step();
            self.subsystems.input.update();
            self.subsystems.world.update();
            self.subsystems.sound.update();
            self.ctx.frame_clock.finish_step();
        }
        dirty |= plan.steps > 0;

        if dirty {
            self.subsystems
                .world
                .draw(self.subsystems.graphics.as_mut());
            self.ctx
                .display
                .flip(self.subsystems.graphics.as_ref())
                .inspect_err(|error| {
                    warn!(error = %error, "present_failed");
                    self.ctx.state = RunState::Terminated;
                })?;
        }

        self.metrics.record_pass(plan.steps, plan.dropped, dirty);
        if let Some(snapshot) = self.metrics.maybe_snapshot(now) {
            info!(
                passes_per_second = snapshot.passes_per_second,
                steps_per_second = snapshot.steps_per_second,
                renders_per_second = snapshot.renders_per_second,
                dropped_steps = snapshot.dropped_steps,
                frame = self.ctx.frame_clock.frame_counter(),
                "loop_metrics"
            );
        }

        Ok(PassOutcome::Continue {
            steps: plan.steps,
            dirty,
        })
    }

    fn apply_resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            debug!(width, height, "zero_area_resize_ignored");
            return false;
        }

        let viewport = compute_transform(self.ctx.logical, width, height);
        self.ctx.viewport = viewport;
        self.subsystems.graphics.use_viewport(&viewport);
        self.subsystems
            .graphics
            .set_view_params(viewport.view_params());
        info!(
            width,
            height,
            scale = viewport.scale,
            offset_x = viewport.offset_x,
            offset_y = viewport.offset_y,
            "viewport_changed"
        );
        true
    }
}

/// Applies `LOZ_MAX_STEPS_PER_PASS` and `LOZ_BACKLOG_POLICY` on top of the configured policy.
pub fn resolve_step_policy(config_policy: StepPolicy) -> StepPolicy {
    let max_steps = read_env_override(MAX_STEPS_ENV_VAR, |raw| raw.trim().parse::<u32>().ok());
    let backlog = read_env_override(BACKLOG_POLICY_ENV_VAR, parse_backlog_policy);
    apply_step_overrides(config_policy, max_steps, backlog)
}

fn read_env_override<T>(var: &'static str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    match env::var(var) {
        Ok(value) => {
            let parsed = parse(&value);
            if parsed.is_none() {
                warn!(
                    env_var = var,
                    value = value.as_str(),
                    "invalid env var value; falling back to config"
                );
            }
            parsed
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                env_var = var,
                error = %err,
                "unable to read env var; falling back to config"
            );
            None
        }
    }
}

fn parse_backlog_policy(raw: &str) -> Option<BacklogPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "defer" => Some(BacklogPolicy::Defer),
        "drop" => Some(BacklogPolicy::DropBacklog),
        _ => None,
    }
}

fn apply_step_overrides(
    base: StepPolicy,
    max_steps: Option<u32>,
    backlog: Option<BacklogPolicy>,
) -> StepPolicy {
    let base_overflow = match base {
        StepPolicy::Capped { overflow, .. } => overflow,
        StepPolicy::Unbounded => BacklogPolicy::Defer,
    };
    let overflow = backlog.unwrap_or(base_overflow);

    match (max_steps, base) {
        (Some(0), _) => StepPolicy::Unbounded,
        (Some(max_steps_per_pass), _) => StepPolicy::Capped {
            max_steps_per_pass,
            overflow,
        },
        (None, StepPolicy::Unbounded) => StepPolicy::Unbounded,
        (
            None,
            StepPolicy::Capped {
                max_steps_per_pass, ..
            },
        ) => StepPolicy::Capped {
            max_steps_per_pass,
            overflow,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use winit::keyboard::{KeyCode, PhysicalKey};

    use super::*;
    use crate::app::clock::tests::ManualClock;
    use crate::app::events::tests::{RecordingDisplay, ScriptedEvents};
    use crate::app::events::RawEvent;
    use crate::app::rendering::{Graphics, Rgba, ViewParams};
    use crate::app::subsystems::{Input, Sound, World};

    type Log = Rc<RefCell<Vec<String>>>;

    struct RecordingInput(Log);
    impl Input for RecordingInput {
        fn update(&mut self) {
            self.0.borrow_mut().push("input".to_string());
        }
    }

    struct RecordingWorld {
        log: Log,
        counter: Option<FrameCounter>,
    }
    impl World for RecordingWorld {
        fn update(&mut self) {
            let frame = self.counter.as_ref().map(FrameCounter::get).unwrap_or(0);
            self.log.borrow_mut().push(format!("world:{frame}"));
        }

        fn draw(&mut self, _graphics: &mut dyn Graphics) {
            self.log.borrow_mut().push("draw".to_string());
        }
    }

    struct RecordingSound(Log);
    impl Sound for RecordingSound {
        fn update(&mut self) {
            self.0.borrow_mut().push("sound".to_string());
        }
    }

    struct RecordingGraphics {
        log: Log,
        params: Rc<RefCell<Vec<ViewParams>>>,
    }
    impl Graphics for RecordingGraphics {
        fn set_view_params(&mut self, params: ViewParams) {
            self.params.borrow_mut().push(params);
        }

        fn use_viewport(&mut self, _viewport: &ViewportTransform) {
            self.log.borrow_mut().push("viewport".to_string());
        }

        fn clear(&mut self, _color: Rgba) {}

        fn fill_rect(&mut self, _x: i32, _y: i32, _width: u32, _height: u32, _color: Rgba) {}

        fn compose(&self, _target: &mut [u8], _target_width: u32, _target_height: u32) {}
    }

    struct Harness {
        scheduler: FrameScheduler<ScriptedEvents, RecordingDisplay, ManualClock>,
        clock: ManualClock,
        log: Log,
        params: Rc<RefCell<Vec<ViewParams>>>,
    }

    impl Harness {
        fn new(policy: StepPolicy, events: &[RawEvent]) -> Self {
            let clock = ManualClock::default();
            let mut scripted = ScriptedEvents::default();
            for event in events {
                scripted.push(*event);
            }
            let logical = LogicalViewSize::default();
            let ctx = LoopContext::new(
                scripted,
                RecordingDisplay::default(),
                clock.clone(),
                logical,
                compute_transform(logical, 256, 240),
                policy,
            );
            let log: Log = Rc::default();
            let params = Rc::default();
            let subsystems = Subsystems {
                input: Box::new(RecordingInput(log.clone())),
                world: Box::new(RecordingWorld {
                    log: log.clone(),
                    counter: Some(ctx.frame_counter()),
                }),
                sound: Box::new(RecordingSound(log.clone())),
                graphics: Box::new(RecordingGraphics {
                    log: log.clone(),
                    params: Rc::clone(&params),
                }),
            };
            let scheduler = FrameScheduler::new(ctx, subsystems, Duration::from_secs(1));
            Self {
                scheduler,
                clock,
                log,
                params,
            }
        }

        fn take_log(&self) -> Vec<String> {
            std::mem::take(&mut *self.log.borrow_mut())
        }

        fn flips(&self) -> u32 {
            self.scheduler.context().display().flips
        }
    }

    fn escape() -> RawEvent {
        RawEvent::KeyDown(PhysicalKey::Code(KeyCode::Escape))
    }

    #[test]
    fn scheduler_starts_running() {
        let harness = Harness::new(StepPolicy::Unbounded, &[]);
        assert_eq!(harness.scheduler.context().run_state(), RunState::Running);
    }

    #[test]
    fn idle_pass_does_not_render() {
        let mut harness = Harness::new(StepPolicy::Unbounded, &[]);
        harness.clock.advance(Duration::from_millis(10));

        let outcome = harness.scheduler.run_pass().expect("pass");

        assert_eq!(
            outcome,
            PassOutcome::Continue {
                steps: 0,
                dirty: false
            }
        );
        assert!(harness.take_log().is_empty());
        assert_eq!(harness.flips(), 0);
    }

    #[test]
    fn step_updates_in_fixed_order_then_renders_once() {
        let mut harness = Harness::new(StepPolicy::Unbounded, &[]);
        harness.clock.advance(Duration::from_millis(34));

        let outcome = harness.scheduler.run_pass().expect("pass");

        assert_eq!(
            outcome,
            PassOutcome::Continue {
                steps: 2,
                dirty: true
            }
        );
        assert_eq!(
            harness.take_log(),
            vec!["input", "world:1", "sound", "input", "world:2", "sound", "draw"]
        );
        assert_eq!(harness.flips(), 1);
    }

    #[test]
    fn unbounded_policy_catches_up_in_one_pass() {
        let mut harness = Harness::new(StepPolicy::Unbounded, &[]);
        harness.clock.advance(Duration::from_millis(500));

        let outcome = harness.scheduler.run_pass().expect("pass");

        assert_eq!(
            outcome,
            PassOutcome::Continue {
                steps: 30,
                dirty: true
            }
        );
        assert_eq!(harness.flips(), 1);
        assert_eq!(harness.scheduler.context().frame_counter().get(), 30);
    }

    #[test]
    fn capped_policy_spreads_backlog_over_passes() {
        let policy = StepPolicy::Capped {
            max_steps_per_pass: 4,
            overflow: BacklogPolicy::Defer,
        };
        let mut harness = Harness::new(policy, &[]);
        harness.clock.advance(Duration::from_millis(100));

        let first = harness.scheduler.run_pass().expect("first");
        let second = harness.scheduler.run_pass().expect("second");

        assert_eq!(
            first,
            PassOutcome::Continue {
                steps: 4,
                dirty: true
            }
        );
        assert_eq!(
            second,
            PassOutcome::Continue {
                steps: 2,
                dirty: true
            }
        );
        assert_eq!(harness.flips(), 2);
    }

    #[test]
    fn quit_skips_due_steps_and_render() {
        let mut harness = Harness::new(StepPolicy::Unbounded, &[RawEvent::DisplayClose]);
        harness.clock.advance(Duration::from_millis(100));

        let outcome = harness.scheduler.run_pass().expect("pass");

        assert_eq!(outcome, PassOutcome::Quit);
        assert!(harness.take_log().is_empty());
        assert_eq!(harness.flips(), 0);
        assert_eq!(
            harness.scheduler.context().run_state(),
            RunState::Terminated
        );
        assert_eq!(harness.scheduler.run_pass().expect("after"), PassOutcome::Quit);
    }

    #[test]
    fn escape_quit_skips_due_steps_and_render() {
        let mut harness = Harness::new(StepPolicy::Unbounded, &[escape()]);
        harness.clock.advance(Duration::from_millis(100));

        let outcome = harness.scheduler.run_pass().expect("pass");

        assert_eq!(outcome, PassOutcome::Quit);
        assert!(harness.take_log().is_empty());
        assert_eq!(harness.flips(), 0);
        assert_eq!(harness.scheduler.context().frame_counter().get(), 0);
        assert_eq!(
            harness.scheduler.context().run_state(),
            RunState::Terminated
        );
    }

    #[test]
    fn escape_key_terminates_loop() {
        let mut harness = Harness::new(StepPolicy::Unbounded, &[RawEvent::Other, escape()]);

        harness.scheduler.run_loop().expect("loop");

        assert_eq!(harness.scheduler.context().events().waits, 2);
        assert_eq!(
            harness.scheduler.context().run_state(),
            RunState::Terminated
        );
    }

    #[test]
    fn resize_without_steps_recomputes_once_and_renders() {
        let mut harness = Harness::new(
            StepPolicy::Unbounded,
            &[RawEvent::DisplayResize {
                width: 800,
                height: 450,
            }],
        );

        let outcome = harness.scheduler.run_pass().expect("pass");

        assert_eq!(
            outcome,
            PassOutcome::Continue {
                steps: 0,
                dirty: true
            }
        );
        assert_eq!(harness.take_log(), vec!["viewport", "draw"]);
        assert_eq!(
            *harness.params.borrow(),
            vec![ViewParams {
                scale: 1,
                offset_x: 272,
                offset_y: 105
            }]
        );
        assert_eq!(
            harness.scheduler.context().display().acknowledged,
            vec![(800, 450)]
        );
        assert_eq!(harness.scheduler.context().viewport().offset_x, 272);
        assert_eq!(harness.flips(), 1);
    }

    #[test]
    fn zero_area_resize_is_acknowledged_but_not_dirty() {
        let mut harness = Harness::new(
            StepPolicy::Unbounded,
            &[
                RawEvent::DisplayResize {
                    width: 0,
                    height: 0,
                },
                RawEvent::DisplayResize {
                    width: 800,
                    height: 0,
                },
            ],
        );

        let first = harness.scheduler.run_pass().expect("first");
        let second = harness.scheduler.run_pass().expect("second");

        let idle = PassOutcome::Continue {
            steps: 0,
            dirty: false,
        };
        assert_eq!(first, idle);
        assert_eq!(second, idle);
        assert!(harness.params.borrow().is_empty());
        assert_eq!(harness.scheduler.context().viewport().scale, 1);
        assert_eq!(harness.scheduler.context().viewport().offset_x, 0);
        assert_eq!(
            harness.scheduler.context().display().acknowledged,
            vec![(0, 0), (800, 0)]
        );
        assert_eq!(harness.flips(), 0);
    }

    #[test]
    fn at_most_one_event_is_consumed_per_pass() {
        let mut harness = Harness::new(
            StepPolicy::Unbounded,
            &[RawEvent::Other, RawEvent::DisplayClose],
        );

        let first = harness.scheduler.run_pass().expect("first");

        assert_ne!(first, PassOutcome::Quit);
        assert_eq!(harness.scheduler.context().events().queue.len(), 1);
        assert_eq!(harness.scheduler.run_pass().expect("second"), PassOutcome::Quit);
    }

    #[test]
    fn present_failure_terminates_loop() {
        let mut harness = Harness::new(StepPolicy::Unbounded, &[]);
        harness.scheduler.ctx.display.fail_present = true;
        harness.clock.advance(Duration::from_millis(20));

        let result = harness.scheduler.run_pass();

        assert!(matches!(result, Err(LoopError::Display(DisplayError::Present(_)))));
        assert_eq!(
            harness.scheduler.context().run_state(),
            RunState::Terminated
        );
    }

    #[test]
    fn clock_starts_when_scheduler_is_created() {
        let clock = ManualClock::default();
        clock.set(Duration::from_secs(10));
        let logical = LogicalViewSize::default();
        let ctx = LoopContext::new(
            ScriptedEvents::default(),
            RecordingDisplay::default(),
            clock.clone(),
            logical,
            compute_transform(logical, 256, 240),
            StepPolicy::Unbounded,
        );
        clock.set(Duration::from_secs(12));
        let log: Log = Rc::default();
        let subsystems = Subsystems {
            input: Box::new(RecordingInput(log.clone())),
            world: Box::new(RecordingWorld {
                log: log.clone(),
                counter: None,
            }),
            sound: Box::new(RecordingSound(log.clone())),
            graphics: Box::new(RecordingGraphics {
                log: log.clone(),
                params: Rc::default(),
            }),
        };
        let mut scheduler = FrameScheduler::new(ctx, subsystems, Duration::from_secs(1));

        clock.advance(Duration::from_millis(10));
        let outcome = scheduler.run_pass().expect("pass");

        assert_eq!(
            outcome,
            PassOutcome::Continue {
                steps: 0,
                dirty: false
            }
        );
    }

    fn capped_eight() -> StepPolicy {
        StepPolicy::Capped {
            max_steps_per_pass: 8,
            overflow: BacklogPolicy::Defer,
        }
    }

    #[test]
    fn max_steps_zero_means_unbounded() {
        assert_eq!(
            apply_step_overrides(capped_eight(), Some(0), None),
            StepPolicy::Unbounded
        );
    }

    #[test]
    fn overrides_replace_cap_and_backlog_policy() {
        assert_eq!(
            apply_step_overrides(
                StepPolicy::Unbounded,
                Some(3),
                Some(BacklogPolicy::DropBacklog)
            ),
            StepPolicy::Capped {
                max_steps_per_pass: 3,
                overflow: BacklogPolicy::DropBacklog
            }
        );
        assert_eq!(
            apply_step_overrides(capped_eight(), None, Some(BacklogPolicy::DropBacklog)),
            StepPolicy::Capped {
                max_steps_per_pass: 8,
                overflow: BacklogPolicy::DropBacklog
            }
        );
        assert_eq!(
            apply_step_overrides(StepPolicy::Unbounded, None, Some(BacklogPolicy::DropBacklog)),
            StepPolicy::Unbounded
        );
    }

    #[test]
    fn backlog_policy_parses_case_insensitively() {
        assert_eq!(parse_backlog_policy(" Drop "), Some(BacklogPolicy::DropBacklog));
        assert_eq!(parse_backlog_policy("defer"), Some(BacklogPolicy::Defer));
        assert_eq!(parse_backlog_policy("never"), None);
    }

    #[test]
    fn app_error_exit_codes_follow_failure_kind() {
        let startup = AppError::from(BootstrapError {
            stage: crate::app::bootstrap::BootstrapStage::Display,
            source: "no window".into(),
        });
        let presented = AppError::from(LoopError::Display(DisplayError::Present(
            "surface lost".into(),
        )));

        assert_eq!(startup.exit_code(), 15);
        assert_eq!(presented.exit_code(), 1);
    }
}
