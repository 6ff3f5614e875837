mod bootstrap;
mod clock;
mod events;
mod input;
mod loop_runner;
mod metrics;
mod platform;
mod rendering;
mod subsystems;

pub use bootstrap::{bootstrap, BootstrapError, BootstrapStage, Booted, StageError, StartupPlatform};
pub use clock::{
    BacklogPolicy, Clock, FrameClock, FrameCounter, StepPlan, StepPolicy, SystemClock,
    FIXED_TIMESTEP, STEPS_PER_SECOND,
};
pub use events::{classify, Display, DisplayError, EventPump, EventSource, LoopEvent, RawEvent};
pub use input::{InputAction, InputHandle, InputSnapshot, KeyboardInput, KeyboardState};
pub use loop_runner::{
    resolve_step_policy, AppError, FrameScheduler, LoopConfig, LoopContext, LoopError,
    PassOutcome, RunState, BACKLOG_POLICY_ENV_VAR, MAX_STEPS_ENV_VAR,
};
pub use metrics::LoopMetricsSnapshot;
pub use platform::{
    run_desktop, square_wave_wav, DesktopError, DesktopPlatform, KiraSound, PixelsDisplay,
    SoundQueue, ToneCue, WinitEventQueue, WorldWiring, TONE_SAMPLE_RATE,
};
pub use rendering::{
    compute_transform, ClipRect, Graphics, LogicalViewSize, Rgba, SoftwareGraphics, ViewParams,
    ViewportTransform,
};
pub use subsystems::{Input, Sound, Subsystems, World};
