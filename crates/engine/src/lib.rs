pub mod app;

pub use winit::keyboard::{KeyCode, PhysicalKey};

pub use app::{
    bootstrap, classify, compute_transform, resolve_step_policy, run_desktop, square_wave_wav,
    AppError, BacklogPolicy, Booted, BootstrapError, BootstrapStage, ClipRect, Clock,
    DesktopError, DesktopPlatform, Display, DisplayError, EventPump, EventSource, FrameClock,
    FrameCounter, FrameScheduler, Graphics, Input, InputAction, InputHandle, InputSnapshot,
    KeyboardInput, KeyboardState, KiraSound, LogicalViewSize, LoopConfig, LoopContext, LoopError,
    LoopEvent, LoopMetricsSnapshot, PassOutcome, PixelsDisplay, RawEvent, Rgba, RunState,
    SoftwareGraphics, Sound, SoundQueue, StageError, StartupPlatform, StepPlan, StepPolicy,
    Subsystems, SystemClock, ToneCue, ViewParams, ViewportTransform, WinitEventQueue, World,
    WorldWiring, BACKLOG_POLICY_ENV_VAR, FIXED_TIMESTEP, MAX_STEPS_ENV_VAR, STEPS_PER_SECOND,
    TONE_SAMPLE_RATE,
};
