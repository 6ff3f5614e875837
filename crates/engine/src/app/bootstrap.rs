use std::error::Error;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::clock::Clock;
use super::events::{Display, EventSource};
use super::loop_runner::{LoopConfig, LoopContext};
use super::platform::ToneCue;
use super::rendering::{compute_transform, Graphics, LogicalViewSize};
use super::subsystems::Sound;

pub type StageError = Box<dyn Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapStage {
    Runtime,
    Keyboard,
    ImageCodec,
    AudioDevice,
    AudioCodec,
    Display,
    EventQueue,
    Graphics,
    Sound,
}

impl BootstrapStage {
    pub const ORDER: [BootstrapStage; 9] = [
        BootstrapStage::Runtime,
        BootstrapStage::Keyboard,
        BootstrapStage::ImageCodec,
        BootstrapStage::AudioDevice,
        BootstrapStage::AudioCodec,
        BootstrapStage::Display,
        BootstrapStage::EventQueue,
        BootstrapStage::Graphics,
        BootstrapStage::Sound,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BootstrapStage::Runtime => "runtime",
            BootstrapStage::Keyboard => "keyboard",
            BootstrapStage::ImageCodec => "image_codec",
            BootstrapStage::AudioDevice => "audio_device",
            BootstrapStage::AudioCodec => "audio_codec",
            BootstrapStage::Display => "display",
            BootstrapStage::EventQueue => "event_queue",
            BootstrapStage::Graphics => "graphics",
            BootstrapStage::Sound => "sound",
        }
    }

    const fn ordinal(self) -> u8 {
        match self {
            BootstrapStage::Runtime => 0,
            BootstrapStage::Keyboard => 1,
            BootstrapStage::ImageCodec => 2,
            BootstrapStage::AudioDevice => 3,
            BootstrapStage::AudioCodec => 4,
            BootstrapStage::Display => 5,
            BootstrapStage::EventQueue => 6,
            BootstrapStage::Graphics => 7,
            BootstrapStage::Sound => 8,
        }
    }

    /// Process exit status reported when this stage fails.
    pub const fn exit_code(self) -> u8 {
        10 + self.ordinal()
    }
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("startup failed during {stage} initialization: {source}")]
pub struct BootstrapError {
    pub stage: BootstrapStage,
    #[source]
    pub source: StageError,
}

impl BootstrapError {
    pub fn exit_code(&self) -> u8 {
        self.stage.exit_code()
    }
}

/// One fallible hook per startup stage, called by [`bootstrap`] in
/// [`BootstrapStage::ORDER`].
pub trait StartupPlatform {
    type Events: EventSource;
    type Display: Display;
    type Clock: Clock;

    fn init_runtime(&mut self) -> Result<(), StageError>;
    fn init_keyboard(&mut self) -> Result<(), StageError>;
    fn init_image_codecs(&mut self) -> Result<(), StageError>;
    fn init_audio_device(&mut self) -> Result<(), StageError>;
    fn init_audio_codecs(&mut self, cues: &[ToneCue]) -> Result<(), StageError>;
    fn create_display(
        &mut self,
        title: &str,
        logical: LogicalViewSize,
    ) -> Result<Self::Display, StageError>;
    fn create_event_queue(&mut self) -> Result<Self::Events, StageError>;
    fn init_graphics(&mut self, logical: LogicalViewSize) -> Result<Box<dyn Graphics>, StageError>;
    fn init_sound(&mut self) -> Result<Box<dyn Sound>, StageError>;
    fn clock(&self) -> Self::Clock;
}

pub struct Booted<P: StartupPlatform> {
    pub context: LoopContext<P::Events, P::Display, P::Clock>,
    pub graphics: Box<dyn Graphics>,
    pub sound: Box<dyn Sound>,
}

/// Runs every startup stage in order. The first failure aborts startup; nothing is retried.
pub fn bootstrap<P: StartupPlatform>(
    platform: &mut P,
    config: &LoopConfig,
) -> Result<Booted<P>, BootstrapError> {
    let logical = config.logical_size;

    run_stage(BootstrapStage::Runtime, || platform.init_runtime())?;
    run_stage(BootstrapStage::Keyboard, || platform.init_keyboard())?;
    run_stage(BootstrapStage::ImageCodec, || platform.init_image_codecs())?;
    run_stage(BootstrapStage::AudioDevice, || platform.init_audio_device())?;
    run_stage(BootstrapStage::AudioCodec, || {
        platform.init_audio_codecs(&config.tone_cues)
    })?;
    let display = run_stage(BootstrapStage::Display, || {
        platform.create_display(&config.window_title, logical)
    })?;
    let (width, height) = display.size();
    let viewport = compute_transform(logical, width.max(1), height.max(1));
    let events = run_stage(BootstrapStage::EventQueue, || platform.create_event_queue())?;
    let mut graphics = run_stage(BootstrapStage::Graphics, || platform.init_graphics(logical))?;
    graphics.use_viewport(&viewport);
    graphics.set_view_params(viewport.view_params());
    let sound = run_stage(BootstrapStage::Sound, || platform.init_sound())?;

    let context = LoopContext::new(
        events,
        display,
        platform.clock(),
        logical,
        viewport,
        config.step_policy,
    );
    Ok(Booted {
        context,
        graphics,
        sound,
    })
}

fn run_stage<T>(
    stage: BootstrapStage,
    init: impl FnOnce() -> Result<T, StageError>,
) -> Result<T, BootstrapError> {
    match init() {
        Ok(value) => {
            debug!(stage = stage.name(), "stage_ready");
            Ok(value)
        }
        Err(source) => Err(BootstrapError { stage, source }),
    }
}
