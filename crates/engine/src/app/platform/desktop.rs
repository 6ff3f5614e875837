use std::collections::HashMap;
use std::sync::Arc;

use image::{ImageError, ImageFormat};
use kira::sound::static_sound::StaticSoundData;
use kira::sound::FromFileError;
use kira::{AudioManager, AudioManagerSettings, DefaultBackend};
use thiserror::Error;
use tracing::{debug, info};
use winit::dpi::PhysicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event_loop::EventLoop;
use winit::window::{WindowBuilder, WindowId};

use super::audio::{decode_tone_cue, KiraSound, SoundQueue, ToneCue};
use super::pixels_display::PixelsDisplay;
use super::winit_events::WinitEventQueue;
use crate::app::bootstrap::{bootstrap, Booted, StageError, StartupPlatform};
use crate::app::clock::{FrameCounter, SystemClock};
use crate::app::input::{InputHandle, KeyboardInput, KeyboardState};
use crate::app::loop_runner::{AppError, FrameScheduler, LoopConfig};
use crate::app::rendering::{Graphics, LogicalViewSize, SoftwareGraphics};
use crate::app::subsystems::{Sound, Subsystems, World};

/// 1x1 opaque red RGBA image, decoded once at startup to exercise the PNG codec.
const CODEC_CHECK_PNG: [u8; 70] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0xf8, 0xcf, 0xc0, 0xf0,
    0x1f, 0x00, 0x05, 0x00, 0x01, 0xff, 0x89, 0x99, 0x3d, 0x1d, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
    0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

#[derive(Debug, Error)]
pub enum DesktopError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to create pixel surface: {0}")]
    CreateSurface(#[source] pixels::Error),
    #[error("PNG codec failed to decode the startup image: {0}")]
    ImageCodec(#[source] ImageError),
    #[error("no audio output device: {0}")]
    AudioDevice(String),
    #[error("failed to decode tone cue '{name}': {source}")]
    DecodeCue {
        name: &'static str,
        #[source]
        source: FromFileError,
    },
    #[error("{stage} initialized before the event loop")]
    OutOfOrder { stage: &'static str },
}

/// Real desktop collaborators: winit for windows and events, pixels for
/// presentation, kira for audio.
pub struct DesktopPlatform {
    event_loop: Option<EventLoop<()>>,
    window_id: Option<WindowId>,
    keyboard: Option<KeyboardState>,
    audio: Option<AudioManager<DefaultBackend>>,
    cues: HashMap<&'static str, StaticSoundData>,
    sounds: SoundQueue,
    clock: SystemClock,
}

impl DesktopPlatform {
    pub fn new() -> Self {
        Self {
            event_loop: None,
            window_id: None,
            keyboard: None,
            audio: None,
            cues: HashMap::new(),
            sounds: SoundQueue::default(),
            clock: SystemClock::new(),
        }
    }

    pub fn keyboard(&self) -> Option<KeyboardState> {
        self.keyboard.clone()
    }

    pub fn sound_queue(&self) -> SoundQueue {
        self.sounds.clone()
    }

    fn keyboard_or_default(&self) -> KeyboardState {
        self.keyboard.clone().unwrap_or_default()
    }
}

impl Default for DesktopPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupPlatform for DesktopPlatform {
    type Events = WinitEventQueue;
    type Display = PixelsDisplay;
    type Clock = SystemClock;

    fn init_runtime(&mut self) -> Result<(), StageError> {
        let event_loop = EventLoop::new().map_err(DesktopError::CreateEventLoop)?;
        self.event_loop = Some(event_loop);
        Ok(())
    }

    fn init_keyboard(&mut self) -> Result<(), StageError> {
        if self.event_loop.is_none() {
            return Err(DesktopError::OutOfOrder { stage: "keyboard" }.into());
        }
        self.keyboard = Some(KeyboardState::new());
        Ok(())
    }

    fn init_image_codecs(&mut self) -> Result<(), StageError> {
        check_png_codec()?;
        Ok(())
    }

    fn init_audio_device(&mut self) -> Result<(), StageError> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|err| DesktopError::AudioDevice(err.to_string()))?;
        self.audio = Some(manager);
        Ok(())
    }

    fn init_audio_codecs(&mut self, cues: &[ToneCue]) -> Result<(), StageError> {
        for cue in cues {
            let data = decode_tone_cue(cue).map_err(|source| DesktopError::DecodeCue {
                name: cue.name,
                source,
            })?;
            self.cues.insert(cue.name, data);
        }
        Ok(())
    }

    fn create_display(
        &mut self,
        title: &str,
        logical: LogicalViewSize,
    ) -> Result<PixelsDisplay, StageError> {
        let event_loop = self
            .event_loop
            .as_ref()
            .ok_or(DesktopError::OutOfOrder { stage: "display" })?;
        let window = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(initial_window_size(logical))
            .with_min_inner_size(initial_window_size(logical))
            .with_resizable(true)
            .build(event_loop)
            .map_err(DesktopError::CreateWindow)?;
        let display = PixelsDisplay::new(Arc::new(window)).map_err(DesktopError::CreateSurface)?;
        self.window_id = Some(display.window_id());
        Ok(display)
    }

    fn create_event_queue(&mut self) -> Result<WinitEventQueue, StageError> {
        let event_loop = self
            .event_loop
            .take()
            .ok_or(DesktopError::OutOfOrder { stage: "event_queue" })?;
        let window_id = self
            .window_id
            .ok_or(DesktopError::OutOfOrder { stage: "event_queue" })?;
        Ok(WinitEventQueue::new(
            event_loop,
            window_id,
            self.keyboard_or_default(),
        ))
    }

    fn init_graphics(&mut self, logical: LogicalViewSize) -> Result<Box<dyn Graphics>, StageError> {
        Ok(Box::new(SoftwareGraphics::new(logical)))
    }

    fn init_sound(&mut self) -> Result<Box<dyn Sound>, StageError> {
        let manager = self
            .audio
            .take()
            .ok_or(DesktopError::OutOfOrder { stage: "sound" })?;
        let cues = std::mem::take(&mut self.cues);
        Ok(Box::new(KiraSound::new(manager, cues, self.sounds.clone())))
    }

    fn clock(&self) -> SystemClock {
        self.clock
    }
}

/// The display opens at exactly the logical resolution, in physical pixels.
fn initial_window_size(logical: LogicalViewSize) -> PhysicalSize<u32> {
    PhysicalSize::new(logical.width, logical.height)
}

fn check_png_codec() -> Result<(), DesktopError> {
    let decoded = image::load_from_memory_with_format(&CODEC_CHECK_PNG, ImageFormat::Png)
        .map_err(DesktopError::ImageCodec)?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        "png_codec_ready"
    );
    Ok(())
}

/// Handles a world needs to talk to the rest of the loop.
#[derive(Debug, Clone)]
pub struct WorldWiring {
    pub input: InputHandle,
    pub sounds: SoundQueue,
    pub frame_counter: FrameCounter,
    pub logical_size: LogicalViewSize,
}

/// Boots the desktop platform, builds the world and runs until quit.
pub fn run_desktop<F>(config: LoopConfig, build_world: F) -> Result<(), AppError>
where
    F: FnOnce(WorldWiring) -> Box<dyn World>,
{
    let mut platform = DesktopPlatform::new();
    let Booted {
        context,
        graphics,
        sound,
    } = bootstrap(&mut platform, &config)?;

    let input = KeyboardInput::new(platform.keyboard_or_default());
    let wiring = WorldWiring {
        input: input.handle(),
        sounds: platform.sound_queue(),
        frame_counter: context.frame_counter(),
        logical_size: config.logical_size,
    };
    let world = build_world(wiring);
    info!(
        width = config.logical_size.width,
        height = config.logical_size.height,
        "startup"
    );

    let subsystems = Subsystems {
        input: Box::new(input),
        world,
        sound,
        graphics,
    };
    let mut scheduler = FrameScheduler::new(context, subsystems, config.metrics_log_interval);
    scheduler.run_loop()?;
    Ok(())
}
