mod audio;
mod desktop;
mod pixels_display;
mod winit_events;

pub use audio::{square_wave_wav, KiraSound, SoundQueue, ToneCue, TONE_SAMPLE_RATE};
pub use desktop::{run_desktop, DesktopError, DesktopPlatform, WorldWiring};
pub use pixels_display::PixelsDisplay;
pub use winit_events::WinitEventQueue;
