use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::rc::Rc;

use kira::sound::static_sound::StaticSoundData;
use kira::sound::FromFileError;
use kira::{AudioManager, DefaultBackend};
use tracing::warn;

use crate::app::subsystems::Sound;

pub const TONE_SAMPLE_RATE: u32 = 22_050;

/// A square-wave sound effect synthesised at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneCue {
    pub name: &'static str,
    pub frequency_hz: f32,
    pub duration_ms: u32,
    pub volume: f32,
}

impl ToneCue {
    pub fn defaults() -> Vec<ToneCue> {
        vec![
            ToneCue {
                name: "bump",
                frequency_hz: 110.0,
                duration_ms: 60,
                volume: 0.3,
            },
            ToneCue {
                name: "select",
                frequency_hz: 880.0,
                duration_ms: 90,
                volume: 0.25,
            },
            ToneCue {
                name: "start",
                frequency_hz: 523.25,
                duration_ms: 160,
                volume: 0.25,
            },
        ]
    }
}

/// 16-bit mono PCM WAV bytes for `cue`.
pub fn square_wave_wav(cue: &ToneCue, sample_rate: u32) -> Vec<u8> {
    let sample_count = (u64::from(sample_rate) * u64::from(cue.duration_ms) / 1000) as u32;
    let data_len = sample_count * 2;
    let amplitude = (cue.volume.clamp(0.0, 1.0) * i16::MAX as f32) as i16;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());

    for index in 0..sample_count {
        let phase = (index as f32 * cue.frequency_hz / sample_rate as f32).fract();
        let sample = if phase < 0.5 { amplitude } else { -amplitude };
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

pub(crate) fn decode_tone_cue(cue: &ToneCue) -> Result<StaticSoundData, FromFileError> {
    StaticSoundData::from_cursor(Cursor::new(square_wave_wav(cue, TONE_SAMPLE_RATE)))
}

/// Named cue requests queued by the simulation, drained by the sound step.
#[derive(Debug, Clone, Default)]
pub struct SoundQueue {
    pending: Rc<RefCell<VecDeque<&'static str>>>,
}

impl SoundQueue {
    pub fn play(&self, cue: &'static str) {
        self.pending.borrow_mut().push_back(cue);
    }

    pub fn drain(&self) -> Vec<&'static str> {
        self.pending.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

pub struct KiraSound {
    manager: AudioManager<DefaultBackend>,
    cues: HashMap<&'static str, StaticSoundData>,
    queue: SoundQueue,
}

impl KiraSound {
    pub fn new(
        manager: AudioManager<DefaultBackend>,
        cues: HashMap<&'static str, StaticSoundData>,
        queue: SoundQueue,
    ) -> Self {
        Self {
            manager,
            cues,
            queue,
        }
    }
}

impl Sound for KiraSound {
    fn update(&mut self) {
        for name in self.queue.drain() {
            let Some(data) = self.cues.get(name) else {
                warn!(cue = name, "unknown_sound_cue");
                continue;
            };
            if let Err(error) = self.manager.play(data.clone()) {
                warn!(cue = name, error = ?error, "sound_play_failed");
            }
        }
    }
}
