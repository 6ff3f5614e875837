use std::error::Error;

use thiserror::Error;
use winit::keyboard::{KeyCode, PhysicalKey};

use super::rendering::Graphics;

/// Platform event, already stripped of windowing-system detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    DisplayClose,
    KeyDown(PhysicalKey),
    KeyUp(PhysicalKey),
    DisplayResize { width: u32, height: u32 },
    Other,
}

/// The only signals the frame loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    Quit,
    Resize { width: u32, height: u32 },
    Ignored,
}

pub trait EventSource {
    fn is_empty(&mut self) -> bool;
    /// Blocks until an event is available.
    fn wait_for_event(&mut self) -> RawEvent;
}

pub trait Display {
    fn size(&self) -> (u32, u32);
    /// Must be called exactly once per delivered resize, before the new size is used.
    fn acknowledge_resize(&mut self, width: u32, height: u32) -> Result<(), DisplayError>;
    fn flip(&mut self, graphics: &dyn Graphics) -> Result<(), DisplayError>;
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("failed to resize display surface to {width}x{height}: {source}")]
    Resize {
        width: u32,
        height: u32,
        #[source]
        source: Box<dyn Error>,
    },
    #[error("failed to present frame: {0}")]
    Present(#[source] Box<dyn Error>),
}

pub fn classify(event: &RawEvent) -> LoopEvent {
    match *event {
        RawEvent::DisplayClose => LoopEvent::Quit,
        RawEvent::KeyDown(PhysicalKey::Code(KeyCode::Escape)) => LoopEvent::Quit,
        RawEvent::DisplayResize { width, height } => LoopEvent::Resize { width, height },
        _ => LoopEvent::Ignored,
    }
}

#[derive(Debug, Default)]
pub struct EventPump {
    resizes_acknowledged: u64,
}

impl EventPump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads exactly one event. Only call after observing a non-empty queue.
    pub fn poll_one<E, D>(&mut self, source: &mut E, display: &mut D) -> Result<LoopEvent, DisplayError>
    where
        E: EventSource + ?Sized,
        D: Display + ?Sized,
    {
        let raw = source.wait_for_event();
        let event = classify(&raw);
        if let LoopEvent::Resize { width, height } = event {
            display.acknowledge_resize(width, height)?;
            self.resizes_acknowledged = self.resizes_acknowledged.saturating_add(1);
        }
        Ok(event)
    }

    pub fn resizes_acknowledged(&self) -> u64 {
        self.resizes_acknowledged
    }
}
