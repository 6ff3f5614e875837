use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::PhysicalKey;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::WindowId;

use crate::app::events::{EventSource, RawEvent};
use crate::app::input::KeyboardState;

/// FIFO of translated window events, filled by pumping the winit loop on demand.
pub struct WinitEventQueue {
    event_loop: EventLoop<()>,
    window_id: WindowId,
    keyboard: KeyboardState,
    pending: VecDeque<RawEvent>,
    exited: bool,
}

impl WinitEventQueue {
    pub fn new(event_loop: EventLoop<()>, window_id: WindowId, keyboard: KeyboardState) -> Self {
        Self {
            event_loop,
            window_id,
            keyboard,
            pending: VecDeque::new(),
            exited: false,
        }
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        let window_id = self.window_id;
        let keyboard = &self.keyboard;
        let pending = &mut self.pending;
        let status = self.event_loop.pump_events(timeout, |event, _target| {
            if let Event::WindowEvent {
                window_id: target_id,
                event,
            } = event
            {
                if target_id == window_id {
                    if let Some(raw) = translate_window_event(&event, keyboard) {
                        pending.push_back(raw);
                    }
                }
            }
        });
        if let PumpStatus::Exit(code) = status {
            if !self.exited {
                debug!(code, "event_loop_exited");
                self.exited = true;
                self.pending.push_back(RawEvent::DisplayClose);
            }
        }
    }
}

impl EventSource for WinitEventQueue {
    fn is_empty(&mut self) -> bool {
        if self.pending.is_empty() && !self.exited {
            self.pump(Some(Duration::ZERO));
        }
        self.pending.is_empty()
    }

    fn wait_for_event(&mut self) -> RawEvent {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return event;
            }
            if self.exited {
                return RawEvent::DisplayClose;
            }
            self.pump(None);
        }
    }
}

/// Pointer and IME traffic is dropped; key state is recorded as it arrives.
pub(crate) fn translate_window_event(
    event: &WindowEvent,
    keyboard: &KeyboardState,
) -> Option<RawEvent> {
    match event {
        WindowEvent::CloseRequested => Some(RawEvent::DisplayClose),
        WindowEvent::Resized(size) => Some(RawEvent::DisplayResize {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::KeyboardInput { event, .. } => {
            Some(translate_key(event.physical_key, event.state, keyboard))
        }
        WindowEvent::Focused(false) => {
            keyboard.release_all();
            Some(RawEvent::Other)
        }
        WindowEvent::CursorMoved { .. }
        | WindowEvent::CursorEntered { .. }
        | WindowEvent::CursorLeft { .. }
        | WindowEvent::MouseInput { .. }
        | WindowEvent::MouseWheel { .. }
        | WindowEvent::Ime(_) => None,
        _ => Some(RawEvent::Other),
    }
}

/// Auto-repeat presses arrive as further `KeyDown`s.
pub(crate) fn translate_key(
    key: PhysicalKey,
    state: ElementState,
    keyboard: &KeyboardState,
) -> RawEvent {
    match state {
        ElementState::Pressed => {
            keyboard.press(key);
            RawEvent::KeyDown(key)
        }
        ElementState::Released => {
            keyboard.release(key);
            RawEvent::KeyUp(key)
        }
    }
}
