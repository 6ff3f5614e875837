use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use winit::keyboard::{KeyCode, PhysicalKey};

use super::subsystems::Input;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Up,
    Down,
    Left,
    Right,
    ButtonA,
    ButtonB,
    Start,
    Select,
}

const ACTION_COUNT: usize = 8;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::Up,
        InputAction::Down,
        InputAction::Left,
        InputAction::Right,
        InputAction::ButtonA,
        InputAction::ButtonB,
        InputAction::Start,
        InputAction::Select,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::Up => 0,
            InputAction::Down => 1,
            InputAction::Left => 2,
            InputAction::Right => 3,
            InputAction::ButtonA => 4,
            InputAction::ButtonB => 5,
            InputAction::Start => 6,
            InputAction::Select => 7,
        }
    }

    fn from_physical_key(key: PhysicalKey) -> Option<Self> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        match code {
            KeyCode::ArrowUp | KeyCode::KeyW => Some(InputAction::Up),
            KeyCode::ArrowDown | KeyCode::KeyS => Some(InputAction::Down),
            KeyCode::ArrowLeft | KeyCode::KeyA => Some(InputAction::Left),
            KeyCode::ArrowRight | KeyCode::KeyD => Some(InputAction::Right),
            KeyCode::KeyZ => Some(InputAction::ButtonA),
            KeyCode::KeyX => Some(InputAction::ButtonB),
            KeyCode::Enter => Some(InputAction::Start),
            KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(InputAction::Select),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

/// Live key-down set, written by the platform as raw key events arrive.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    keys_down: Rc<RefCell<HashSet<PhysicalKey>>>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, key: PhysicalKey) {
        self.keys_down.borrow_mut().insert(key);
    }

    pub fn release(&self, key: PhysicalKey) {
        self.keys_down.borrow_mut().remove(&key);
    }

    pub fn release_all(&self) {
        self.keys_down.borrow_mut().clear();
    }

    pub fn is_down(&self, key: PhysicalKey) -> bool {
        self.keys_down.borrow().contains(&key)
    }

    fn action_states(&self) -> ActionStates {
        let mut states = ActionStates::default();
        for key in self.keys_down.borrow().iter() {
            if let Some(action) = InputAction::from_physical_key(*key) {
                states.set(action, true);
            }
        }
        states
    }
}

/// Per-step view of the controller: held actions plus actions that went
/// down since the previous step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    held: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }
}

/// Shared read handle onto the snapshot published by [`KeyboardInput`].
#[derive(Debug, Clone, Default)]
pub struct InputHandle {
    snapshot: Rc<RefCell<InputSnapshot>>,
}

impl InputHandle {
    pub fn snapshot(&self) -> InputSnapshot {
        *self.snapshot.borrow()
    }

    fn publish(&self, snapshot: InputSnapshot) {
        *self.snapshot.borrow_mut() = snapshot;
    }
}

#[derive(Debug)]
pub struct KeyboardInput {
    keyboard: KeyboardState,
    previous: ActionStates,
    handle: InputHandle,
}

impl KeyboardInput {
    pub fn new(keyboard: KeyboardState) -> Self {
        Self {
            keyboard,
            previous: ActionStates::default(),
            handle: InputHandle::default(),
        }
    }

    pub fn handle(&self) -> InputHandle {
        self.handle.clone()
    }
}

impl Input for KeyboardInput {
    fn update(&mut self) {
        let held = self.keyboard.action_states();
        let mut pressed = ActionStates::default();
        for action in InputAction::ALL {
            if held.is_down(action) && !self.previous.is_down(action) {
                pressed.set(action, true);
            }
        }
        self.previous = held;
        self.handle.publish(InputSnapshot { held, pressed });
    }
}
