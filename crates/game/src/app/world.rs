use loz_engine::{
    FrameCounter, Graphics, InputAction, InputHandle, InputSnapshot, LogicalViewSize, Rgba,
    SoundQueue, World, WorldWiring,
};
use tracing::debug;

const WALL_THICKNESS: i32 = 16;
const PLAYER_SIZE: i32 = 16;
const PLAYER_SPEED: i32 = 1;
const PAUSE_BLINK_FRAMES: u32 = 30;

const WALL_COLOR: Rgba = [92, 64, 40, 255];
const FLOOR_COLOR: Rgba = [24, 28, 40, 255];
const PAUSE_COLOR: Rgba = [240, 240, 240, 255];
const PLAYER_COLORS: [Rgba; 3] = [[64, 200, 96, 255], [220, 80, 80, 255], [80, 140, 230, 255]];

/// Single walled room with a movable block. Enough to drive input, sound
/// cues, the frame counter and the logical framebuffer end to end.
pub(crate) struct RoomWorld {
    input: InputHandle,
    sounds: SoundQueue,
    frame_counter: FrameCounter,
    room: LogicalViewSize,
    player_x: i32,
    player_y: i32,
    palette_index: usize,
    against_wall: bool,
    paused: bool,
}

impl RoomWorld {
    pub(crate) fn new(wiring: WorldWiring) -> Self {
        let room = wiring.logical_size;
        Self {
            input: wiring.input,
            sounds: wiring.sounds,
            frame_counter: wiring.frame_counter,
            room,
            player_x: (room.width as i32 - PLAYER_SIZE) / 2,
            player_y: (room.height as i32 - PLAYER_SIZE) / 2,
            palette_index: 0,
            against_wall: false,
            paused: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn player_position(&self) -> (i32, i32) {
        (self.player_x, self.player_y)
    }

    #[cfg(test)]
    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    fn walk(&mut self, input: &InputSnapshot) {
        let dx = axis(
            input.is_down(InputAction::Right),
            input.is_down(InputAction::Left),
        );
        let dy = axis(
            input.is_down(InputAction::Down),
            input.is_down(InputAction::Up),
        );
        if dx == 0 && dy == 0 {
            self.against_wall = false;
            return;
        }

        let max_x = self.room.width as i32 - WALL_THICKNESS - PLAYER_SIZE;
        let max_y = self.room.height as i32 - WALL_THICKNESS - PLAYER_SIZE;
        let target_x = self.player_x + dx * PLAYER_SPEED;
        let target_y = self.player_y + dy * PLAYER_SPEED;
        self.player_x = target_x.clamp(WALL_THICKNESS, max_x.max(WALL_THICKNESS));
        self.player_y = target_y.clamp(WALL_THICKNESS, max_y.max(WALL_THICKNESS));

        let blocked = self.player_x != target_x || self.player_y != target_y;
        if blocked && !self.against_wall {
            self.sounds.play("bump");
        }
        self.against_wall = blocked;
    }
}

impl World for RoomWorld {
    fn update(&mut self) {
        let input = self.input.snapshot();

        if input.was_pressed(InputAction::Start) {
            self.paused = !self.paused;
            self.sounds.play("start");
            debug!(
                paused = self.paused,
                frame = self.frame_counter.get(),
                "pause_toggled"
            );
        }
        if self.paused {
            return;
        }

        if input.was_pressed(InputAction::ButtonA) {
            self.palette_index = (self.palette_index + 1) % PLAYER_COLORS.len();
            self.sounds.play("select");
        }
        self.walk(&input);
    }

    fn draw(&mut self, graphics: &mut dyn Graphics) {
        graphics.clear(WALL_COLOR);
        let inner_width = (self.room.width as i32 - 2 * WALL_THICKNESS).max(0) as u32;
        let inner_height = (self.room.height as i32 - 2 * WALL_THICKNESS).max(0) as u32;
        graphics.fill_rect(
            WALL_THICKNESS,
            WALL_THICKNESS,
            inner_width,
            inner_height,
            FLOOR_COLOR,
        );
        graphics.fill_rect(
            self.player_x,
            self.player_y,
            PLAYER_SIZE as u32,
            PLAYER_SIZE as u32,
            PLAYER_COLORS[self.palette_index],
        );

        let blink_on = (self.frame_counter.get() / PAUSE_BLINK_FRAMES) % 2 == 0;
        if self.paused && blink_on {
            let bar_width = 32;
            let x = (self.room.width as i32 - bar_width as i32) / 2;
            graphics.fill_rect(x, WALL_THICKNESS / 4, bar_width, 4, PAUSE_COLOR);
        }
    }
}

fn axis(positive: bool, negative: bool) -> i32 {
    i32::from(positive) - i32::from(negative)
}
