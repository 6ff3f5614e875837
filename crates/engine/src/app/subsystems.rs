use super::rendering::Graphics;

/// Polls device state once per simulation step.
pub trait Input {
    fn update(&mut self);
}

pub trait World {
    fn update(&mut self);
    fn draw(&mut self, graphics: &mut dyn Graphics);
}

pub trait Sound {
    fn update(&mut self);
}

/// Collaborators driven by the frame scheduler. Each step updates them in
/// field order: input, world, sound.
pub struct Subsystems {
    pub input: Box<dyn Input>,
    pub world: Box<dyn World>,
    pub sound: Box<dyn Sound>,
    pub graphics: Box<dyn Graphics>,
}
