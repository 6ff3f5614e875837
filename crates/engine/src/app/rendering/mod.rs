mod graphics;
mod transform;

pub use graphics::{Graphics, Rgba, SoftwareGraphics};
pub use transform::{
    compute_transform, ClipRect, LogicalViewSize, ViewParams, ViewportTransform,
};
