use super::{ClipRect, LogicalViewSize, ViewParams, ViewportTransform};

pub type Rgba = [u8; 4];

const LETTERBOX_COLOR: Rgba = [0, 0, 0, 255];

/// Rendering collaborator. Drawing calls take logical coordinates; `compose`
/// applies the current viewport when writing into a physical frame.
pub trait Graphics {
    fn set_view_params(&mut self, params: ViewParams);
    fn use_viewport(&mut self, viewport: &ViewportTransform);
    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgba);
    fn compose(&self, target: &mut [u8], target_width: u32, target_height: u32);
}

/// CPU framebuffer at the logical resolution.
#[derive(Debug)]
pub struct SoftwareGraphics {
    logical: LogicalViewSize,
    frame: Vec<u8>,
    transform: Option<ViewportTransform>,
    view_params: Option<ViewParams>,
}

impl SoftwareGraphics {
    pub fn new(logical: LogicalViewSize) -> Self {
        let len = logical.width as usize * logical.height as usize * 4;
        Self {
            logical,
            frame: vec![0; len],
            transform: None,
            view_params: None,
        }
    }

    pub fn view_params(&self) -> Option<ViewParams> {
        self.view_params
    }

    pub fn logical_frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.logical.width || y >= self.logical.height {
            return None;
        }
        let offset = (y as usize * self.logical.width as usize + x as usize) * 4;
        let mut color = [0; 4];
        color.copy_from_slice(&self.frame[offset..offset + 4]);
        Some(color)
    }
}

impl Graphics for SoftwareGraphics {
    fn set_view_params(&mut self, params: ViewParams) {
        self.view_params = Some(params);
    }

    fn use_viewport(&mut self, viewport: &ViewportTransform) {
        self.transform = Some(*viewport);
    }

    fn clear(&mut self, color: Rgba) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgba) {
        let left = x.max(0);
        let top = y.max(0);
        let right = (x as i64 + width as i64).min(self.logical.width as i64) as i32;
        let bottom = (y as i64 + height as i64).min(self.logical.height as i64) as i32;
        for row in top..bottom {
            for col in left..right {
                write_pixel_rgba_clipped(
                    &mut self.frame,
                    self.logical.width as usize,
                    col,
                    row,
                    color,
                );
            }
        }
    }

    fn compose(&self, target: &mut [u8], target_width: u32, target_height: u32) {
        for pixel in target.chunks_exact_mut(4) {
            pixel.copy_from_slice(&LETTERBOX_COLOR);
        }
        let Some(transform) = self.transform else {
            return;
        };
        let Some(area) = clip_to_target(transform.clip_rect(), target_width, target_height) else {
            return;
        };

        let scale = transform.scale.max(1) as i32;
        let logical_width = self.logical.width as usize;
        for py in area.top..area.bottom {
            let ly = ((py - transform.offset_y) / scale) as usize;
            for px in area.left..area.right {
                let lx = ((px - transform.offset_x) / scale) as usize;
                let source = (ly * logical_width + lx) * 4;
                let Some(color) = self.frame.get(source..source + 4) else {
                    continue;
                };
                let dest = (py as usize * target_width as usize + px as usize) * 4;
                if let Some(slot) = target.get_mut(dest..dest + 4) {
                    slot.copy_from_slice(color);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelArea {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

fn clip_to_target(clip: ClipRect, target_width: u32, target_height: u32) -> Option<PixelArea> {
    let area = PixelArea {
        left: clip.x.max(0),
        top: clip.y.max(0),
        right: (clip.x as i64 + clip.width as i64).min(target_width as i64) as i32,
        bottom: (clip.y as i64 + clip.height as i64).min(target_height as i64) as i32,
    };
    (area.left < area.right && area.top < area.bottom).then_some(area)
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: Rgba) {
    if x < 0 || y < 0 {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}
