#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalViewSize {
    pub width: u32,
    pub height: u32,
}

impl LogicalViewSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for LogicalViewSize {
    fn default() -> Self {
        Self::new(256, 240)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// The `(scale, offset_x, offset_y)` triple handed to the rendering subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewParams {
    pub scale: u32,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// Integer-scaled placement of the logical view inside the physical display.
///
/// Applying it to a logical point is "scale uniformly, then translate":
/// `physical = logical * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportTransform {
    pub scale: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub view_width: u32,
    pub view_height: u32,
}

impl ViewportTransform {
    pub fn clip_rect(&self) -> ClipRect {
        ClipRect {
            x: self.offset_x,
            y: self.offset_y,
            width: self.view_width,
            height: self.view_height,
        }
    }

    pub fn view_params(&self) -> ViewParams {
        ViewParams {
            scale: self.scale,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
        }
    }

    pub fn to_physical(&self, logical_x: i32, logical_y: i32) -> (i32, i32) {
        let scale = self.scale as i32;
        (
            logical_x * scale + self.offset_x,
            logical_y * scale + self.offset_y,
        )
    }

    /// Maps a physical pointer position back into logical view coordinates.
    /// Returns `None` when the point lies outside the scaled view.
    pub fn to_logical(&self, physical_x: i32, physical_y: i32) -> Option<(i32, i32)> {
        let scale = self.scale.max(1) as i32;
        let local_x = physical_x - self.offset_x;
        let local_y = physical_y - self.offset_y;
        if local_x < 0
            || local_y < 0
            || local_x >= self.view_width as i32
            || local_y >= self.view_height as i32
        {
            return None;
        }
        Some((local_x / scale, local_y / scale))
    }
}

pub fn compute_transform(
    logical: LogicalViewSize,
    screen_width: u32,
    screen_height: u32,
) -> ViewportTransform {
    // view_w / view_h > screen_w / screen_h, compared without rounding.
    let width_binds = u64::from(logical.width) * u64::from(screen_height)
        > u64::from(screen_width) * u64::from(logical.height);

    let scale = if width_binds {
        screen_width / logical.width.max(1)
    } else {
        screen_height / logical.height.max(1)
    };
    let scale = if scale == 0 { 1 } else { scale };

    let view_width = logical.width * scale;
    let view_height = logical.height * scale;
    // Truncating division toward zero; negative when the view overflows the screen.
    let offset_x = (screen_width as i64 - view_width as i64) / 2;
    let offset_y = (screen_height as i64 - view_height as i64) / 2;

    ViewportTransform {
        scale,
        offset_x: offset_x as i32,
        offset_y: offset_y as i32,
        view_width,
        view_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NES: LogicalViewSize = LogicalViewSize::new(256, 240);

    #[test]
    fn wide_screen_is_height_bound_and_centered() {
        let t = compute_transform(NES, 800, 450);
        assert_eq!(t.scale, 1);
        assert_eq!(t.offset_x, 272);
        assert_eq!(t.offset_y, 105);
    }

    #[test]
    fn equal_aspect_uses_height_and_fills_screen() {
        let t = compute_transform(NES, 1024, 960);
        assert_eq!(t.scale, 4);
        assert_eq!((t.offset_x, t.offset_y), (0, 0));
        assert_eq!((t.view_width, t.view_height), (1024, 960));
    }

    #[test]
    fn tiny_screen_clamps_scale_to_one() {
        let t = compute_transform(NES, 100, 100);
        assert_eq!(t.scale, 1);
        assert_eq!(t.offset_x, -78);
        assert_eq!(t.offset_y, -70);
    }

    #[test]
    fn tall_screen_is_width_bound() {
        let t = compute_transform(NES, 600, 1000);
        assert_eq!(t.scale, 2);
        assert_eq!(t.offset_x, 44);
        assert_eq!(t.offset_y, 260);
    }

    #[test]
    fn odd_leftover_truncates_offset() {
        let t = compute_transform(NES, 513, 481);
        assert_eq!(t.scale, 2);
        assert_eq!(t.offset_x, 0);
        assert_eq!(t.offset_y, 0);
    }

    #[test]
    fn scale_is_largest_fit_for_binding_dimension() {
        for &(w, h) in &[(256, 240), (640, 480), (1920, 1080), (1280, 1024), (300, 2000)] {
            let t = compute_transform(NES, w, h);
            let width_binds = 256 * h > w * 240;
            if width_binds {
                assert!(t.scale * 256 <= w || t.scale == 1);
                assert!((t.scale + 1) * 256 > w);
            } else {
                assert!(t.scale * 240 <= h || t.scale == 1);
                assert!((t.scale + 1) * 240 > h);
            }
            assert!(t.scale >= 1);
            assert!(t.offset_x >= 0 && t.offset_y >= 0, "{w}x{h}");
            assert_eq!(t.offset_x, ((w - t.scale * 256) / 2) as i32);
            assert_eq!(t.offset_y, ((h - t.scale * 240) / 2) as i32);
        }
    }

    #[test]
    fn clip_rect_and_params_mirror_transform() {
        let t = compute_transform(NES, 1920, 1080);
        assert_eq!(
            t.clip_rect(),
            ClipRect {
                x: 448,
                y: 60,
                width: 1024,
                height: 960
            }
        );
        assert_eq!(
            t.view_params(),
            ViewParams {
                scale: 4,
                offset_x: 448,
                offset_y: 60
            }
        );
    }

    #[test]
    fn pointer_maps_round_trip_through_scaled_view() {
        let t = compute_transform(NES, 1920, 1080);
        assert_eq!(t.to_physical(10, 20), (488, 140));
        assert_eq!(t.to_logical(488, 140), Some((10, 20)));
        assert_eq!(t.to_logical(491, 143), Some((10, 20)));
        assert_eq!(t.to_logical(447, 500), None);
        assert_eq!(t.to_logical(448 + 1024, 500), None);
    }
}
