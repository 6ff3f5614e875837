use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::{Window, WindowId};

use crate::app::events::{Display, DisplayError};
use crate::app::rendering::Graphics;

/// Resizable window whose pixel surface always matches its physical size.
pub struct PixelsDisplay {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    size: (u32, u32),
}

impl PixelsDisplay {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let inner = window.inner_size();
        let size = (inner.width.max(1), inner.height.max(1));
        let pixels = Self::build_pixels(Arc::clone(&window), size.0, size.1)?;
        Ok(Self {
            window,
            pixels,
            size,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }
}

impl Display for PixelsDisplay {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn acknowledge_resize(&mut self, width: u32, height: u32) -> Result<(), DisplayError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        let resize_error = |source: pixels::TextureError| DisplayError::Resize {
            width,
            height,
            source: Box::new(source),
        };
        self.pixels
            .resize_surface(width, height)
            .map_err(resize_error)?;
        self.pixels
            .resize_buffer(width, height)
            .map_err(resize_error)?;
        self.size = (width, height);
        Ok(())
    }

    fn flip(&mut self, graphics: &dyn Graphics) -> Result<(), DisplayError> {
        let (width, height) = self.size;
        graphics.compose(self.pixels.frame_mut(), width, height);
        self.pixels
            .render()
            .map_err(|error| DisplayError::Present(Box::new(error)))
    }
}
