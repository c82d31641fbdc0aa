//! Software RGBA frame buffer backend.
//!
//! Every surface is rasterized eagerly on the calling thread. Images are not
//! decoded here: hosts register pre-decoded rasters by source name.

mod raster;

use std::rc::Rc;

use mindframe_core::collections::map::HashMap;
use mindframe_render_common::{
    DrawBackend, DrawBatch, DrawOp, Rendered, SurfaceContent, SurfaceRequest,
};
use mindframe_ui_graphics::{Color, Rect, Size};
use thiserror::Error;

pub use raster::Raster;

/// Largest surface, in pixels, the backend agrees to allocate.
pub const MAX_SURFACE_PIXELS: usize = 4096 * 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixelsError {
    #[error("no image registered for `{0}`")]
    MissingImage(String),
    #[error("surface of {width}x{height} pixels exceeds the allocation limit")]
    SurfaceTooLarge { width: usize, height: usize },
}

pub struct PixelsBackend {
    frame: Raster,
    images: HashMap<String, Rc<Raster>>,
    live_surfaces: usize,
    draw_calls: usize,
}

impl PixelsBackend {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            frame: Raster::new(width, height, Color::TRANSPARENT),
            images: HashMap::new(),
            live_surfaces: 0,
            draw_calls: 0,
        }
    }

    /// A frame buffer matching `viewport`, rounded up to whole pixels.
    pub fn for_viewport(viewport: Size) -> Self {
        Self::new(
            viewport.width.ceil().max(0.0) as usize,
            viewport.height.ceil().max(0.0) as usize,
        )
    }

    pub fn register_image(&mut self, src: impl Into<String>, image: Raster) {
        self.images.insert(src.into(), Rc::new(image));
    }

    pub fn frame(&self) -> &Raster {
        &self.frame
    }

    pub fn live_surfaces(&self) -> usize {
        self.live_surfaces
    }

    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    fn rasterize(&self, request: &SurfaceRequest) -> Result<Rc<Raster>, PixelsError> {
        let width = request.size.width.ceil().max(1.0) as usize;
        let height = request.size.height.ceil().max(1.0) as usize;
        if width.saturating_mul(height) > MAX_SURFACE_PIXELS {
            return Err(PixelsError::SurfaceTooLarge { width, height });
        }
        match request.content() {
            SurfaceContent::Solid { color } => Ok(Rc::new(Raster::new(width, height, color))),
            SurfaceContent::Text {
                text,
                color,
                font_size,
            } => {
                let mut raster = Raster::new(width, height, Color::TRANSPARENT);
                let clip = raster.bounds();
                raster.draw_text(0.0, 0.0, &text, color, font_size, clip);
                Ok(Rc::new(raster))
            }
            SurfaceContent::Image { src } => self
                .images
                .get(&src)
                .cloned()
                .ok_or(PixelsError::MissingImage(src)),
        }
    }
}

impl DrawBackend for PixelsBackend {
    type Surface = Rc<Raster>;
    type Error = PixelsError;

    fn render_surface(&mut self, request: &SurfaceRequest) -> Result<Rendered<Rc<Raster>>, PixelsError> {
        let raster = self.rasterize(request)?;
        self.live_surfaces += 1;
        Ok(Rendered::Ready(raster))
    }

    fn release_surface(&mut self, _surface: Rc<Raster>) {
        self.live_surfaces = self.live_surfaces.saturating_sub(1);
    }

    fn submit(&mut self, batch: &DrawBatch<Rc<Raster>>) -> Result<(), PixelsError> {
        self.draw_calls += 1;
        let clip = match batch.region.intersect(&self.frame.bounds()) {
            Some(clip) => clip,
            None => {
                log::trace!("pixels: batch region {:?} is off screen", batch.region);
                return Ok(());
            }
        };
        for op in &batch.ops {
            match op {
                DrawOp::FillRect { rect, color } => self.frame.fill_rect(*rect, clip, *color),
                DrawOp::BlitSurface { rect, surface } => self.frame.blit(surface, *rect, clip),
                DrawOp::DrawText {
                    origin,
                    text,
                    color,
                    size,
                } => self
                    .frame
                    .draw_text(origin.x, origin.y, text, *color, *size, clip),
            }
        }
        Ok(())
    }
}

/// `RGBA8` bytes of the part of `frame` under `rect`, row by row.
pub fn damaged_bytes(frame: &Raster, rect: Rect) -> Vec<u8> {
    let mut bytes = Vec::new();
    let Some(rect) = rect.intersect(&frame.bounds()) else {
        return bytes;
    };
    let x0 = rect.x.round() as usize;
    let x1 = (rect.right().round() as usize).min(frame.width());
    let y0 = rect.y.round() as usize;
    let y1 = (rect.bottom().round() as usize).min(frame.height());
    for y in y0..y1 {
        for pixel in &frame.pixels()[y * frame.width() + x0..y * frame.width() + x1] {
            bytes.extend_from_slice(&[pixel.0, pixel.1, pixel.2, pixel.3]);
        }
    }
    bytes
}

#[cfg(test)]
#[path = "tests/pixels_tests.rs"]
mod tests;
