use mindframe_ui_graphics::{Color, Rect};

/// A straight-alpha RGBA image.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Raster {
    pub fn new(width: usize, height: usize, fill: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    /// `None` when `pixels` does not hold exactly `width * height` entries.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Color>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    /// Pixel span `(x0, x1, y0, y1)` of `rect`, clipped to the raster.
    fn span(&self, rect: Rect) -> Option<(usize, usize, usize, usize)> {
        let x0 = rect.x.round().max(0.0) as usize;
        let y0 = rect.y.round().max(0.0) as usize;
        let x1 = (rect.right().round().max(0.0) as usize).min(self.width);
        let y1 = (rect.bottom().round().max(0.0) as usize).min(self.height);
        (x0 < x1 && y0 < y1).then_some((x0, x1, y0, y1))
    }

    /// Blends `color` over every pixel of `rect` inside `clip`.
    pub fn fill_rect(&mut self, rect: Rect, clip: Rect, color: Color) {
        if color.is_transparent() {
            return;
        }
        let Some((x0, x1, y0, y1)) = rect.intersect(&clip).and_then(|r| self.span(r)) else {
            return;
        };
        for y in y0..y1 {
            for pixel in &mut self.pixels[y * self.width + x0..y * self.width + x1] {
                *pixel = color.over(*pixel);
            }
        }
    }

    /// Draws `source` scaled to `rect` with nearest-neighbour sampling.
    pub fn blit(&mut self, source: &Raster, rect: Rect, clip: Rect) {
        if source.width == 0 || source.height == 0 || rect.is_empty() {
            return;
        }
        let Some((x0, x1, y0, y1)) = rect.intersect(&clip).and_then(|r| self.span(r)) else {
            return;
        };
        let sample = |offset: f32, extent: f32, len: usize| {
            let scaled = (offset / extent * len as f32).floor().max(0.0) as usize;
            scaled.min(len - 1)
        };
        for y in y0..y1 {
            let sy = sample(y as f32 + 0.5 - rect.y, rect.height, source.height);
            for x in x0..x1 {
                let sx = sample(x as f32 + 0.5 - rect.x, rect.width, source.width);
                let index = y * self.width + x;
                self.pixels[index] = source.pixels[sy * source.width + sx].over(self.pixels[index]);
            }
        }
    }

    /// Text as solid glyph boxes, one per non-blank character.
    pub fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Color, size: f32, clip: Rect) {
        let advance = (size * 0.6).max(2.0);
        let glyph_height = (size * 0.8).max(1.0);
        for (index, glyph) in text.chars().enumerate() {
            if glyph.is_whitespace() {
                continue;
            }
            let left = x + index as f32 * advance;
            let glyph_box = Rect::new(left + 1.0, y + 1.0, advance - 2.0, glyph_height - 1.0);
            self.fill_rect(glyph_box, clip, color);
        }
    }

    /// Flattens to `RGBA8` bytes, row by row.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|color| [color.0, color.1, color.2, color.3])
            .collect()
    }
}
