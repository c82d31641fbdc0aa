//! Text-mode backend drawing into a character grid.
//!
//! Every grid cell stands for `cell` pixels of the viewport. Colours are
//! reduced to block shading by brightness; fully transparent fills leave the
//! grid untouched.

use std::convert::Infallible;
use std::rc::Rc;

use mindframe_render_common::{
    DrawBackend, DrawBatch, DrawOp, Rendered, SurfaceContent, SurfaceRequest,
};
use mindframe_ui_graphics::{Color, Point, Rect, Size};

const SHADES: [(u8, char); 4] = [(200, '█'), (140, '▓'), (80, '▒'), (20, '░')];

fn shade(color: Color) -> char {
    if color.is_transparent() {
        return ' ';
    }
    let luma = color.luma();
    SHADES
        .iter()
        .find(|(threshold, _)| luma > *threshold)
        .map(|(_, glyph)| *glyph)
        .unwrap_or(' ')
}

/// Pre-shaded characters for one leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct Glyphs {
    columns: usize,
    rows: usize,
    chars: Vec<char>,
}

impl Glyphs {
    fn at(&self, column: usize, row: usize) -> char {
        let column = column.min(self.columns - 1);
        let row = row.min(self.rows - 1);
        self.chars[row * self.columns + column]
    }
}

pub struct ConsoleBackend {
    columns: usize,
    rows: usize,
    cell: Size,
    grid: Vec<char>,
    live_surfaces: usize,
    draw_calls: usize,
}

impl ConsoleBackend {
    /// A grid covering `viewport`, one character per `cell`.
    pub fn new(viewport: Size, cell: Size) -> Self {
        let columns = (viewport.width / cell.width).ceil().max(0.0) as usize;
        let rows = (viewport.height / cell.height).ceil().max(0.0) as usize;
        Self {
            columns,
            rows,
            cell,
            grid: vec![' '; columns * rows],
            live_surfaces: 0,
            draw_calls: 0,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn char_at(&self, column: usize, row: usize) -> Option<char> {
        (column < self.columns && row < self.rows).then(|| self.grid[row * self.columns + column])
    }

    /// Surfaces rendered and not yet released.
    pub fn live_surfaces(&self) -> usize {
        self.live_surfaces
    }

    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    /// The grid as text, one line per row with trailing blanks trimmed.
    pub fn render_to_string(&self) -> String {
        self.grid
            .chunks(self.columns.max(1))
            .map(|row| row.iter().collect::<String>().trim_end().to_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn extent(&self, size: Size) -> (usize, usize) {
        let columns = (size.width / self.cell.width).ceil().max(1.0) as usize;
        let rows = (size.height / self.cell.height).ceil().max(1.0) as usize;
        (columns, rows)
    }

    /// Cell span `(first_column, end_column, first_row, end_row)` covered by `rect`.
    fn cells(&self, rect: Rect) -> Option<(usize, usize, usize, usize)> {
        let first_column = (rect.x / self.cell.width).floor().max(0.0) as usize;
        let end_column = ((rect.right() / self.cell.width).ceil().max(0.0) as usize).min(self.columns);
        let first_row = (rect.y / self.cell.height).floor().max(0.0) as usize;
        let end_row = ((rect.bottom() / self.cell.height).ceil().max(0.0) as usize).min(self.rows);
        (first_column < end_column && first_row < end_row)
            .then_some((first_column, end_column, first_row, end_row))
    }

    fn cell_of(&self, point: Point) -> (usize, usize) {
        (
            (point.x / self.cell.width).floor().max(0.0) as usize,
            (point.y / self.cell.height).floor().max(0.0) as usize,
        )
    }

    fn draw(&mut self, op: &DrawOp<Rc<Glyphs>>, region: Rect) {
        match op {
            DrawOp::FillRect { rect, color } => {
                if color.is_transparent() {
                    return;
                }
                let glyph = shade(*color);
                let Some((c0, c1, r0, r1)) = rect.intersect(&region).and_then(|r| self.cells(r)) else {
                    return;
                };
                for row in r0..r1 {
                    self.grid[row * self.columns + c0..row * self.columns + c1].fill(glyph);
                }
            }
            DrawOp::BlitSurface { rect, surface } => {
                let Some((c0, c1, r0, r1)) = rect.intersect(&region).and_then(|r| self.cells(r)) else {
                    return;
                };
                let (origin_column, origin_row) = self.cell_of(rect.origin());
                for row in r0..r1 {
                    for column in c0..c1 {
                        self.grid[row * self.columns + column] = surface.at(
                            column.saturating_sub(origin_column),
                            row.saturating_sub(origin_row),
                        );
                    }
                }
            }
            DrawOp::DrawText { origin, text, .. } => {
                let Some((c0, c1, r0, r1)) = self.cells(region) else {
                    return;
                };
                let (first_column, row) = self.cell_of(*origin);
                if row < r0 || row >= r1 {
                    return;
                }
                for (offset, glyph) in text.chars().enumerate() {
                    let column = first_column + offset;
                    if column >= c1 {
                        break;
                    }
                    if column >= c0 {
                        self.grid[row * self.columns + column] = glyph;
                    }
                }
            }
        }
    }
}

impl DrawBackend for ConsoleBackend {
    type Surface = Rc<Glyphs>;
    type Error = Infallible;

    fn render_surface(&mut self, request: &SurfaceRequest) -> Result<Rendered<Rc<Glyphs>>, Infallible> {
        let (columns, rows) = self.extent(request.size);
        let mut chars = vec![' '; columns * rows];
        match request.content() {
            SurfaceContent::Solid { color } => chars.fill(shade(color)),
            SurfaceContent::Text { text, .. } => {
                for (slot, glyph) in chars.iter_mut().zip(text.chars()) {
                    *slot = glyph;
                }
            }
            SurfaceContent::Image { .. } => chars.fill('#'),
        }
        self.live_surfaces += 1;
        Ok(Rendered::Ready(Rc::new(Glyphs {
            columns,
            rows,
            chars,
        })))
    }

    fn release_surface(&mut self, _surface: Rc<Glyphs>) {
        self.live_surfaces = self.live_surfaces.saturating_sub(1);
    }

    fn submit(&mut self, batch: &DrawBatch<Rc<Glyphs>>) -> Result<(), Infallible> {
        self.draw_calls += 1;
        log::trace!("console: {} ops in {:?}", batch.len(), batch.region);
        for op in &batch.ops {
            self.draw(op, batch.region);
        }
        Ok(())
    }
}
