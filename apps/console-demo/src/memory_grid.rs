use std::time::Duration;

use mindframe_app_shell::{InputEvent, InputOutcome, TrainingModule};
use mindframe_core::{EventRoute, Memoizer, Node, NodeKey, StateSnapshot};
use mindframe_ui_graphics::{Size, Theme};

pub const COLUMNS: usize = 4;
pub const ROWS: usize = 3;
pub const CELL: i64 = 16;
pub const GAP: i64 = 4;
const TOP: i64 = 16;

/// Tap the lit cell before it moves on.
pub struct MemoryGrid {
    lit: usize,
    step: u64,
    hits: i64,
    misses: i64,
    elapsed: Duration,
    interval: Duration,
    width: i64,
}

impl MemoryGrid {
    pub fn new(interval: Duration) -> Self {
        Self {
            lit: 0,
            step: 0,
            hits: 0,
            misses: 0,
            elapsed: Duration::ZERO,
            interval,
            width: 0,
        }
    }

    /// Top-left corner of cell `index` in viewport coordinates.
    pub fn cell_origin(index: usize) -> (i64, i64) {
        let stride = CELL + GAP;
        (
            (index % COLUMNS) as i64 * stride,
            TOP + (index / COLUMNS) as i64 * stride,
        )
    }

    fn advance(&mut self) {
        self.step += 1;
        self.lit = (self.lit * 5 + 3 + self.step as usize) % (COLUMNS * ROWS);
    }
}

fn cell(index: usize, lit: bool, theme: &Theme) -> Node {
    let (x, y) = MemoryGrid::cell_origin(index);
    Node::new("cell")
        .key(index)
        .prop("x", x)
        .prop("y", y - TOP)
        .prop("width", CELL)
        .prop("height", CELL)
        .prop("color", theme.color(if lit { "accent" } else { "surface" }))
        .build()
}

impl TrainingModule for MemoryGrid {
    fn initialize(&mut self, viewport: Size, theme: &Theme) {
        self.width = viewport.width as i64;
        log::info!(
            "memory grid: {COLUMNS}x{ROWS} cells, {:?} per step, {}",
            self.interval,
            theme.name()
        );
    }

    fn update(&mut self, dt: Duration) {
        self.elapsed += dt;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            self.advance();
        }
    }

    fn build_tree(&mut self, memo: &mut Memoizer, theme: &Theme) -> Node {
        let grid = memo.memo("grid", (self.lit, theme.clone()), |(lit, theme)| {
            Node::new("grid")
                .prop("y", TOP)
                .children((0..COLUMNS * ROWS).map(|index| cell(index, index == *lit, theme)))
                .build()
        });
        let header = memo.memo(
            "header",
            (self.hits, self.misses, self.width, theme.color("text")),
            |(hits, misses, width, color)| {
                Node::new("text")
                    .prop("width", *width)
                    .prop("height", TOP)
                    .prop("color", *color)
                    .prop("text", format!("hit {hits} miss {misses}"))
                    .build()
            },
        );
        Node::new("screen").child(header).child(grid).build()
    }

    fn handle_input(&mut self, event: &InputEvent, route: &EventRoute) -> InputOutcome {
        let InputEvent::PointerDown { .. } = event else {
            return InputOutcome::Ignored;
        };
        match route.innermost_key() {
            Some(key) if *key == NodeKey::from(self.lit) => {
                self.hits += 1;
                self.advance();
                InputOutcome::Handled
            }
            Some(_) => {
                self.misses += 1;
                InputOutcome::Handled
            }
            None => InputOutcome::Ignored,
        }
    }

    fn state_snapshot(&self) -> StateSnapshot {
        StateSnapshot::new()
            .with("lit", self.lit as i64)
            .with("step", self.step as i64)
            .with("hits", self.hits)
            .with("misses", self.misses)
    }
}
