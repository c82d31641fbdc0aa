//! Small trees shaped like the ones training modules build.

use mindframe_core::Node;

pub const CELL_SIZE: i64 = 20;
pub const CELL_GAP: i64 = 4;

/// One square of a memory grid; lit cells are white.
pub fn grid_cell(index: usize, column: usize, row: usize, lit: bool) -> Node {
    let stride = CELL_SIZE + CELL_GAP;
    Node::new("cell")
        .key(index)
        .prop("x", column as i64 * stride)
        .prop("y", row as i64 * stride)
        .prop("width", CELL_SIZE)
        .prop("height", CELL_SIZE)
        .prop("color", if lit { "#ffffff" } else { "#303030" })
        .build()
}

/// A `columns` x `rows` grid of keyed cells with `lit` highlighted.
pub fn memory_grid(columns: usize, rows: usize, lit: &[usize]) -> Node {
    Node::new("grid")
        .children((0..columns * rows).map(|index| {
            grid_cell(index, index % columns, index / columns, lit.contains(&index))
        }))
        .build()
}

/// A text leaf at an absolute offset inside its parent.
pub fn caption(text: &str, x: i64, y: i64) -> Node {
    Node::new("text")
        .prop("text", text)
        .prop("x", x)
        .prop("y", y)
        .prop("width", 8 * text.chars().count() as i64)
        .prop("height", 12)
        .build()
}

/// A labelled container holding `children`.
pub fn panel(label: &str, width: i64, height: i64, children: Vec<Node>) -> Node {
    Node::new("panel")
        .prop("width", width)
        .prop("height", height)
        .prop("background", "#101010")
        .prop("label", label)
        .children(children)
        .build()
}
