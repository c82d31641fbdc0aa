//! Pure math/data for drawing in Mindframe
//!
//! Geometry primitives, colours and themes shared by every Mindframe crate.

mod color;
mod geometry;
mod theme;

pub use color::*;
pub use geometry::*;
pub use theme::Theme;

pub mod prelude {
    pub use crate::color::Color;
    pub use crate::geometry::{Point, Rect, Size};
    pub use crate::theme::Theme;
}
