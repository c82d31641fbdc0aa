//! Testing utilities and harness for Mindframe

pub mod fixtures;
pub mod recording;

pub use recording::*;

pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::recording::*;
}
