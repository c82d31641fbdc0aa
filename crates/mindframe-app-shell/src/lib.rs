//! Session driver tying training modules to the diff and render pipeline.
//!
//! A [`Shell`] resolves modules by id from its [`ModuleRegistry`] and opens
//! [`Session`]s. Each session tick builds the module's tree, diffs it against
//! the tree on screen, hands the patches to its renderer and encodes the
//! module's state for the server.

mod error;
mod input;
mod module;
mod options;
mod registry;
mod session;
mod shell;

pub use error::{RegistryError, ShellError};
pub use input::{InputEvent, InputOutcome};
pub use module::TrainingModule;
pub use options::ShellOptions;
pub use registry::{Difficulty, ModuleConstructor, ModuleDescriptor, ModuleRegistry};
pub use session::{Session, TickReport};
pub use shell::Shell;
