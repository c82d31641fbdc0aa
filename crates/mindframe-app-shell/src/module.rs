use std::time::Duration;

use mindframe_core::{EventRoute, Memoizer, Node, StateSnapshot};
use mindframe_ui_graphics::{Size, Theme};

use crate::input::{InputEvent, InputOutcome};

/// A training exercise as seen by the session driver.
///
/// Modules own their game state. Each tick the driver calls [`update`] and
/// then [`build_tree`], which must describe the whole screen; unchanged parts
/// are expected to come back through the memoizer so they cost nothing to
/// diff.
///
/// The session's current [`Theme`] is passed to every build. Subtrees that
/// read it should take it (or the parts they use) as a memo dependency, so a
/// theme switch rebuilds them and leaves the rest alone.
///
/// [`update`]: TrainingModule::update
/// [`build_tree`]: TrainingModule::build_tree
pub trait TrainingModule {
    /// Called once when the session mounts.
    fn initialize(&mut self, viewport: Size, theme: &Theme);

    fn update(&mut self, dt: Duration);

    fn build_tree(&mut self, memo: &mut Memoizer, theme: &Theme) -> Node;

    /// `route` lists the nodes under the pointer, outermost first. It is
    /// empty for key events and before the first frame.
    fn handle_input(&mut self, event: &InputEvent, route: &EventRoute) -> InputOutcome;

    fn state_snapshot(&self) -> StateSnapshot;
}
