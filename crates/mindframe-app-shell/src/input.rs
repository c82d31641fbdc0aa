use mindframe_ui_graphics::Point;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown { position: Point },
    PointerUp { position: Point },
    PointerMove { position: Point },
    Key { name: String },
}

impl InputEvent {
    /// Viewport position for pointer events, `None` for keys.
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::PointerDown { position }
            | InputEvent::PointerUp { position }
            | InputEvent::PointerMove { position } => Some(*position),
            InputEvent::Key { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    Ignored,
    Handled,
}

impl InputOutcome {
    pub fn is_handled(self) -> bool {
        matches!(self, InputOutcome::Handled)
    }
}
