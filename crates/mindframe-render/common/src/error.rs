use mindframe_core::{Fingerprint, PatchError};
use thiserror::Error;

use crate::adapter::Lifecycle;

/// A backend failed to produce the surface for one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rendering {fingerprint} failed: {message}")]
pub struct RenderError {
    pub fingerprint: Fingerprint,
    pub message: String,
}

/// Problems recorded in [`crate::FrameStats::errors`]; none of them abort a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("submitting a draw batch failed: {0}")]
    Submit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot {action} a renderer in state {from:?}")]
    InvalidTransition {
        from: Lifecycle,
        action: &'static str,
    },
    #[error("renderer in state {state:?} does not accept patches")]
    NotAccepting { state: Lifecycle },
}
