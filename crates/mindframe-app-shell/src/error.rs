use mindframe_core::StructuralError;
use mindframe_render_common::{Lifecycle, LifecycleError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no training module registered as `{0}`")]
    Unknown(String),
    #[error("a training module is already registered as `{0}`")]
    Duplicate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("session in state {state:?} is not running")]
    NotRunning { state: Lifecycle },
    #[error("module `{module}` built an invalid tree: {source}")]
    InvalidTree {
        module: String,
        #[source]
        source: StructuralError,
    },
}
