use thiserror::Error;

use crate::node::{NodeKey, NodePath};

/// Malformed node tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("duplicate sibling key `{key}` under {path}")]
    DuplicateKey { key: NodeKey, path: NodePath },
}
