#![doc = r"Node model, differ, memoizer and state deltas for the Mindframe rendering core."]

pub mod collections;
pub mod diff;
pub mod error;
pub mod hash;
pub mod memo;
pub mod node;
pub mod patch;
pub mod routing;
pub mod state;
pub mod sync;
pub mod value;

pub use diff::{count_patches, diff, DiffStats, Differ, Patch, PatchSummary, PropChanges};
pub use error::StructuralError;
pub use hash::Fingerprint;
pub use memo::{MemoConfig, MemoStats, Memoizer};
pub use node::{Identity, Node, NodeBuilder, NodeKey, NodePath, PropName, Props, Tag};
pub use patch::{apply_patches, assign_identities, MirrorNode, PatchError, PatchTarget};
pub use routing::{route_point, EventRoute, RouteStep};
pub use state::{StateDelta, StateSnapshot};
pub use sync::{
    MismatchPolicy, StateDecoder, StateEncoder, SyncConfig, SyncError, SyncStats, SyncUpdate,
};
pub use value::Value;

pub use mindframe_ui_graphics::{Color, Point, Rect, Size};
