//! Common rendering contracts and the patch-driven renderer adapter shared
//! between drawing backends.

mod adapter;
mod backend;
mod error;
mod retained;
pub mod surface_cache;

pub use adapter::{merge_regions, AdapterOptions, FrameStats, Lifecycle, RendererAdapter};
pub use backend::{
    DrawBackend, DrawBatch, DrawOp, Rendered, SurfaceContent, SurfaceRequest, DEFAULT_FONT_SIZE,
};
pub use error::{FrameError, LifecycleError, RenderError};
pub use retained::{RetainedContext, RetainedNode};
pub use surface_cache::{
    Acquired, Begin, CacheConfig, CacheStats, Finish, RenderTicket, SessionId, SessionToken,
    SharedSurfaceCache, SurfaceCache,
};
