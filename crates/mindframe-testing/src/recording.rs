//! A drawing backend that records everything it is asked to do.

use std::cell::RefCell;
use std::rc::Rc;

use mindframe_core::collections::map::HashSet;
use mindframe_core::Fingerprint;
use mindframe_render_common::{
    DrawBackend, DrawBatch, DrawOp, FrameStats, Rendered, RendererAdapter, SurfaceRequest,
};
use mindframe_ui_graphics::Size;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedSurface {
    pub id: u64,
    pub fingerprint: Fingerprint,
    pub size: Size,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("injected failure: {0}")]
pub struct InjectedFailure(pub String);

/// Records renders, releases and draw calls; failures and background
/// rendering can be switched on per test.
#[derive(Debug)]
pub struct RecordingBackend {
    next_id: u64,
    batching: bool,
    defer: bool,
    failing_tags: HashSet<String>,
    failing_fingerprints: HashSet<Fingerprint>,
    fail_submit: bool,
    rendered: Vec<SurfaceRequest>,
    queued: Vec<SurfaceRequest>,
    completed: Vec<(Fingerprint, Result<RecordedSurface, InjectedFailure>)>,
    released: Vec<RecordedSurface>,
    batches: Vec<DrawBatch<RecordedSurface>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            batching: true,
            defer: false,
            failing_tags: HashSet::new(),
            failing_fingerprints: HashSet::new(),
            fail_submit: false,
            rendered: Vec::new(),
            queued: Vec::new(),
            completed: Vec::new(),
            released: Vec::new(),
            batches: Vec::new(),
        }
    }

    /// A backend that takes one draw call per op.
    pub fn unbatched() -> Self {
        Self {
            batching: false,
            ..Self::new()
        }
    }

    pub fn set_deferred(&mut self, defer: bool) {
        self.defer = defer;
    }

    pub fn fail_tag(&mut self, tag: impl Into<String>) {
        self.failing_tags.insert(tag.into());
    }

    pub fn fail_fingerprint(&mut self, fingerprint: Fingerprint) {
        self.failing_fingerprints.insert(fingerprint);
    }

    pub fn fail_submits(&mut self, fail: bool) {
        self.fail_submit = fail;
    }

    /// Finishes every deferred render; results surface on the next poll.
    pub fn complete_deferred(&mut self) -> usize {
        let queued = std::mem::take(&mut self.queued);
        let count = queued.len();
        for request in queued {
            let result = self.produce(&request);
            self.completed.push((request.fingerprint, result));
        }
        count
    }

    /// Every request that reached `render_surface`, deferred ones included.
    pub fn rendered(&self) -> &[SurfaceRequest] {
        &self.rendered
    }

    pub fn render_count(&self) -> usize {
        self.rendered.len()
    }

    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    pub fn released(&self) -> &[RecordedSurface] {
        &self.released
    }

    pub fn batches(&self) -> &[DrawBatch<RecordedSurface>] {
        &self.batches
    }

    pub fn draw_calls(&self) -> usize {
        self.batches.len()
    }

    pub fn take_batches(&mut self) -> Vec<DrawBatch<RecordedSurface>> {
        std::mem::take(&mut self.batches)
    }

    /// Every op of every submitted batch, in submission order.
    pub fn ops(&self) -> impl Iterator<Item = &DrawOp<RecordedSurface>> {
        self.batches.iter().flat_map(|batch| batch.ops.iter())
    }

    /// Fingerprints of the surfaces blitted so far, in submission order.
    pub fn blitted(&self) -> Vec<Fingerprint> {
        self.ops()
            .filter_map(|op| match op {
                DrawOp::BlitSurface { surface, .. } => Some(surface.fingerprint),
                _ => None,
            })
            .collect()
    }

    fn produce(&mut self, request: &SurfaceRequest) -> Result<RecordedSurface, InjectedFailure> {
        if self.failing_tags.contains(&request.tag)
            || self.failing_fingerprints.contains(&request.fingerprint)
        {
            return Err(InjectedFailure(format!("{} {}", request.tag, request.fingerprint)));
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(RecordedSurface {
            id,
            fingerprint: request.fingerprint,
            size: request.size,
        })
    }
}

impl DrawBackend for RecordingBackend {
    type Surface = RecordedSurface;
    type Error = InjectedFailure;

    fn render_surface(
        &mut self,
        request: &SurfaceRequest,
    ) -> Result<Rendered<RecordedSurface>, InjectedFailure> {
        self.rendered.push(request.clone());
        if self.defer {
            self.queued.push(request.clone());
            return Ok(Rendered::Deferred);
        }
        self.produce(request).map(Rendered::Ready)
    }

    fn poll_completed(&mut self) -> Vec<(Fingerprint, Result<RecordedSurface, InjectedFailure>)> {
        std::mem::take(&mut self.completed)
    }

    fn release_surface(&mut self, surface: RecordedSurface) {
        self.released.push(surface);
    }

    fn submit(&mut self, batch: &DrawBatch<RecordedSurface>) -> Result<(), InjectedFailure> {
        if self.fail_submit {
            return Err(InjectedFailure("submit".to_owned()));
        }
        self.batches.push(batch.clone());
        Ok(())
    }

    fn supports_batching(&self) -> bool {
        self.batching
    }
}

/// Collects every [`FrameStats`] the adapter publishes.
pub fn record_frames<B: DrawBackend>(adapter: &mut RendererAdapter<B>) -> Rc<RefCell<Vec<FrameStats>>> {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&frames);
    adapter.on_patches_applied(move |stats| sink.borrow_mut().push(stats.clone()));
    frames
}
