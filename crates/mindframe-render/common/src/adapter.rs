//! Applies patch lists to a retained tree and repaints what they damaged.

use std::time::{Duration, Instant};

use mindframe_core::collections::map::{HashMap, HashSet};
use mindframe_core::{count_patches, Fingerprint, Patch};
use mindframe_ui_graphics::{Color, Point, Rect, Size};

use crate::backend::{DrawBackend, DrawBatch, DrawOp, Rendered};
use crate::error::{FrameError, LifecycleError, RenderError};
use crate::retained::{RetainedContext, RetainedNode};
use crate::surface_cache::{
    Begin, Finish, RenderTicket, SessionId, SessionToken, SharedSurfaceCache,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Mounted,
    Running,
    Paused,
    Unmounted,
}

impl Lifecycle {
    pub fn accepts_patches(self) -> bool {
        matches!(self, Lifecycle::Mounted | Lifecycle::Running)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdapterOptions {
    /// Damage outside the viewport is never painted.
    pub viewport: Size,
    pub clear_color: Color,
    /// Drawn where a surface is missing, still rendering or failed.
    pub placeholder_color: Color,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            viewport: Size::new(800.0, 600.0),
            clear_color: Color::BLACK,
            placeholder_color: Color::TRANSPARENT,
        }
    }
}

impl AdapterOptions {
    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_placeholder_color(mut self, color: Color) -> Self {
        self.placeholder_color = color;
        self
    }
}

/// What one call to [`RendererAdapter::apply_patches`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    /// Patches applied, nested child patches included.
    pub patch_count: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub draw_calls: usize,
    pub draw_ops: usize,
    /// Damaged regions repainted.
    pub regions: usize,
    /// Leaves painted as placeholders while their surface renders in the background.
    pub deferred: usize,
    /// Surfaces released on the backend after leaving the cache.
    pub evicted: usize,
    pub duration: Duration,
    pub errors: Vec<FrameError>,
}

impl FrameStats {
    pub fn is_noop(&self) -> bool {
        self.patch_count == 0 && self.draw_calls == 0 && self.errors.is_empty()
    }
}

type FrameObserver = Box<dyn FnMut(&FrameStats)>;

/// Drives one session's drawing on a [`DrawBackend`].
///
/// Surfaces come from a cache that may be shared with other sessions of the
/// same module, so every backend attached to one cache must accept surfaces
/// produced by any of them.
pub struct RendererAdapter<B: DrawBackend> {
    backend: B,
    cache: SharedSurfaceCache<B::Surface>,
    session: SessionId,
    token: Option<SessionToken>,
    options: AdapterOptions,
    lifecycle: Lifecycle,
    roots: Vec<RetainedNode>,
    tick: u64,
    damage: Vec<Rect>,
    needs_refresh: bool,
    deferred: HashMap<Fingerprint, RenderTicket>,
    waiting: HashSet<Fingerprint>,
    failed: HashSet<Fingerprint>,
    carried_errors: Vec<FrameError>,
    observers: Vec<FrameObserver>,
}

impl<B: DrawBackend> RendererAdapter<B> {
    pub fn new(
        backend: B,
        cache: SharedSurfaceCache<B::Surface>,
        session: SessionId,
        options: AdapterOptions,
    ) -> Self {
        Self {
            backend,
            cache,
            session,
            token: None,
            options,
            lifecycle: Lifecycle::Uninitialized,
            roots: Vec::new(),
            tick: 0,
            damage: Vec::new(),
            needs_refresh: false,
            deferred: HashMap::new(),
            waiting: HashSet::new(),
            failed: HashSet::new(),
            carried_errors: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn options(&self) -> AdapterOptions {
        self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn cache(&self) -> &SharedSurfaceCache<B::Surface> {
        &self.cache
    }

    pub fn retained_root(&self) -> Option<&RetainedNode> {
        self.roots.first()
    }

    /// Renders still running in the background for this session.
    pub fn pending_renders(&self) -> usize {
        self.deferred.len()
    }

    pub fn on_patches_applied(&mut self, observer: impl FnMut(&FrameStats) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn mount(&mut self) -> Result<(), LifecycleError> {
        self.transition("mount", &[Lifecycle::Uninitialized], Lifecycle::Mounted)?;
        self.token = Some(self.cache.borrow_mut().register_session(self.session));
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), LifecycleError> {
        self.transition("start", &[Lifecycle::Mounted], Lifecycle::Running)
    }

    /// Stops accepting patches. Background renders are handed back to the
    /// cache so sessions waiting on the same content can render it
    /// themselves; results that still arrive are released as stale.
    pub fn pause(&mut self) -> Result<(), LifecycleError> {
        self.transition("pause", &[Lifecycle::Running], Lifecycle::Paused)?;
        if !self.deferred.is_empty() {
            log::debug!(
                "session {}: handing back {} background renders",
                self.session,
                self.deferred.len()
            );
            let mut cache = self.cache.borrow_mut();
            for (_, ticket) in self.deferred.drain() {
                cache.abandon(ticket);
            }
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), LifecycleError> {
        self.transition("resume", &[Lifecycle::Paused], Lifecycle::Running)
    }

    /// Releases every surface only this session held and cancels its renders.
    ///
    /// Renders already handed to the backend keep their tickets, so results
    /// that arrive later are recognised as stale and released.
    pub fn unmount(&mut self) -> Result<(), LifecycleError> {
        self.transition(
            "unmount",
            &[Lifecycle::Mounted, Lifecycle::Running, Lifecycle::Paused],
            Lifecycle::Unmounted,
        )?;
        let released = self.cache.borrow_mut().unmount(self.session);
        log::debug!(
            "session {}: unmounted, releasing {} surfaces",
            self.session,
            released.len()
        );
        for surface in released {
            self.backend.release_surface(surface);
        }
        self.token = None;
        self.roots.clear();
        self.damage.clear();
        self.needs_refresh = false;
        self.waiting.clear();
        self.failed.clear();
        self.carried_errors.clear();
        Ok(())
    }

    /// Forgets the retained tree so the next patch list can insert a fresh root.
    pub fn reset(&mut self) {
        for root in self.roots.drain(..) {
            self.damage.extend(root.bounds());
        }
        self.needs_refresh = false;
        self.failed.clear();
    }

    fn transition(
        &mut self,
        action: &'static str,
        from: &[Lifecycle],
        to: Lifecycle,
    ) -> Result<(), LifecycleError> {
        if !from.contains(&self.lifecycle) {
            return Err(LifecycleError::InvalidTransition {
                from: self.lifecycle,
                action,
            });
        }
        log::debug!("session {}: {:?} -> {:?}", self.session, self.lifecycle, to);
        self.lifecycle = to;
        Ok(())
    }

    /// Applies `patches` in order and repaints the damaged regions.
    ///
    /// An empty list with nothing left to repaint does no drawing at all.
    pub fn apply_patches(&mut self, patches: &[Patch]) -> Result<FrameStats, LifecycleError> {
        let token = match self.token {
            Some(token) if self.lifecycle.accepts_patches() => token,
            _ => {
                log::warn!(
                    "session {}: dropping {} patches while {:?}",
                    self.session,
                    patches.len(),
                    self.lifecycle
                );
                return Err(LifecycleError::NotAccepting {
                    state: self.lifecycle,
                });
            }
        };
        let started = Instant::now();
        self.tick += 1;
        let mut stats = FrameStats {
            frame: self.tick,
            patch_count: count_patches(patches),
            errors: std::mem::take(&mut self.carried_errors),
            ..FrameStats::default()
        };

        let mut damage = std::mem::take(&mut self.damage);
        if !patches.is_empty() {
            let mut cx = RetainedContext::default();
            if let Err(err) = mindframe_core::apply_patches(&mut self.roots, patches, &mut cx) {
                log::warn!("session {}: {err}", self.session);
                stats.errors.push(err.into());
            }
            damage.append(&mut cx.removed);
            self.needs_refresh = true;
        }
        if std::mem::take(&mut self.needs_refresh) {
            for root in &mut self.roots {
                root.refresh(Point::ZERO, &mut damage);
            }
            self.forget_unreferenced_failures();
        }

        let viewport = Rect::from_origin_size(Point::ZERO, self.options.viewport);
        let regions = merge_regions(damage, viewport);
        if !regions.is_empty() {
            self.paint(&regions, token, &mut stats);
        }
        self.release_evicted(&mut stats);

        stats.duration = started.elapsed();
        log::debug!(
            "session {} frame {}: {} patches, {} regions, {} draw calls, {} hits, {} misses",
            self.session,
            stats.frame,
            stats.patch_count,
            stats.regions,
            stats.draw_calls,
            stats.cache_hits,
            stats.cache_misses
        );
        for observer in &mut self.observers {
            observer(&stats);
        }
        Ok(stats)
    }

    /// Publishes background renders that finished since the last call.
    ///
    /// Leaves that were waiting on them are repainted by the next
    /// [`apply_patches`](Self::apply_patches). Returns the number of results
    /// drained from the backend.
    pub fn poll_completions(&mut self) -> usize {
        let completed = self.backend.poll_completed();
        let drained = completed.len();
        for (fingerprint, result) in completed {
            let Some(ticket) = self.deferred.remove(&fingerprint) else {
                log::debug!("session {}: no ticket for {fingerprint}", self.session);
                if let Ok(surface) = result {
                    self.backend.release_surface(surface);
                }
                continue;
            };
            match result {
                Ok(surface) => {
                    let finished = self.cache.borrow_mut().finish(ticket, surface, self.tick);
                    if let Finish::Stale(surface) = finished {
                        self.backend.release_surface(surface);
                    }
                }
                Err(err) => {
                    self.cache.borrow_mut().abandon(ticket);
                    let error = RenderError {
                        fingerprint,
                        message: err.to_string(),
                    };
                    log::error!("session {}: {error}", self.session);
                    self.failed.insert(fingerprint);
                    self.carried_errors.push(error.into());
                }
            }
        }

        let ready: HashSet<Fingerprint> = {
            let cache = self.cache.borrow();
            let ready = self
                .waiting
                .iter()
                .copied()
                .filter(|fingerprint| !cache.is_in_flight(*fingerprint))
                .collect();
            ready
        };
        if !ready.is_empty() {
            self.waiting.retain(|fingerprint| !ready.contains(fingerprint));
            for root in &mut self.roots {
                self.needs_refresh |= root.damage_matching(&ready);
            }
        }
        drained
    }

    /// A failed fingerprint is retried once no leaf shows it any more and
    /// it comes back later.
    fn forget_unreferenced_failures(&mut self) {
        if self.failed.is_empty() {
            return;
        }
        let mut live = HashSet::new();
        for root in &self.roots {
            root.collect_leaf_fingerprints(&mut live);
        }
        self.failed.retain(|fingerprint| live.contains(fingerprint));
    }

    fn paint(&mut self, regions: &[Rect], token: SessionToken, stats: &mut FrameStats) {
        let mut painter = FramePainter {
            backend: &mut self.backend,
            cache: &self.cache,
            token,
            tick: self.tick,
            options: self.options,
            deferred: &mut self.deferred,
            waiting: &mut self.waiting,
            failed: &mut self.failed,
            resolved: HashMap::new(),
            stats,
        };
        for region in regions {
            let batch = painter.region(&self.roots, *region);
            painter.submit(batch);
        }
    }

    fn release_evicted(&mut self, stats: &mut FrameStats) {
        let released = {
            let mut cache = self.cache.borrow_mut();
            let mut released = cache.take_evicted();
            released.extend(cache.maybe_evict(self.tick));
            released
        };
        stats.evicted = released.len();
        for surface in released {
            self.backend.release_surface(surface);
        }
    }
}

/// Merges overlapping damage into disjoint regions clipped to `viewport`.
pub fn merge_regions(damage: Vec<Rect>, viewport: Rect) -> Vec<Rect> {
    let mut regions: Vec<Rect> = Vec::new();
    for rect in damage
        .into_iter()
        .filter_map(|rect| rect.intersect(&viewport))
    {
        let mut merged = rect;
        while let Some(index) = regions
            .iter()
            .position(|region| region.intersect(&merged).is_some())
        {
            merged = merged.union(&regions.swap_remove(index));
        }
        regions.push(merged);
    }
    regions
}

struct FramePainter<'a, B: DrawBackend> {
    backend: &'a mut B,
    cache: &'a SharedSurfaceCache<B::Surface>,
    token: SessionToken,
    tick: u64,
    options: AdapterOptions,
    deferred: &'a mut HashMap<Fingerprint, RenderTicket>,
    waiting: &'a mut HashSet<Fingerprint>,
    failed: &'a mut HashSet<Fingerprint>,
    resolved: HashMap<Fingerprint, Option<B::Surface>>,
    stats: &'a mut FrameStats,
}

impl<B: DrawBackend> FramePainter<'_, B> {
    /// Ops repainting `region` from the roots up, in z-order.
    fn region(&mut self, roots: &[RetainedNode], region: Rect) -> DrawBatch<B::Surface> {
        let mut batch = DrawBatch::new(region);
        batch.ops.push(DrawOp::FillRect {
            rect: region,
            color: self.options.clear_color,
        });
        for root in roots {
            self.node(root, region, &mut batch.ops);
        }
        batch
    }

    fn node(&mut self, node: &RetainedNode, region: Rect, ops: &mut Vec<DrawOp<B::Surface>>) {
        let Some(bounds) = node.bounds() else {
            return;
        };
        if bounds.intersect(&region).is_none() {
            return;
        }
        let frame = node.frame();
        if frame.intersect(&region).is_some() {
            if node.is_renderable() {
                ops.push(match self.surface(node) {
                    Some(surface) => DrawOp::BlitSurface {
                        rect: frame,
                        surface,
                    },
                    None => DrawOp::FillRect {
                        rect: frame,
                        color: self.options.placeholder_color,
                    },
                });
            } else if let Some(color) = node.background() {
                ops.push(DrawOp::FillRect { rect: frame, color });
            }
            if let Some((text, color, size)) = node.label() {
                ops.push(DrawOp::DrawText {
                    origin: frame.origin(),
                    text: text.to_owned(),
                    color,
                    size,
                });
            }
        }
        for child in node.children() {
            self.node(child, region, ops);
        }
    }

    /// Each fingerprint is resolved at most once per frame.
    fn surface(&mut self, node: &RetainedNode) -> Option<B::Surface> {
        let fingerprint = node.fingerprint();
        if let Some(resolved) = self.resolved.get(&fingerprint) {
            return resolved.clone();
        }
        let resolved = self.resolve(node);
        self.resolved.insert(fingerprint, resolved.clone());
        resolved
    }

    fn resolve(&mut self, node: &RetainedNode) -> Option<B::Surface> {
        let fingerprint = node.fingerprint();
        if self.failed.contains(&fingerprint) {
            return None;
        }
        let begin = self
            .cache
            .borrow_mut()
            .begin(fingerprint, self.token, self.tick);
        let ticket = match begin {
            Begin::Hit(surface) => {
                self.stats.cache_hits += 1;
                return Some(surface);
            }
            Begin::InFlight => {
                self.waiting.insert(fingerprint);
                self.stats.deferred += 1;
                return None;
            }
            Begin::Miss(ticket) => ticket,
        };
        self.stats.cache_misses += 1;
        match self.backend.render_surface(&node.surface_request()) {
            Ok(Rendered::Ready(surface)) => {
                let finished = self.cache.borrow_mut().finish(ticket, surface, self.tick);
                match finished {
                    Finish::Stored(surface) => Some(surface),
                    Finish::Stale(surface) => {
                        self.backend.release_surface(surface);
                        None
                    }
                }
            }
            Ok(Rendered::Deferred) => {
                self.deferred.insert(fingerprint, ticket);
                self.waiting.insert(fingerprint);
                self.stats.deferred += 1;
                None
            }
            Err(err) => {
                self.cache.borrow_mut().abandon(ticket);
                let error = RenderError {
                    fingerprint,
                    message: err.to_string(),
                };
                log::error!("session {}: {error}", self.token.id);
                self.failed.insert(fingerprint);
                self.stats.errors.push(error.into());
                None
            }
        }
    }

    /// One draw call per region when the backend batches, one per op otherwise.
    fn submit(&mut self, batch: DrawBatch<B::Surface>) {
        self.stats.regions += 1;
        self.stats.draw_ops += batch.len();
        if self.backend.supports_batching() {
            self.submit_call(&batch);
            return;
        }
        let DrawBatch { region, ops } = batch;
        for op in ops {
            self.submit_call(&DrawBatch {
                region,
                ops: vec![op],
            });
        }
    }

    fn submit_call(&mut self, batch: &DrawBatch<B::Surface>) {
        self.stats.draw_calls += 1;
        if let Err(err) = self.backend.submit(batch) {
            log::error!("session {}: draw call failed: {err}", self.token.id);
            self.stats.errors.push(FrameError::Submit(err.to_string()));
        }
    }
}

#[cfg(test)]
#[path = "tests/adapter_tests.rs"]
mod tests;
