use std::collections::VecDeque;
use std::time::{Duration, Instant};

use mindframe_core::{
    route_point, DiffStats, Differ, EventRoute, MemoStats, Memoizer, Node, StateEncoder,
    SyncUpdate,
};
use mindframe_render_common::{
    DrawBackend, FrameError, FrameStats, Lifecycle, RendererAdapter, SessionId,
};
use mindframe_ui_graphics::Theme;

use crate::error::ShellError;
use crate::input::{InputEvent, InputOutcome};
use crate::module::TrainingModule;
use crate::options::ShellOptions;

/// What one [`Session::tick`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub diff: DiffStats,
    /// Memo hits and misses of this tick alone.
    pub memo: MemoStats,
    pub frame: FrameStats,
    /// Background renders finished before the tree was built.
    pub completed: usize,
    /// A state update was queued for [`Session::take_sync_update`].
    pub synced: bool,
    /// The retained tree fell out of step and will be rebuilt next tick.
    pub resynced: bool,
    pub duration: Duration,
}

/// One running instance of a training module bound to a drawing backend.
pub struct Session<B: DrawBackend> {
    module_id: String,
    module: Box<dyn TrainingModule>,
    adapter: RendererAdapter<B>,
    memo: Memoizer,
    differ: Differ,
    encoder: StateEncoder,
    previous: Option<Node>,
    sync_queue: VecDeque<SyncUpdate>,
    options: ShellOptions,
    ticks: u64,
}

impl<B: DrawBackend> Session<B> {
    pub(crate) fn new(
        module_id: String,
        module: Box<dyn TrainingModule>,
        adapter: RendererAdapter<B>,
        options: ShellOptions,
    ) -> Self {
        Self {
            module_id,
            module,
            memo: Memoizer::with_config(options.memo),
            differ: Differ::new(),
            encoder: StateEncoder::new(options.sync),
            adapter,
            previous: None,
            sync_queue: VecDeque::new(),
            options,
            ticks: 0,
        }
    }

    pub fn id(&self) -> SessionId {
        self.adapter.session()
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.adapter.lifecycle()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn adapter(&self) -> &RendererAdapter<B> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut RendererAdapter<B> {
        &mut self.adapter
    }

    pub fn backend(&self) -> &B {
        self.adapter.backend()
    }

    pub fn memoizer(&self) -> &Memoizer {
        &self.memo
    }

    /// The tree the renderer currently shows.
    pub fn current_tree(&self) -> Option<&Node> {
        self.previous.as_ref()
    }

    pub fn theme(&self) -> &Theme {
        &self.options.theme
    }

    /// Switches the theme the module builds with from the next tick on.
    pub fn set_theme(&mut self, theme: Theme) {
        if theme == self.options.theme {
            return;
        }
        log::info!(
            "session {}: theme {} -> {}",
            self.id(),
            self.options.theme.id(),
            theme.id()
        );
        self.options.theme = theme;
    }

    pub fn on_patches_applied(&mut self, observer: impl FnMut(&FrameStats) + 'static) {
        self.adapter.on_patches_applied(observer);
    }

    pub fn mount(&mut self) -> Result<(), ShellError> {
        self.adapter.mount()?;
        self.module
            .initialize(self.options.viewport(), &self.options.theme);
        log::debug!("session {} mounted `{}`", self.id(), self.module_id);
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), ShellError> {
        Ok(self.adapter.start()?)
    }

    pub fn pause(&mut self) -> Result<(), ShellError> {
        Ok(self.adapter.pause()?)
    }

    pub fn resume(&mut self) -> Result<(), ShellError> {
        Ok(self.adapter.resume()?)
    }

    /// Releases the session's surfaces. Updates still queued for the server
    /// stay available through [`Session::take_sync_update`].
    pub fn unmount(&mut self) -> Result<(), ShellError> {
        self.adapter.unmount()?;
        self.previous = None;
        log::debug!(
            "session {} unmounted `{}` after {} ticks",
            self.id(),
            self.module_id,
            self.ticks
        );
        Ok(())
    }

    /// Advances the module by `dt` and brings the screen up to date.
    ///
    /// Only running sessions tick; a paused one keeps showing its last frame.
    pub fn tick(&mut self, dt: Duration) -> Result<TickReport, ShellError> {
        let state = self.adapter.lifecycle();
        if state != Lifecycle::Running {
            return Err(ShellError::NotRunning { state });
        }
        let started = Instant::now();
        let completed = self.adapter.poll_completions();

        self.module.update(dt);
        let memo_before = self.memo.stats();
        self.memo.begin_tick();
        let tree = self.module.build_tree(&mut self.memo, &self.options.theme);
        self.memo.end_tick();
        let memo_after = self.memo.stats();

        let patches = match self.differ.diff(self.previous.as_ref(), &tree) {
            Ok(patches) => patches,
            Err(source) => {
                log::error!("session {}: {source}", self.id());
                return Err(ShellError::InvalidTree {
                    module: self.module_id.clone(),
                    source,
                });
            }
        };
        let frame = self.adapter.apply_patches(&patches)?;

        let resynced = frame
            .errors
            .iter()
            .any(|error| matches!(error, FrameError::Patch(_)));
        if resynced {
            log::warn!(
                "session {}: retained tree out of step, rebuilding from scratch",
                self.id()
            );
            self.adapter.reset();
            self.previous = None;
        } else {
            self.previous = Some(tree);
        }

        let synced = match self.encoder.observe(&self.module.state_snapshot()) {
            Some(update) => {
                self.sync_queue.push_back(update);
                true
            }
            None => false,
        };

        self.ticks += 1;
        let report = TickReport {
            tick: self.ticks,
            diff: self.differ.stats(),
            memo: MemoStats {
                hits: memo_after.hits - memo_before.hits,
                misses: memo_after.misses - memo_before.misses,
                dropped: memo_after.dropped - memo_before.dropped,
            },
            frame,
            completed,
            synced,
            resynced,
            duration: started.elapsed(),
        };
        log::debug!(
            "session {} tick {}: {} patches, {} draw calls, memo {}/{}",
            self.id(),
            report.tick,
            report.diff.patches,
            report.frame.draw_calls,
            report.memo.hits,
            report.memo.hits + report.memo.misses
        );
        Ok(report)
    }

    /// Routes `event` through the tree currently on screen. Sessions that
    /// are not running ignore input.
    pub fn handle_input(&mut self, event: &InputEvent) -> InputOutcome {
        if self.adapter.lifecycle() != Lifecycle::Running {
            log::debug!(
                "session {} ignored input while {:?}",
                self.id(),
                self.adapter.lifecycle()
            );
            return InputOutcome::Ignored;
        }
        let route = match (self.previous.as_ref(), event.position()) {
            (Some(root), Some(position)) => route_point(root, position),
            _ => EventRoute::empty(),
        };
        self.module.handle_input(event, &route)
    }

    /// Oldest state update not yet handed to the server.
    pub fn take_sync_update(&mut self) -> Option<SyncUpdate> {
        self.sync_queue.pop_front()
    }

    pub fn pending_sync_updates(&self) -> usize {
        self.sync_queue.len()
    }

    /// Makes the next queued update a full snapshot, e.g. after the server
    /// lost its copy.
    pub fn request_full_sync(&mut self) {
        self.encoder.force_full();
    }
}
