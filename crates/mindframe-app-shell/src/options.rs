use mindframe_core::{MemoConfig, SyncConfig};
use mindframe_render_common::{AdapterOptions, CacheConfig};
use mindframe_ui_graphics::{Color, Size, Theme};

/// Settings shared by every session a [`crate::Shell`] opens.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShellOptions {
    pub memo: MemoConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    pub adapter: AdapterOptions,
    /// Theme new sessions start with; see [`crate::Session::set_theme`].
    pub theme: Theme,
}

impl ShellOptions {
    pub fn viewport(&self) -> Size {
        self.adapter.viewport
    }

    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.adapter = self.adapter.with_viewport(viewport);
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.adapter = self.adapter.with_clear_color(color);
        self
    }

    pub fn with_memo_retention(mut self, ticks: u64) -> Self {
        self.memo = self.memo.with_retain_ticks(ticks);
        self
    }

    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}
