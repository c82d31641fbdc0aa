use mindframe_core::collections::map::HashMap;
use mindframe_render_common::{
    DrawBackend, RendererAdapter, SessionId, SharedSurfaceCache, SurfaceCache,
};

use crate::error::ShellError;
use crate::options::ShellOptions;
use crate::registry::ModuleRegistry;
use crate::session::Session;

/// Opens sessions from a [`ModuleRegistry`].
///
/// All sessions of one module share a surface cache, so every backend
/// passed to [`Shell::open_session`] must produce surfaces of type `S` that
/// the others can draw.
pub struct Shell<S> {
    registry: ModuleRegistry,
    options: ShellOptions,
    caches: HashMap<String, SharedSurfaceCache<S>>,
    next_session: SessionId,
}

impl<S: Clone> Shell<S> {
    pub fn new(registry: ModuleRegistry, options: ShellOptions) -> Self {
        Self {
            registry,
            options,
            caches: HashMap::new(),
            next_session: 1,
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    /// The surface cache shared by sessions of `module_id`, once one was opened.
    pub fn cache(&self, module_id: &str) -> Option<&SharedSurfaceCache<S>> {
        self.caches.get(module_id)
    }

    /// Creates an unmounted session running a fresh instance of `module_id`.
    pub fn open_session<B>(&mut self, module_id: &str, backend: B) -> Result<Session<B>, ShellError>
    where
        B: DrawBackend<Surface = S>,
    {
        let descriptor = self.registry.resolve(module_id)?;
        let module = descriptor.instantiate();
        let cache_config = self.options.cache;
        let cache = self
            .caches
            .entry(descriptor.id.clone())
            .or_insert_with(|| SurfaceCache::shared(cache_config))
            .clone();
        let id = self.next_session;
        self.next_session += 1;
        log::info!("opening session {id} for `{}` ({})", descriptor.name, descriptor.difficulty);
        let adapter = RendererAdapter::new(backend, cache, id, self.options.adapter);
        Ok(Session::new(
            descriptor.id.clone(),
            module,
            adapter,
            self.options.clone(),
        ))
    }
}
