//! Fingerprint-keyed cache of rendered surfaces.
//!
//! The cache stores backend handles only and never talks to the backend
//! itself: handles that fall out of the cache are handed back to the caller
//! for release. Entries remember which sessions use them so that unmounting
//! one session never releases a surface another session still shows.
//!
//! Rendering is single-flight per fingerprint. [`SurfaceCache::begin`] hands
//! out at most one [`RenderTicket`] per fingerprint until it is finished or
//! abandoned; other requests for the same content see [`Begin::InFlight`].

use std::cell::RefCell;
use std::rc::Rc;

use lru::LruCache;
use mindframe_core::collections::map::HashMap;
use mindframe_core::Fingerprint;
use smallvec::{smallvec, SmallVec};

pub type SessionId = u64;

/// A session id plus the generation it was registered under. Unmounting a
/// session bumps its generation, which turns outstanding tokens stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionToken {
    pub id: SessionId,
    pub generation: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of stored surfaces; enforced on every insert.
    pub capacity: usize,
    /// Entries unused for longer than this are dropped by the idle sweep.
    pub max_idle_ticks: u64,
    /// Ticks between two idle sweeps.
    pub eviction_interval: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            max_idle_ticks: 600,
            eviction_interval: 60,
        }
    }
}

impl CacheConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_max_idle_ticks(mut self, ticks: u64) -> Self {
        self.max_idle_ticks = ticks;
        self
    }

    pub fn with_eviction_interval(mut self, ticks: u64) -> Self {
        self.eviction_interval = ticks;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Requests that found the same fingerprint already being rendered.
    pub joined: u64,
    pub evictions: u64,
    pub stale_completions: u64,
    pub abandoned: u64,
}

#[derive(Debug)]
struct CacheEntry<H> {
    surface: H,
    last_used_tick: u64,
    owners: SmallVec<[SessionId; 2]>,
}

#[derive(Debug)]
struct Flight {
    token: SessionToken,
    waiting: SmallVec<[SessionId; 2]>,
}

/// Permission to render one fingerprint. Must be passed back to
/// [`SurfaceCache::finish`] or [`SurfaceCache::abandon`].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct RenderTicket {
    fingerprint: Fingerprint,
    token: SessionToken,
}

impl RenderTicket {
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Begin<H> {
    Hit(H),
    InFlight,
    Miss(RenderTicket),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Finish<H> {
    Stored(H),
    /// The requesting session was unmounted meanwhile; the caller releases the handle.
    Stale(H),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Acquired<H> {
    Cached(H),
    Fresh(H),
    Pending,
    /// Rendered for a session that is no longer mounted; not stored.
    Unowned(H),
}

pub struct SurfaceCache<H> {
    config: CacheConfig,
    entries: LruCache<Fingerprint, CacheEntry<H>>,
    in_flight: HashMap<Fingerprint, Flight>,
    generations: HashMap<SessionId, u64>,
    evicted: Vec<H>,
    last_sweep: u64,
    stats: CacheStats,
}

pub type SharedSurfaceCache<H> = Rc<RefCell<SurfaceCache<H>>>;

impl<H: Clone> SurfaceCache<H> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: LruCache::unbounded(),
            in_flight: HashMap::new(),
            generations: HashMap::new(),
            evicted: Vec::new(),
            last_sweep: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn shared(config: CacheConfig) -> SharedSurfaceCache<H> {
        Rc::new(RefCell::new(Self::new(config)))
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.entries.contains(&fingerprint)
    }

    pub fn is_in_flight(&self, fingerprint: Fingerprint) -> bool {
        self.in_flight.contains_key(&fingerprint)
    }

    /// Tick at which `fingerprint` was last handed out, without touching recency.
    pub fn last_used(&self, fingerprint: Fingerprint) -> Option<u64> {
        self.entries
            .peek(&fingerprint)
            .map(|entry| entry.last_used_tick)
    }

    /// Sessions currently holding `fingerprint`.
    pub fn owners(&self, fingerprint: Fingerprint) -> &[SessionId] {
        self.entries
            .peek(&fingerprint)
            .map(|entry| entry.owners.as_slice())
            .unwrap_or(&[])
    }

    pub fn register_session(&mut self, id: SessionId) -> SessionToken {
        let generation = *self.generations.entry(id).or_insert(0);
        SessionToken { id, generation }
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.generations.get(&token.id) == Some(&token.generation)
    }

    /// Looks up `fingerprint`, or hands out the right to render it.
    pub fn begin(&mut self, fingerprint: Fingerprint, token: SessionToken, tick: u64) -> Begin<H> {
        if let Some(entry) = self.entries.get_mut(&fingerprint) {
            entry.last_used_tick = tick;
            if !entry.owners.contains(&token.id) {
                entry.owners.push(token.id);
            }
            self.stats.hits += 1;
            return Begin::Hit(entry.surface.clone());
        }
        if let Some(flight) = self.in_flight.get_mut(&fingerprint) {
            if !flight.waiting.contains(&token.id) {
                flight.waiting.push(token.id);
            }
            self.stats.joined += 1;
            return Begin::InFlight;
        }
        self.stats.misses += 1;
        self.in_flight.insert(
            fingerprint,
            Flight {
                token,
                waiting: smallvec![token.id],
            },
        );
        Begin::Miss(RenderTicket { fingerprint, token })
    }

    /// Stores a finished render, unless its session went away meanwhile.
    pub fn finish(&mut self, ticket: RenderTicket, surface: H, tick: u64) -> Finish<H> {
        let RenderTicket { fingerprint, token } = ticket;
        let owners = match self.in_flight.remove(&fingerprint) {
            Some(flight) if flight.token == token && self.is_current(token) => flight.waiting,
            Some(flight) => {
                if flight.token != token {
                    // Belongs to a newer request for the same content.
                    self.in_flight.insert(fingerprint, flight);
                }
                self.stats.stale_completions += 1;
                return Finish::Stale(surface);
            }
            None => {
                self.stats.stale_completions += 1;
                return Finish::Stale(surface);
            }
        };
        self.entries.put(
            fingerprint,
            CacheEntry {
                surface: surface.clone(),
                last_used_tick: tick,
                owners,
            },
        );
        self.enforce_capacity();
        Finish::Stored(surface)
    }

    /// Gives up a ticket after a failed render so the fingerprint can be retried.
    pub fn abandon(&mut self, ticket: RenderTicket) {
        if let Some(flight) = self.in_flight.get(&ticket.fingerprint) {
            if flight.token == ticket.token {
                self.in_flight.remove(&ticket.fingerprint);
                self.stats.abandoned += 1;
            }
        }
    }

    /// One-shot lookup-or-render for synchronous backends.
    pub fn acquire<E>(
        &mut self,
        fingerprint: Fingerprint,
        token: SessionToken,
        tick: u64,
        render: impl FnOnce() -> Result<H, E>,
    ) -> Result<Acquired<H>, E> {
        match self.begin(fingerprint, token, tick) {
            Begin::Hit(surface) => Ok(Acquired::Cached(surface)),
            Begin::InFlight => Ok(Acquired::Pending),
            Begin::Miss(ticket) => match render() {
                Ok(surface) => Ok(match self.finish(ticket, surface, tick) {
                    Finish::Stored(surface) => Acquired::Fresh(surface),
                    Finish::Stale(surface) => Acquired::Unowned(surface),
                }),
                Err(err) => {
                    self.abandon(ticket);
                    Err(err)
                }
            },
        }
    }

    /// Handles pushed out by capacity pressure since the last call.
    pub fn take_evicted(&mut self) -> Vec<H> {
        std::mem::take(&mut self.evicted)
    }

    /// Idle sweep; only does work every `eviction_interval` ticks.
    pub fn maybe_evict(&mut self, tick: u64) -> Vec<H> {
        if tick.saturating_sub(self.last_sweep) < self.config.eviction_interval.max(1) {
            return Vec::new();
        }
        self.last_sweep = tick;
        let max_idle = self.config.max_idle_ticks;
        let idle: Vec<Fingerprint> = self
            .entries
            .iter()
            .filter(|(_, entry)| tick.saturating_sub(entry.last_used_tick) > max_idle)
            .map(|(fingerprint, _)| *fingerprint)
            .collect();
        let released: Vec<H> = idle
            .into_iter()
            .filter_map(|fingerprint| self.entries.pop(&fingerprint))
            .map(|entry| entry.surface)
            .collect();
        if !released.is_empty() {
            log::debug!(
                "surface cache: evicted {} idle surfaces at tick {tick}",
                released.len()
            );
        }
        self.stats.evictions += released.len() as u64;
        released
    }

    /// Drops `session`'s claims, cancels its in-flight renders and returns the
    /// handles no other session holds.
    pub fn unmount(&mut self, session: SessionId) -> Vec<H> {
        if let Some(generation) = self.generations.get_mut(&session) {
            *generation += 1;
        }
        self.in_flight.retain(|_, flight| {
            flight.waiting.retain(|id| *id != session);
            flight.token.id != session
        });

        let mut orphaned = Vec::new();
        for (fingerprint, entry) in self.entries.iter_mut() {
            entry.owners.retain(|id| *id != session);
            if entry.owners.is_empty() {
                orphaned.push(*fingerprint);
            }
        }
        orphaned
            .into_iter()
            .filter_map(|fingerprint| self.entries.pop(&fingerprint))
            .map(|entry| entry.surface)
            .collect()
    }

    fn enforce_capacity(&mut self) {
        let capacity = self.config.capacity.max(1);
        while self.entries.len() > capacity {
            let Some((fingerprint, entry)) = self.entries.pop_lru() else {
                break;
            };
            log::trace!("surface cache: evicting {fingerprint} (last used {})", entry.last_used_tick);
            self.stats.evictions += 1;
            self.evicted.push(entry.surface);
        }
    }
}

impl<H> std::fmt::Debug for SurfaceCache<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceCache")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .field("in_flight", &self.in_flight.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/surface_cache_tests.rs"]
mod tests;
