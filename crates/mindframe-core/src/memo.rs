//! Subtree memoization.
//!
//! A memo slot is addressed by a site key and remembers the inputs it was
//! built from. While the inputs compare equal the slot hands back the very
//! same [`Node`], so the differ skips it by pointer identity. Inputs that are
//! read by the builder but not passed as `deps` produce stale subtrees.

use std::any::Any;
use std::hash::Hash;

use crate::collections::map::HashMap;
use crate::hash::hash_one;
use crate::node::Node;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoConfig {
    /// Ticks an unused slot survives before `end_tick` drops it.
    pub retain_ticks: u64,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self { retain_ticks: 60 }
    }
}

impl MemoConfig {
    pub fn with_retain_ticks(mut self, ticks: u64) -> Self {
        self.retain_ticks = ticks;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
    pub dropped: u64,
}

struct MemoSlot {
    deps: Box<dyn Any>,
    node: Node,
    last_used: u64,
}

#[derive(Default)]
pub struct Memoizer {
    slots: HashMap<u64, MemoSlot>,
    tick: u64,
    config: MemoConfig,
    stats: MemoStats,
}

impl Memoizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemoConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> MemoStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn begin_tick(&mut self) {
        self.tick += 1;
    }

    /// Drops slots that were not used within the retention window.
    pub fn end_tick(&mut self) {
        let tick = self.tick;
        let retain = self.config.retain_ticks;
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| tick.saturating_sub(slot.last_used) <= retain);
        let dropped = before - self.slots.len();
        if dropped > 0 {
            log::trace!("memo: dropped {dropped} idle slots at tick {tick}");
        }
        self.stats.dropped += dropped as u64;
    }

    /// Returns the subtree cached for `site` if `deps` is unchanged, otherwise
    /// builds, stores and returns a new one.
    pub fn memo<K, D>(&mut self, site: K, deps: D, build: impl FnOnce(&D) -> Node) -> Node
    where
        K: Hash,
        D: PartialEq + 'static,
    {
        self.memo_with(site, deps, |_, deps| build(deps))
    }

    /// Like [`Memoizer::memo`], but the builder may memoize nested subtrees.
    pub fn memo_with<K, D>(
        &mut self,
        site: K,
        deps: D,
        build: impl FnOnce(&mut Memoizer, &D) -> Node,
    ) -> Node
    where
        K: Hash,
        D: PartialEq + 'static,
    {
        let key = hash_one(&site);
        let tick = self.tick;
        if let Some(slot) = self.slots.get_mut(&key) {
            if slot.deps.downcast_ref::<D>() == Some(&deps) {
                slot.last_used = tick;
                self.stats.hits += 1;
                return slot.node.clone();
            }
        }
        self.stats.misses += 1;
        let node = build(self, &deps);
        self.slots.insert(
            key,
            MemoSlot {
                deps: Box::new(deps),
                node: node.clone(),
                last_used: tick,
            },
        );
        node
    }
}

impl std::fmt::Debug for Memoizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoizer")
            .field("slots", &self.slots.len())
            .field("tick", &self.tick)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/memo_tests.rs"]
mod tests;
