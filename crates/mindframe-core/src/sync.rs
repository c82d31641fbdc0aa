//! Versioned state stream built on shallow deltas.
//!
//! The encoder side turns a sequence of observed snapshots into full or
//! delta updates; the decoder side replays them. Ticks without any change
//! produce no update at all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{StateDelta, StateSnapshot};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncUpdate {
    Full {
        version: u64,
        snapshot: StateSnapshot,
    },
    Delta {
        version: u64,
        base_version: u64,
        delta: StateDelta,
    },
}

impl SyncUpdate {
    pub fn version(&self) -> u64 {
        match self {
            SyncUpdate::Full { version, .. } | SyncUpdate::Delta { version, .. } => *version,
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, SyncUpdate::Delta { .. })
    }
}

/// What to do when a computed delta fails to reproduce its target snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MismatchPolicy {
    Panic,
    ResendFull,
}

impl Default for MismatchPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            MismatchPolicy::Panic
        } else {
            MismatchPolicy::ResendFull
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Every n-th emitted update is a full snapshot; `0` disables periodic resends.
    pub full_resend_interval: u64,
    pub mismatch_policy: MismatchPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            full_resend_interval: 20,
            mismatch_policy: MismatchPolicy::default(),
        }
    }
}

impl SyncConfig {
    pub fn with_full_resend_interval(mut self, interval: u64) -> Self {
        self.full_resend_interval = interval;
        self
    }

    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub full_updates: u64,
    pub delta_updates: u64,
    pub unchanged: u64,
    /// Full updates sent because a delta failed verification.
    pub forced_full: u64,
}

impl SyncStats {
    pub fn total_updates(&self) -> u64 {
        self.full_updates + self.delta_updates
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("delta based on version {found} cannot apply to version {expected}")]
    BaseVersionMismatch { expected: u64, found: u64 },
}

pub struct StateEncoder {
    config: SyncConfig,
    baseline: Option<StateSnapshot>,
    version: u64,
    emitted: u64,
    stats: SyncStats,
    #[cfg(test)]
    tamper: Option<fn(&mut StateDelta)>,
}

impl StateEncoder {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            baseline: None,
            version: 0,
            emitted: 0,
            stats: SyncStats::default(),
            #[cfg(test)]
            tamper: None,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Last snapshot the receiving side is known to hold.
    pub fn baseline(&self) -> Option<&StateSnapshot> {
        self.baseline.as_ref()
    }

    /// Makes the next observation a full snapshot, e.g. after a reconnect.
    pub fn force_full(&mut self) {
        self.baseline = None;
    }

    /// Encodes `next` against the baseline; `None` when nothing changed.
    pub fn observe(&mut self, next: &StateSnapshot) -> Option<SyncUpdate> {
        let Some(baseline) = self.baseline.as_ref() else {
            return Some(self.emit_full(next));
        };
        #[allow(unused_mut)]
        let mut delta = StateDelta::between(baseline, next);
        #[cfg(test)]
        if let Some(tamper) = self.tamper {
            tamper(&mut delta);
        }
        if delta.is_empty() {
            self.stats.unchanged += 1;
            return None;
        }

        let interval = self.config.full_resend_interval;
        if interval > 0 && (self.emitted + 1) % interval == 0 {
            return Some(self.emit_full(next));
        }
        if delta.len() >= next.len().max(1) {
            return Some(self.emit_full(next));
        }
        if delta.apply_to(baseline) != *next {
            match self.config.mismatch_policy {
                MismatchPolicy::Panic => panic!(
                    "state delta at version {} does not reproduce the observed snapshot",
                    self.version
                ),
                MismatchPolicy::ResendFull => {
                    log::error!(
                        "state delta at version {} failed verification; resending full snapshot",
                        self.version
                    );
                    self.stats.forced_full += 1;
                    return Some(self.emit_full(next));
                }
            }
        }

        let base_version = self.version;
        self.version += 1;
        self.emitted += 1;
        self.stats.delta_updates += 1;
        self.baseline = Some(next.clone());
        Some(SyncUpdate::Delta {
            version: self.version,
            base_version,
            delta,
        })
    }

    fn emit_full(&mut self, next: &StateSnapshot) -> SyncUpdate {
        self.version += 1;
        self.emitted += 1;
        self.stats.full_updates += 1;
        self.baseline = Some(next.clone());
        SyncUpdate::Full {
            version: self.version,
            snapshot: next.clone(),
        }
    }
}

impl Default for StateEncoder {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl std::fmt::Debug for StateEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateEncoder")
            .field("config", &self.config)
            .field("version", &self.version)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Receiving side of a [`SyncUpdate`] stream.
#[derive(Clone, Debug, Default)]
pub struct StateDecoder {
    snapshot: StateSnapshot,
    version: u64,
}

impl StateDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> &StateSnapshot {
        &self.snapshot
    }

    pub fn apply(&mut self, update: &SyncUpdate) -> Result<&StateSnapshot, SyncError> {
        match update {
            SyncUpdate::Full { version, snapshot } => {
                self.snapshot = snapshot.clone();
                self.version = *version;
            }
            SyncUpdate::Delta {
                version,
                base_version,
                delta,
            } => {
                if *base_version != self.version {
                    return Err(SyncError::BaseVersionMismatch {
                        expected: self.version,
                        found: *base_version,
                    });
                }
                delta.apply_in_place(&mut self.snapshot);
                self.version = *version;
            }
        }
        Ok(&self.snapshot)
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
