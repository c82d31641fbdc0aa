//! Tree differ.
//!
//! Sibling lists are matched by key (or by unkeyed ordinal), so each level is
//! linear in its width apart from the O(n log n) move minimisation. Matched
//! pairs whose subtree fingerprints agree are skipped without recursion.
//!
//! Patches for one level are emitted as: every `Remove`, then `Insert` and
//! `Move` by ascending final position, then `UpdateProps`/`UpdateChildren` in
//! new order. See [`crate::patch`] for the matching application rules.

use crate::collections::map::HashMap;
use crate::error::StructuralError;
use crate::node::{sibling_identities, validate_list, Identity, Node, NodePath, PropName, Props};
use crate::value::Value;

/// Property-level difference between two versions of a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropChanges {
    pub set: Vec<(PropName, Value)>,
    pub removed: Vec<PropName>,
}

impl PropChanges {
    pub fn between(old: &Props, new: &Props) -> Self {
        let mut changes = PropChanges::default();
        for (name, value) in new {
            if old.get(name) != Some(value) {
                changes.set.push((name.clone(), value.clone()));
            }
        }
        for name in old.keys() {
            if !new.contains_key(name) {
                changes.removed.push(name.clone());
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.set.len() + self.removed.len()
    }

    pub fn apply_to(&self, props: &mut Props) {
        for (name, value) in &self.set {
            props.insert(name.clone(), value.clone());
        }
        for name in &self.removed {
            props.shift_remove(name);
        }
        props.sort_keys();
    }
}

/// A single tree edit, relative to one previous/new tree pair.
///
/// Positions are indices in the final sibling list.
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    Insert { node: Node, position: usize },
    Remove { identity: Identity },
    Move { identity: Identity, position: usize },
    UpdateProps { identity: Identity, changes: PropChanges },
    UpdateChildren { identity: Identity, patches: Vec<Patch> },
}

impl Patch {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Patch::Insert { .. } => None,
            Patch::Remove { identity }
            | Patch::Move { identity, .. }
            | Patch::UpdateProps { identity, .. }
            | Patch::UpdateChildren { identity, .. } => Some(identity),
        }
    }
}

/// Per-kind patch counts, including nested child patches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchSummary {
    pub inserts: usize,
    pub removes: usize,
    pub moves: usize,
    pub prop_updates: usize,
    pub child_updates: usize,
}

impl PatchSummary {
    pub fn of(patches: &[Patch]) -> Self {
        let mut summary = PatchSummary::default();
        summary.add(patches);
        summary
    }

    fn add(&mut self, patches: &[Patch]) {
        for patch in patches {
            match patch {
                Patch::Insert { .. } => self.inserts += 1,
                Patch::Remove { .. } => self.removes += 1,
                Patch::Move { .. } => self.moves += 1,
                Patch::UpdateProps { .. } => self.prop_updates += 1,
                Patch::UpdateChildren { patches, .. } => {
                    self.child_updates += 1;
                    self.add(patches);
                }
            }
        }
    }

    pub fn total(&self) -> usize {
        self.inserts + self.removes + self.moves + self.prop_updates + self.child_updates
    }
}

/// Total number of patches, counting nested child patches.
pub fn count_patches(patches: &[Patch]) -> usize {
    PatchSummary::of(patches).total()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Matched pairs examined.
    pub compared: usize,
    /// Matched pairs skipped because their subtrees were identical.
    pub short_circuited: usize,
    pub patches: usize,
}

#[derive(Debug, Default)]
pub struct Differ {
    stats: DiffStats,
}

impl Differ {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of the most recent [`Differ::diff`] call.
    pub fn stats(&self) -> DiffStats {
        self.stats
    }

    /// Diffs `previous` (absent on the first frame) against `next`.
    ///
    /// The root is treated as the only member of a virtual top-level list,
    /// so replacing the root is expressed as `Remove` + `Insert` there.
    pub fn diff(
        &mut self,
        previous: Option<&Node>,
        next: &Node,
    ) -> Result<Vec<Patch>, StructuralError> {
        self.stats = DiffStats::default();
        let old = previous.map(std::slice::from_ref).unwrap_or(&[]);
        let mut path = NodePath::root();
        let patches = self.diff_children(old, std::slice::from_ref(next), &mut path)?;
        self.stats.patches = count_patches(&patches);
        Ok(patches)
    }

    fn diff_children(
        &mut self,
        old: &[Node],
        new: &[Node],
        path: &mut NodePath,
    ) -> Result<Vec<Patch>, StructuralError> {
        let old_ids = sibling_identities(old, path)?;
        let new_ids = sibling_identities(new, path)?;

        let lookup: HashMap<&Identity, usize> = old_ids
            .iter()
            .enumerate()
            .map(|(index, identity)| (identity, index))
            .collect();

        // source[j] is the old index reused by new[j]; a tag change under the
        // same identity is a teardown, never an in-place mutation.
        let mut source: Vec<Option<usize>> = vec![None; new.len()];
        let mut kept = vec![false; old.len()];
        for (j, identity) in new_ids.iter().enumerate() {
            if let Some(&i) = lookup.get(identity) {
                if old[i].tag() == new[j].tag() {
                    source[j] = Some(i);
                    kept[i] = true;
                }
            }
        }

        let mut patches = Vec::new();
        for (i, identity) in old_ids.iter().enumerate() {
            if !kept[i] {
                patches.push(Patch::Remove {
                    identity: identity.clone(),
                });
            }
        }

        let order: Vec<usize> = source.iter().flatten().copied().collect();
        let stable = increasing_subsequence_mask(&order);
        let mut matched = 0;
        for (j, slot) in source.iter().enumerate() {
            match slot {
                None => {
                    // Inserted subtrees are never diffed, so check their keys here.
                    path.push(new_ids[j].clone());
                    let checked = validate_list(new[j].children(), path);
                    path.pop();
                    checked?;
                    patches.push(Patch::Insert {
                        node: new[j].clone(),
                        position: j,
                    });
                }
                Some(i) => {
                    if !stable[matched] {
                        patches.push(Patch::Move {
                            identity: old_ids[*i].clone(),
                            position: j,
                        });
                    }
                    matched += 1;
                }
            }
        }

        for (j, slot) in source.iter().enumerate() {
            let Some(i) = *slot else {
                continue;
            };
            let (before, after) = (&old[i], &new[j]);
            self.stats.compared += 1;
            if Node::ptr_eq(before, after)
                || before.subtree_fingerprint() == after.subtree_fingerprint()
            {
                self.stats.short_circuited += 1;
                continue;
            }
            let identity = &new_ids[j];
            let changes = PropChanges::between(before.props(), after.props());
            if !changes.is_empty() {
                patches.push(Patch::UpdateProps {
                    identity: identity.clone(),
                    changes,
                });
            }
            path.push(identity.clone());
            let child_patches = self.diff_children(before.children(), after.children(), path);
            path.pop();
            let child_patches = child_patches?;
            if !child_patches.is_empty() {
                patches.push(Patch::UpdateChildren {
                    identity: identity.clone(),
                    patches: child_patches,
                });
            }
        }

        Ok(patches)
    }
}

/// Diffs two trees with a throwaway [`Differ`].
pub fn diff(previous: Option<&Node>, next: &Node) -> Result<Vec<Patch>, StructuralError> {
    Differ::new().diff(previous, next)
}

/// Marks the members of one longest strictly increasing subsequence.
fn increasing_subsequence_mask(seq: &[usize]) -> Vec<bool> {
    let mut mask = vec![false; seq.len()];
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];
    for (k, &value) in seq.iter().enumerate() {
        let pos = tails.partition_point(|&t| seq[t] < value);
        if pos > 0 {
            prev[k] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(k);
        } else {
            tails[pos] = k;
        }
    }
    let mut cursor = tails.last().copied();
    while let Some(k) = cursor {
        mask[k] = true;
        cursor = prev[k];
    }
    mask
}

#[cfg(test)]
#[path = "tests/diff_tests.rs"]
mod tests;
