//! Applying patch lists to a retained mirror of the tree.
//!
//! Within one sibling level: removals come first, then every node named by a
//! `Move` is detached, then inserts and movers are placed at their final
//! positions in ascending order. Siblings without a patch keep their relative
//! order, which is what makes the differ's longest-increasing-subsequence
//! move set sufficient. Unkeyed identities are renumbered once placement is
//! done, before any update patch of the level is resolved.

use thiserror::Error;

use crate::diff::{Patch, PropChanges};
use crate::node::{Identity, Node, NodeKey, NodePath, Props, Tag};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("no node with identity {identity} under {path}")]
    UnknownTarget { identity: Identity, path: NodePath },
    #[error("position {position} is out of bounds under {path} (len {len})")]
    PositionOutOfBounds {
        position: usize,
        len: usize,
        path: NodePath,
    },
}

/// A mutable node mirror that patches can be applied to.
pub trait PatchTarget: Sized {
    type Context;

    fn identity(&self) -> &Identity;
    fn assign_identity(&mut self, identity: Identity);
    fn key(&self) -> Option<&NodeKey>;
    fn children_mut(&mut self) -> &mut Vec<Self>;

    /// Builds the mirror of a freshly inserted subtree.
    fn mount(node: &Node, cx: &mut Self::Context) -> Self;
    /// Called with a removed subtree.
    fn unmount(self, cx: &mut Self::Context);
    fn moved(&mut self, cx: &mut Self::Context);
    fn update_props(&mut self, changes: &PropChanges, cx: &mut Self::Context);
    fn children_updated(&mut self, _cx: &mut Self::Context) {}
}

/// Renumbers a sibling list: keyed members by key, the rest by unkeyed ordinal.
pub fn assign_identities<T: PatchTarget>(list: &mut [T]) {
    let mut unkeyed = 0;
    for item in list {
        let identity = match item.key() {
            Some(key) => Identity::Key(key.clone()),
            None => {
                unkeyed += 1;
                Identity::Index(unkeyed - 1)
            }
        };
        item.assign_identity(identity);
    }
}

/// Applies a top-level patch list to `roots` (the virtual list holding the root).
pub fn apply_patches<T: PatchTarget>(
    roots: &mut Vec<T>,
    patches: &[Patch],
    cx: &mut T::Context,
) -> Result<(), PatchError> {
    let mut path = NodePath::root();
    apply_level(roots, patches, cx, &mut path)
}

fn apply_level<T: PatchTarget>(
    list: &mut Vec<T>,
    patches: &[Patch],
    cx: &mut T::Context,
    path: &mut NodePath,
) -> Result<(), PatchError> {
    let mut movers: Option<Vec<T>> = None;
    let mut renumber = false;
    for patch in patches {
        match patch {
            Patch::Remove { identity } => {
                let index = index_of(list, identity, path)?;
                list.remove(index).unmount(cx);
            }
            Patch::Insert { node, position } => {
                if movers.is_none() {
                    movers = Some(detach_movers(list, patches, path)?);
                }
                place(list, *position, T::mount(node, cx), path)?;
                renumber = true;
            }
            Patch::Move { identity, position } => {
                if movers.is_none() {
                    movers = Some(detach_movers(list, patches, path)?);
                }
                let detached = movers.get_or_insert_with(Vec::new);
                let slot = detached
                    .iter()
                    .position(|item| item.identity() == identity)
                    .ok_or_else(|| PatchError::UnknownTarget {
                        identity: identity.clone(),
                        path: path.clone(),
                    })?;
                let mut item = detached.swap_remove(slot);
                item.moved(cx);
                place(list, *position, item, path)?;
                renumber = true;
            }
            Patch::UpdateProps { identity, changes } => {
                if std::mem::take(&mut renumber) {
                    assign_identities(list);
                }
                let index = index_of(list, identity, path)?;
                list[index].update_props(changes, cx);
            }
            Patch::UpdateChildren {
                identity,
                patches: child_patches,
            } => {
                if std::mem::take(&mut renumber) {
                    assign_identities(list);
                }
                let index = index_of(list, identity, path)?;
                path.push(identity.clone());
                let result = apply_level(list[index].children_mut(), child_patches, cx, path);
                path.pop();
                result?;
                list[index].children_updated(cx);
            }
        }
    }
    if renumber {
        assign_identities(list);
    }
    Ok(())
}

fn detach_movers<T: PatchTarget>(
    list: &mut Vec<T>,
    patches: &[Patch],
    path: &NodePath,
) -> Result<Vec<T>, PatchError> {
    let mut detached = Vec::new();
    for patch in patches {
        if let Patch::Move { identity, .. } = patch {
            let index = index_of(list, identity, path)?;
            detached.push(list.remove(index));
        }
    }
    Ok(detached)
}

fn index_of<T: PatchTarget>(
    list: &[T],
    identity: &Identity,
    path: &NodePath,
) -> Result<usize, PatchError> {
    list.iter()
        .position(|item| item.identity() == identity)
        .ok_or_else(|| PatchError::UnknownTarget {
            identity: identity.clone(),
            path: path.clone(),
        })
}

fn place<T>(list: &mut Vec<T>, position: usize, item: T, path: &NodePath) -> Result<(), PatchError> {
    if position > list.len() {
        return Err(PatchError::PositionOutOfBounds {
            position,
            len: list.len(),
            path: path.clone(),
        });
    }
    list.insert(position, item);
    Ok(())
}

/// Plain mirror of a node tree, useful for checking that a patch list turns
/// the previous tree into the next one.
#[derive(Clone, Debug)]
pub struct MirrorNode {
    identity: Identity,
    tag: Tag,
    key: Option<NodeKey>,
    props: Props,
    children: Vec<MirrorNode>,
}

impl MirrorNode {
    /// Mirrors an optional root as a top-level list.
    pub fn list_from(root: Option<&Node>) -> Vec<MirrorNode> {
        let mut cx = ();
        let mut list: Vec<MirrorNode> = root
            .map(|node| MirrorNode::mount(node, &mut cx))
            .into_iter()
            .collect();
        assign_identities(&mut list);
        list
    }

    /// Rebuilds an immutable node from the mirror.
    pub fn to_node(&self) -> Node {
        let mut builder = Node::new(self.tag.clone());
        if let Some(key) = &self.key {
            builder = builder.key(key.clone());
        }
        for (name, value) in &self.props {
            builder = builder.prop(name.clone(), value.clone());
        }
        builder
            .children(self.children.iter().map(MirrorNode::to_node))
            .build()
    }
}

impl PatchTarget for MirrorNode {
    type Context = ();

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn assign_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    fn key(&self) -> Option<&NodeKey> {
        self.key.as_ref()
    }

    fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }

    fn mount(node: &Node, cx: &mut ()) -> Self {
        let mut children: Vec<MirrorNode> = node
            .children()
            .iter()
            .map(|child| MirrorNode::mount(child, cx))
            .collect();
        assign_identities(&mut children);
        MirrorNode {
            identity: Identity::Index(usize::MAX),
            tag: node.tag().to_owned().into(),
            key: node.key().cloned(),
            props: node.props().clone(),
            children,
        }
    }

    fn unmount(self, _cx: &mut ()) {}

    fn moved(&mut self, _cx: &mut ()) {}

    fn update_props(&mut self, changes: &PropChanges, _cx: &mut ()) {
        changes.apply_to(&mut self.props);
    }
}

#[cfg(test)]
#[path = "tests/patch_tests.rs"]
mod tests;
