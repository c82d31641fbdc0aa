//! The renderer's mirror of the last applied tree.
//!
//! Patch callbacks only flag nodes; layout and damage collection happen in a
//! single walk once the whole patch list has been applied. A `dirty` node is
//! laid out again together with its subtree and damages both its old and new
//! bounds. `descendant_dirty` only means "look further down".

use mindframe_core::collections::map::HashSet;
use mindframe_core::node::{content_fingerprint, props_frame, props_size};
use mindframe_core::{
    assign_identities, Fingerprint, Identity, Node, NodeKey, PatchTarget, PropChanges, Props, Tag,
    Value,
};
use mindframe_ui_graphics::{Color, Point, Rect};

use crate::backend::{SurfaceRequest, DEFAULT_FONT_SIZE};

/// Collects what removed subtrees leave behind while patches are applied.
#[derive(Debug, Default)]
pub struct RetainedContext {
    pub(crate) removed: Vec<Rect>,
}

#[derive(Clone, Debug)]
pub struct RetainedNode {
    identity: Identity,
    tag: Tag,
    key: Option<NodeKey>,
    props: Props,
    fingerprint: Fingerprint,
    children: Vec<RetainedNode>,
    frame: Rect,
    bounds: Option<Rect>,
    dirty: bool,
    descendant_dirty: bool,
}

impl RetainedNode {
    fn from_node(node: &Node) -> Self {
        let mut children: Vec<RetainedNode> =
            node.children().iter().map(RetainedNode::from_node).collect();
        assign_identities(&mut children);
        RetainedNode {
            identity: Identity::Index(usize::MAX),
            tag: node.tag().to_owned().into(),
            key: node.key().cloned(),
            props: node.props().clone(),
            fingerprint: node.fingerprint(),
            children,
            frame: Rect::default(),
            bounds: None,
            dirty: false,
            descendant_dirty: false,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &[RetainedNode] {
        &self.children
    }

    /// Content fingerprint, identical to [`Node::fingerprint`] for the same content.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Absolute frame as of the last paint.
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Union of every non-empty frame in the subtree as of the last paint.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Leaves with a non-empty declared size are drawn from cached surfaces.
    pub fn is_renderable(&self) -> bool {
        self.children.is_empty() && !props_size(&self.props).is_empty()
    }

    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RetainedNode::count).sum::<usize>()
    }

    /// Rebuilds the immutable node this mirror currently represents.
    pub fn to_node(&self) -> Node {
        let mut builder = Node::new(self.tag.clone());
        if let Some(key) = &self.key {
            builder = builder.key(key.clone());
        }
        for (name, value) in &self.props {
            builder = builder.prop(name.clone(), value.clone());
        }
        builder
            .children(self.children.iter().map(RetainedNode::to_node))
            .build()
    }

    pub(crate) fn surface_request(&self) -> SurfaceRequest {
        SurfaceRequest {
            fingerprint: self.fingerprint,
            tag: self.tag.to_string(),
            props: self.props.clone(),
            size: props_size(&self.props),
        }
    }

    pub(crate) fn background(&self) -> Option<Color> {
        self.props.get("background").and_then(Value::as_color)
    }

    /// Caption drawn at the top-left corner of a container.
    pub(crate) fn label(&self) -> Option<(&str, Color, f32)> {
        let text = self.props.get("label").and_then(Value::as_str)?;
        let color = self
            .props
            .get("label_color")
            .and_then(Value::as_color)
            .unwrap_or(Color::WHITE);
        let size = self
            .props
            .get("font_size")
            .and_then(Value::as_f32)
            .unwrap_or(DEFAULT_FONT_SIZE);
        Some((text, color, size))
    }

    /// Lays out flagged subtrees and records the areas that need repainting.
    pub(crate) fn refresh(&mut self, parent_origin: Point, damage: &mut Vec<Rect>) {
        if self.dirty {
            damage.extend(self.bounds);
            self.layout(parent_origin);
            damage.extend(self.bounds);
        } else if self.descendant_dirty {
            self.descendant_dirty = false;
            let origin = self.frame.origin();
            for child in &mut self.children {
                child.refresh(origin, damage);
            }
            self.bounds = self.union_bounds();
        }
    }

    fn layout(&mut self, parent_origin: Point) {
        self.frame = props_frame(&self.props, parent_origin);
        self.dirty = false;
        self.descendant_dirty = false;
        let origin = self.frame.origin();
        for child in &mut self.children {
            child.layout(origin);
        }
        self.bounds = self.union_bounds();
    }

    fn union_bounds(&self) -> Option<Rect> {
        let own = (!self.frame.is_empty()).then_some(self.frame);
        self.children
            .iter()
            .filter_map(|child| child.bounds)
            .fold(own, |acc, bounds| {
                Some(match acc {
                    Some(acc) => acc.union(&bounds),
                    None => bounds,
                })
            })
    }

    /// Flags renderable leaves whose fingerprint is in `ready`.
    /// Fingerprints of every renderable leaf in this subtree.
    pub(crate) fn collect_leaf_fingerprints(&self, out: &mut HashSet<Fingerprint>) {
        if self.is_renderable() {
            out.insert(self.fingerprint);
            return;
        }
        for child in &self.children {
            child.collect_leaf_fingerprints(out);
        }
    }

    pub(crate) fn damage_matching(&mut self, ready: &HashSet<Fingerprint>) -> bool {
        if self.is_renderable() {
            self.dirty |= ready.contains(&self.fingerprint);
            return self.dirty;
        }
        let mut hit = false;
        for child in &mut self.children {
            hit |= child.damage_matching(ready);
        }
        self.descendant_dirty |= hit;
        hit
    }
}

impl PatchTarget for RetainedNode {
    type Context = RetainedContext;

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

    fn mount(node: &Node, _cx: &mut RetainedContext) -> Self {
        let mut retained = RetainedNode::from_node(node);
        retained.dirty = true;
        retained
    }

    fn unmount(self, cx: &mut RetainedContext) {
        cx.removed.extend(self.bounds);
    }

    fn moved(&mut self, _cx: &mut RetainedContext) {
        self.dirty = true;
    }

    fn update_props(&mut self, changes: &PropChanges, _cx: &mut RetainedContext) {
        changes.apply_to(&mut self.props);
        self.fingerprint = content_fingerprint(&self.tag, &self.props);
        self.dirty = true;
    }

    fn children_updated(&mut self, _cx: &mut RetainedContext) {
        self.descendant_dirty = true;
    }
}

#[cfg(test)]
#[path = "tests/retained_tests.rs"]
mod tests;
