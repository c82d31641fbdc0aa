//! Immutable description of UI elements.
//!
//! A [`Node`] is built once per tick by module code and never mutated; a new
//! node replaces the old one. Nodes are reference counted so that a memoized
//! subtree can be handed back to the differ as the very same object.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;
use mindframe_ui_graphics::{Point, Rect, Size};

use crate::collections::map::HashSet;
use crate::error::StructuralError;
use crate::hash::{default as default_hasher, Fingerprint};
use crate::value::Value;

pub type Tag = Cow<'static, str>;
pub type PropName = Cow<'static, str>;

/// Property bag. Kept sorted by name so hashing is insertion-order independent.
pub type Props = IndexMap<PropName, Value>;

/// Stable sibling identity supplied by module code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Int(value) => write!(f, "{value}"),
            NodeKey::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for NodeKey {
    fn from(value: i64) -> Self {
        NodeKey::Int(value)
    }
}

impl From<i32> for NodeKey {
    fn from(value: i32) -> Self {
        NodeKey::Int(value as i64)
    }
}

impl From<u32> for NodeKey {
    fn from(value: u32) -> Self {
        NodeKey::Int(value as i64)
    }
}

impl From<usize> for NodeKey {
    fn from(value: usize) -> Self {
        NodeKey::Int(value as i64)
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        NodeKey::Text(value.to_owned())
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        NodeKey::Text(value)
    }
}

/// How a patch names an existing sibling: its key, or for unkeyed children
/// the ordinal among the unkeyed siblings of the same parent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    Key(NodeKey),
    Index(usize),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Key(key) => write!(f, "#{key}"),
            Identity::Index(index) => write!(f, "@{index}"),
        }
    }
}

/// Identity path from the virtual top-level list down to a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<Identity>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, identity: Identity) {
        self.0.push(identity);
    }

    pub fn pop(&mut self) -> Option<Identity> {
        self.0.pop()
    }

    pub fn segments(&self) -> &[Identity] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<Identity> for NodePath {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

struct NodeInner {
    tag: Tag,
    key: Option<NodeKey>,
    props: Props,
    children: Vec<Node>,
    fingerprint: Fingerprint,
    subtree_fingerprint: Fingerprint,
}

#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

impl Node {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(tag: impl Into<Tag>) -> NodeBuilder {
        NodeBuilder {
            tag: tag.into(),
            key: None,
            props: Props::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    pub fn key(&self) -> Option<&NodeKey> {
        self.inner.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.inner.props
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.inner.props.get(name)
    }

    pub fn children(&self) -> &[Node] {
        &self.inner.children
    }

    pub fn is_leaf(&self) -> bool {
        self.inner.children.is_empty()
    }

    /// Content fingerprint over `(tag, props, size)`; children do not participate.
    pub fn fingerprint(&self) -> Fingerprint {
        self.inner.fingerprint
    }

    /// Fingerprint of the whole subtree, including keys and children.
    pub fn subtree_fingerprint(&self) -> Fingerprint {
        self.inner.subtree_fingerprint
    }

    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Equality over the whole subtree, children included.
    pub fn deep_eq(&self, other: &Node) -> bool {
        Node::ptr_eq(self, other)
            || (self.inner.subtree_fingerprint == other.inner.subtree_fingerprint
                && self == other
                && self.children().len() == other.children().len()
                && self
                    .children()
                    .iter()
                    .zip(other.children())
                    .all(|(a, b)| a.deep_eq(b)))
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Node::count).sum::<usize>()
    }

    /// Declared size from the `width`/`height` props; missing dimensions are zero.
    pub fn size(&self) -> Size {
        props_size(&self.inner.props)
    }

    /// Whether the node declares an explicit size.
    pub fn has_extent(&self) -> bool {
        self.prop("width").is_some() || self.prop("height").is_some()
    }

    /// Frame in absolute coordinates, given the parent's origin.
    pub fn frame(&self, parent_origin: Point) -> Rect {
        props_frame(&self.inner.props, parent_origin)
    }

    /// Fails on the first duplicated sibling key anywhere in the subtree.
    pub fn validate(&self) -> Result<(), StructuralError> {
        let mut path = NodePath::root();
        validate_list(std::slice::from_ref(self), &mut path)
    }
}

pub(crate) fn validate_list(nodes: &[Node], path: &mut NodePath) -> Result<(), StructuralError> {
    let identities = sibling_identities(nodes, path)?;
    for (node, identity) in nodes.iter().zip(identities) {
        path.push(identity);
        validate_list(node.children(), path)?;
        path.pop();
    }
    Ok(())
}

/// Identities of a sibling list; duplicate keys fail with the parent's path.
pub(crate) fn sibling_identities(
    nodes: &[Node],
    parent: &NodePath,
) -> Result<Vec<Identity>, StructuralError> {
    let mut seen: HashSet<&NodeKey> = HashSet::new();
    let mut unkeyed = 0usize;
    let mut identities = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node.key() {
            Some(key) => {
                if !seen.insert(key) {
                    return Err(StructuralError::DuplicateKey {
                        key: key.clone(),
                        path: parent.clone(),
                    });
                }
                identities.push(Identity::Key(key.clone()));
            }
            None => {
                identities.push(Identity::Index(unkeyed));
                unkeyed += 1;
            }
        }
    }
    Ok(identities)
}

pub fn props_size(props: &Props) -> Size {
    let dimension = |name: &str| props.get(name).and_then(Value::as_f32).unwrap_or(0.0);
    Size::new(dimension("width"), dimension("height"))
}

pub fn props_frame(props: &Props, parent_origin: Point) -> Rect {
    let offset = |name: &str| props.get(name).and_then(Value::as_f32).unwrap_or(0.0);
    Rect::from_origin_size(
        parent_origin.offset(offset("x"), offset("y")),
        props_size(props),
    )
}

/// Content fingerprint shared by nodes and the renderer's retained mirror.
pub fn content_fingerprint(tag: &str, props: &Props) -> Fingerprint {
    let mut hasher = default_hasher::new();
    tag.hash(&mut hasher);
    props.len().hash(&mut hasher);
    for (name, value) in props {
        name.hash(&mut hasher);
        value.hash(&mut hasher);
    }
    let size = props_size(props);
    size.width.to_bits().hash(&mut hasher);
    size.height.to_bits().hash(&mut hasher);
    Fingerprint::from_raw(hasher.finish())
}

/// Structural equality over `(tag, key, props)`; children do not participate.
/// Use [`Node::deep_eq`] to compare whole subtrees.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Node::ptr_eq(self, other)
            || (self.inner.fingerprint == other.inner.fingerprint
                && self.inner.tag == other.inner.tag
                && self.inner.key == other.inner.key
                && self.inner.props == other.inner.props)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Node");
        debug.field("tag", &self.inner.tag);
        if let Some(key) = &self.inner.key {
            debug.field("key", key);
        }
        if !self.inner.props.is_empty() {
            debug.field("props", &self.inner.props);
        }
        if !self.inner.children.is_empty() {
            debug.field("children", &self.inner.children);
        }
        debug.finish()
    }
}

pub struct NodeBuilder {
    tag: Tag,
    key: Option<NodeKey>,
    props: Props,
    children: Vec<Node>,
}

impl NodeBuilder {
    pub fn key(mut self, key: impl Into<NodeKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn prop(mut self, name: impl Into<PropName>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn build(self) -> Node {
        let NodeBuilder {
            tag,
            key,
            mut props,
            children,
        } = self;
        props.sort_keys();
        let fingerprint = content_fingerprint(&tag, &props);
        let mut hasher = default_hasher::new();
        fingerprint.hash(&mut hasher);
        key.hash(&mut hasher);
        children.len().hash(&mut hasher);
        for child in &children {
            child.subtree_fingerprint().hash(&mut hasher);
        }
        let subtree_fingerprint = Fingerprint::from_raw(hasher.finish());
        Node {
            inner: Rc::new(NodeInner {
                tag,
                key,
                props,
                children,
                fingerprint,
                subtree_fingerprint,
            }),
        }
    }
}

impl From<NodeBuilder> for Node {
    fn from(builder: NodeBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod tests;
