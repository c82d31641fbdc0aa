//! Position-based event routing.
//!
//! Input is routed top-down through the tree: a node with an explicit size
//! captures points inside its frame, a node without one only passes points
//! through to its children. Later siblings paint over earlier ones, so they
//! are tested first.

use mindframe_ui_graphics::{Point, Rect};

use crate::node::{Identity, Node, NodeKey, NodePath};

#[derive(Clone, Debug, PartialEq)]
pub struct RouteStep {
    pub identity: Identity,
    pub tag: String,
    /// Absolute frame of the node.
    pub frame: Rect,
}

/// Root-first chain of nodes under a point; the last step is the target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventRoute {
    steps: Vec<RouteStep>,
}

impl EventRoute {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[RouteStep] {
        &self.steps
    }

    pub fn target(&self) -> Option<&RouteStep> {
        self.steps.last()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether any node on the route carries `key`.
    pub fn passes_through(&self, key: &NodeKey) -> bool {
        self.steps
            .iter()
            .any(|step| matches!(&step.identity, Identity::Key(k) if k == key))
    }

    /// Nearest keyed node on the route, starting from the target.
    pub fn innermost_key(&self) -> Option<&NodeKey> {
        self.steps.iter().rev().find_map(|step| match &step.identity {
            Identity::Key(key) => Some(key),
            Identity::Index(_) => None,
        })
    }

    pub fn path(&self) -> NodePath {
        self.steps.iter().map(|step| step.identity.clone()).collect()
    }
}

pub fn route_point(root: &Node, point: Point) -> EventRoute {
    let mut route = EventRoute::default();
    let identity = identity_of(root, 0);
    walk(root, identity, Point::ZERO, point, &mut route.steps);
    route
}

fn walk(
    node: &Node,
    identity: Identity,
    parent_origin: Point,
    point: Point,
    steps: &mut Vec<RouteStep>,
) -> bool {
    let frame = node.frame(parent_origin);
    let solid = node.has_extent();
    if solid && !frame.contains(point) {
        return false;
    }
    steps.push(RouteStep {
        identity,
        tag: node.tag().to_owned(),
        frame,
    });

    let children = node.children();
    let mut ordinals = Vec::with_capacity(children.len());
    let mut unkeyed = 0;
    for child in children {
        ordinals.push(unkeyed);
        if child.key().is_none() {
            unkeyed += 1;
        }
    }
    for (child, ordinal) in children.iter().zip(ordinals).rev() {
        if walk(
            child,
            identity_of(child, ordinal),
            frame.origin(),
            point,
            steps,
        ) {
            return true;
        }
    }

    if !solid {
        steps.pop();
    }
    solid
}

fn identity_of(node: &Node, unkeyed_ordinal: usize) -> Identity {
    match node.key() {
        Some(key) => Identity::Key(key.clone()),
        None => Identity::Index(unkeyed_ordinal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(key: i64, x: f32, y: f32) -> Node {
        Node::new("cell")
            .key(key)
            .prop("x", x)
            .prop("y", y)
            .prop("width", 10.0)
            .prop("height", 10.0)
            .build()
    }

    fn board() -> Node {
        Node::new("board")
            .prop("x", 100.0)
            .prop("y", 50.0)
            .prop("width", 40.0)
            .prop("height", 40.0)
            .children([cell(1, 0.0, 0.0), cell(2, 10.0, 0.0), cell(3, 5.0, 0.0)])
            .build()
    }

    #[test]
    fn routes_to_deepest_node_in_absolute_coordinates() {
        let root = Node::new("screen").child(board()).build();
        let route = route_point(&root, Point::new(102.0, 52.0));
        let tags: Vec<&str> = route.steps().iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, ["screen", "board", "cell"]);
        assert_eq!(route.innermost_key(), Some(&NodeKey::Int(1)));
        assert_eq!(route.target().map(|s| s.frame), Some(Rect::new(100.0, 50.0, 10.0, 10.0)));
    }

    #[test]
    fn later_siblings_win_overlaps() {
        let root = board();
        let route = route_point(&root, Point::new(112.0, 55.0));
        assert_eq!(route.innermost_key(), Some(&NodeKey::Int(3)));
        assert!(!route.passes_through(&NodeKey::Int(2)));
    }

    #[test]
    fn point_outside_every_sized_node_routes_nowhere() {
        let root = Node::new("screen").child(board()).build();
        let route = route_point(&root, Point::new(5.0, 5.0));
        assert!(route.is_empty());
        assert_eq!(route.target(), None);
    }

    #[test]
    fn unkeyed_children_are_named_by_ordinal() {
        let root = Node::new("row")
            .prop("width", 30.0)
            .prop("height", 10.0)
            .child(Node::new("a").prop("width", 10.0).prop("height", 10.0).build())
            .child(cell(9, 10.0, 0.0))
            .child(
                Node::new("b")
                    .prop("x", 20.0)
                    .prop("width", 10.0)
                    .prop("height", 10.0)
                    .build(),
            )
            .build();
        let route = route_point(&root, Point::new(25.0, 5.0));
        assert_eq!(
            route.path(),
            [Identity::Index(0), Identity::Index(1)].into_iter().collect()
        );
    }
}
