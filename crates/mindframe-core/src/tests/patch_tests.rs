use super::*;
use crate::diff::diff;
use crate::value::Value;
use pretty_assertions::assert_eq;

/// Mirror that logs every lifecycle callback it receives.
struct Tracked {
    identity: Identity,
    label: String,
    key: Option<NodeKey>,
    children: Vec<Tracked>,
}

impl PatchTarget for Tracked {
    type Context = Vec<String>;

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

    fn mount(node: &Node, log: &mut Vec<String>) -> Self {
        let label = node
            .prop("label")
            .and_then(Value::as_str)
            .unwrap_or(node.tag())
            .to_owned();
        log.push(format!("mount {label}"));
        let mut children: Vec<Tracked> = node
            .children()
            .iter()
            .map(|child| Tracked::mount(child, log))
            .collect();
        assign_identities(&mut children);
        Tracked {
            identity: Identity::Index(usize::MAX),
            label,
            key: node.key().cloned(),
            children,
        }
    }

    fn unmount(self, log: &mut Vec<String>) {
        log.push(format!("unmount {}", self.label));
    }

    fn moved(&mut self, log: &mut Vec<String>) {
        log.push(format!("move {}", self.label));
    }

    fn update_props(&mut self, changes: &PropChanges, log: &mut Vec<String>) {
        log.push(format!("update {} ({} props)", self.label, changes.len()));
    }

    fn children_updated(&mut self, log: &mut Vec<String>) {
        log.push(format!("children {}", self.label));
    }
}

fn item(key: i64, label: &str) -> Node {
    Node::new("item").key(key).prop("label", label).build()
}

fn list(items: &[(i64, &str)]) -> Node {
    Node::new("list")
        .children(items.iter().map(|&(key, label)| item(key, label)))
        .build()
}

fn mount_list(root: &Node) -> Vec<Tracked> {
    let mut log = Vec::new();
    let mut roots = vec![Tracked::mount(root, &mut log)];
    assign_identities(&mut roots);
    roots
}

#[test]
fn callbacks_follow_patch_order() {
    let previous = list(&[(1, "a"), (2, "b"), (3, "c")]);
    let next = list(&[(3, "c"), (1, "a"), (4, "d"), (2, "b2")]);
    let patches = diff(Some(&previous), &next).unwrap();

    let mut roots = mount_list(&previous);
    let mut log = Vec::new();
    apply_patches(&mut roots, &patches, &mut log).unwrap();

    assert_eq!(
        log,
        vec![
            "move c".to_owned(),
            "mount d".to_owned(),
            "update b (1 props)".to_owned(),
            "children list".to_owned(),
        ]
    );
    let order: Vec<Option<NodeKey>> = roots[0]
        .children
        .iter()
        .map(|child| child.key.clone())
        .collect();
    assert_eq!(
        order,
        vec![
            Some(NodeKey::Int(3)),
            Some(NodeKey::Int(1)),
            Some(NodeKey::Int(4)),
            Some(NodeKey::Int(2)),
        ]
    );
}

#[test]
fn removed_subtrees_are_unmounted() {
    let previous = list(&[(1, "a"), (2, "b")]);
    let next = list(&[(2, "b")]);
    let patches = diff(Some(&previous), &next).unwrap();

    let mut roots = mount_list(&previous);
    let mut log = Vec::new();
    apply_patches(&mut roots, &patches, &mut log).unwrap();
    assert_eq!(log, vec!["unmount a".to_owned(), "children list".to_owned()]);
}

#[test]
fn unknown_target_is_reported_with_path() {
    let mut roots = MirrorNode::list_from(Some(&list(&[(1, "a")])));
    let patches = vec![Patch::UpdateChildren {
        identity: Identity::Index(0),
        patches: vec![Patch::Remove {
            identity: Identity::Key(NodeKey::Int(9)),
        }],
    }];
    let err = apply_patches(&mut roots, &patches, &mut ()).unwrap_err();
    assert_eq!(
        err,
        PatchError::UnknownTarget {
            identity: Identity::Key(NodeKey::Int(9)),
            path: [Identity::Index(0)].into_iter().collect(),
        }
    );
}

#[test]
fn insert_past_the_end_is_rejected() {
    let mut roots = MirrorNode::list_from(None);
    let patches = vec![Patch::Insert {
        node: item(1, "a"),
        position: 2,
    }];
    let err = apply_patches(&mut roots, &patches, &mut ()).unwrap_err();
    assert_eq!(
        err,
        PatchError::PositionOutOfBounds {
            position: 2,
            len: 0,
            path: NodePath::root(),
        }
    );
}

#[test]
fn unkeyed_identities_are_renumbered_after_inserts() {
    let dot = |label: &str| Node::new("dot").prop("label", label).build();
    let previous = Node::new("row").child(dot("x")).child(dot("y")).build();
    let next = Node::new("row")
        .child(Node::new("marker").build())
        .child(dot("y"))
        .child(dot("z"))
        .build();
    let patches = diff(Some(&previous), &next).unwrap();

    let mut roots = MirrorNode::list_from(Some(&previous));
    apply_patches(&mut roots, &patches, &mut ()).unwrap();
    let identities: Vec<Identity> = roots[0]
        .children_mut()
        .iter()
        .map(|child| child.identity().clone())
        .collect();
    assert_eq!(
        identities,
        vec![Identity::Index(0), Identity::Index(1), Identity::Index(2)]
    );
    assert_eq!(
        roots[0].to_node().subtree_fingerprint(),
        next.subtree_fingerprint()
    );
}

#[test]
fn mirror_round_trips_a_tree() {
    let tree = list(&[(1, "a"), (2, "b")]);
    let roots = MirrorNode::list_from(Some(&tree));
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].to_node().subtree_fingerprint(), tree.subtree_fingerprint());
    assert!(MirrorNode::list_from(None).is_empty());
}
