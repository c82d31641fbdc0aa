use super::*;
use pretty_assertions::assert_eq;

fn cell(lit: bool) -> Node {
    Node::new("cell").prop("lit", lit).build()
}

fn row(child: Node) -> Node {
    Node::new("row").key(1).prop("x", 0).child(child).build()
}

#[test]
fn equality_ignores_children() {
    let a = row(cell(true));
    let b = row(cell(false));

    assert_eq!(a.tag(), b.tag());
    assert_eq!(a.key(), b.key());
    assert_eq!(a.props(), b.props());
    assert!(a == b);
    assert!(!a.deep_eq(&b));
    assert_ne!(a.subtree_fingerprint(), b.subtree_fingerprint());
}

#[test]
fn equality_sees_tag_key_and_props() {
    let base = Node::new("cell").key(1).prop("x", 0).build();
    assert!(base != Node::new("tile").key(1).prop("x", 0).build());
    assert!(base != Node::new("cell").key(2).prop("x", 0).build());
    assert!(base != Node::new("cell").prop("x", 0).build());
    assert!(base != Node::new("cell").key(1).prop("x", 1).build());
    assert!(base == Node::new("cell").key(1).prop("x", 0).build());
}

#[test]
fn deep_equality_compares_whole_subtrees() {
    assert!(row(cell(true)).deep_eq(&row(cell(true))));
    let longer = Node::new("row")
        .key(1)
        .prop("x", 0)
        .child(cell(true))
        .child(cell(true))
        .build();
    assert!(!row(cell(true)).deep_eq(&longer));
}

#[test]
fn prop_order_does_not_change_fingerprints() {
    let a = Node::new("cell").prop("x", 1).prop("y", 2).prop("color", "#fff").build();
    let b = Node::new("cell").prop("color", "#fff").prop("y", 2).prop("x", 1).build();

    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.subtree_fingerprint(), b.subtree_fingerprint());
    assert!(a == b);
    let names: Vec<&str> = a.props().keys().map(|name| &**name).collect();
    assert_eq!(names, ["color", "x", "y"]);
}

#[test]
fn building_is_pure() {
    let child = cell(true);
    let first = row(child.clone());
    let second = row(child.clone());

    assert!(!Node::ptr_eq(&first, &second));
    assert!(first.deep_eq(&second));
    assert!(Node::ptr_eq(&first.children()[0], &child));
    assert_eq!(child.prop("lit"), Some(&Value::from(true)));
}

#[test]
fn fingerprint_ignores_children_but_subtree_does_not() {
    let a = row(cell(true));
    let b = row(cell(false));
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a.subtree_fingerprint(), b.subtree_fingerprint());
}

#[test]
fn validate_reports_nested_duplicate_keys_with_their_path() {
    let tree = Node::new("screen")
        .child(
            Node::new("grid")
                .key("board")
                .child(Node::new("cell").key(3).build())
                .child(Node::new("cell").key(3).build())
                .build(),
        )
        .build();

    let err = tree.validate().unwrap_err();
    let StructuralError::DuplicateKey { key, path } = err;
    assert_eq!(key, NodeKey::Int(3));
    assert_eq!(
        path.segments(),
        &[Identity::Index(0), Identity::Key(NodeKey::from("board"))]
    );
    assert_eq!(path.to_string(), "/@0/#board");
}

#[test]
fn distinct_keys_validate() {
    let tree = Node::new("grid")
        .child(Node::new("cell").key(1).build())
        .child(Node::new("cell").key(2).build())
        .child(Node::new("cell").build())
        .build();
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn frame_comes_from_position_and_size_props() {
    let node = Node::new("cell")
        .prop("x", 4)
        .prop("y", 6)
        .prop("width", 10)
        .prop("height", 8)
        .build();
    assert!(node.has_extent());
    assert_eq!(node.size(), Size::new(10.0, 8.0));
    assert_eq!(
        node.frame(Point::new(100.0, 0.0)),
        Rect::new(104.0, 6.0, 10.0, 8.0)
    );
}
