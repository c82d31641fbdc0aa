use super::*;
use mindframe_core::{apply_patches, diff};
use pretty_assertions::assert_eq;

fn cell(key: i64, x: i64, color: &str) -> Node {
    Node::new("cell")
        .key(key)
        .prop("x", x)
        .prop("width", 10)
        .prop("height", 10)
        .prop("color", color)
        .build()
}

fn row(cells: Vec<Node>) -> Node {
    Node::new("row").children(cells).build()
}

/// Applies `next` on top of `roots` and returns the collected damage.
fn advance(roots: &mut Vec<RetainedNode>, previous: Option<&Node>, next: &Node) -> Vec<Rect> {
    let patches = diff(previous, next).unwrap();
    let mut cx = RetainedContext::default();
    apply_patches(roots, &patches, &mut cx).unwrap();
    let mut damage = cx.removed;
    for root in roots.iter_mut() {
        root.refresh(Point::ZERO, &mut damage);
    }
    damage
}

#[test]
fn first_mount_damages_the_whole_tree() {
    let tree = Node::new("board")
        .prop("x", 10)
        .prop("y", 10)
        .prop("width", 100)
        .prop("height", 50)
        .child(
            Node::new("cell")
                .prop("x", 5)
                .prop("y", 5)
                .prop("width", 10)
                .prop("height", 10)
                .build(),
        )
        .build();
    let mut roots = Vec::new();
    let damage = advance(&mut roots, None, &tree);

    assert_eq!(damage, vec![Rect::new(10.0, 10.0, 100.0, 50.0)]);
    assert_eq!(roots[0].children()[0].frame(), Rect::new(15.0, 15.0, 10.0, 10.0));
    assert!(roots[0].to_node().deep_eq(&tree));
}

#[test]
fn prop_update_damages_only_the_changed_leaf() {
    let previous = row(vec![cell(0, 0, "#ff0000"), cell(1, 20, "#ff0000")]);
    let next = row(vec![cell(0, 0, "#ff0000"), cell(1, 20, "#00ff00")]);
    let mut roots = Vec::new();
    advance(&mut roots, None, &previous);

    let damage = advance(&mut roots, Some(&previous), &next);
    let leaf = Rect::new(20.0, 0.0, 10.0, 10.0);
    assert_eq!(damage, vec![leaf, leaf]);
    assert_eq!(
        roots[0].children()[1].fingerprint(),
        next.children()[1].fingerprint()
    );
    assert_eq!(roots[0].bounds(), Some(Rect::new(0.0, 0.0, 30.0, 10.0)));
}

#[test]
fn removal_reports_last_painted_bounds() {
    let previous = row(vec![cell(0, 0, "#ff0000"), cell(1, 20, "#ff0000")]);
    let next = row(vec![cell(1, 20, "#ff0000")]);
    let mut roots = Vec::new();
    advance(&mut roots, None, &previous);

    let damage = advance(&mut roots, Some(&previous), &next);
    assert_eq!(damage, vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
    assert_eq!(roots[0].bounds(), Some(Rect::new(20.0, 0.0, 10.0, 10.0)));
    assert!(roots[0].to_node().deep_eq(&next));
}

#[test]
fn moving_a_container_relays_out_its_subtree() {
    let panel = |x: i64| {
        Node::new("panel")
            .key("p")
            .prop("x", x)
            .child(cell(0, 5, "#ffffff"))
            .build()
    };
    let previous = row(vec![panel(0)]);
    let next = row(vec![panel(50)]);
    let mut roots = Vec::new();
    advance(&mut roots, None, &previous);

    let damage = advance(&mut roots, Some(&previous), &next);
    assert_eq!(
        damage,
        vec![
            Rect::new(5.0, 0.0, 10.0, 10.0),
            Rect::new(55.0, 0.0, 10.0, 10.0)
        ]
    );
    assert_eq!(
        roots[0].children()[0].children()[0].frame(),
        Rect::new(55.0, 0.0, 10.0, 10.0)
    );
}

#[test]
fn completed_surfaces_damage_matching_leaves() {
    let tree = row(vec![cell(0, 0, "#ff0000"), cell(1, 20, "#00ff00")]);
    let mut roots = Vec::new();
    advance(&mut roots, None, &tree);

    let ready: HashSet<Fingerprint> = [tree.children()[1].fingerprint()].into_iter().collect();
    assert!(roots[0].damage_matching(&ready));
    let mut damage = Vec::new();
    roots[0].refresh(Point::ZERO, &mut damage);
    let leaf = Rect::new(20.0, 0.0, 10.0, 10.0);
    assert_eq!(damage, vec![leaf, leaf]);

    let unrelated: HashSet<Fingerprint> = [Fingerprint::from_raw(1)].into_iter().collect();
    assert!(!roots[0].damage_matching(&unrelated));
}

#[test]
fn containers_are_not_renderable() {
    let tree = Node::new("panel")
        .prop("width", 40)
        .prop("height", 40)
        .prop("background", "#202020")
        .prop("label", "Round 1")
        .child(cell(0, 0, "#ffffff"))
        .build();
    let mut roots = Vec::new();
    advance(&mut roots, None, &tree);

    let panel = &roots[0];
    assert!(!panel.is_renderable());
    assert!(panel.children()[0].is_renderable());
    assert_eq!(panel.background(), Some(Color::rgb(0x20, 0x20, 0x20)));
    assert_eq!(panel.label(), Some(("Round 1", Color::WHITE, DEFAULT_FONT_SIZE)));
    assert_eq!(panel.count(), 2);
}
