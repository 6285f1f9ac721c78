use proptest::prelude::*;
use spacefindr_core::{StorageNode, StorageTree, aggregate_sizes};
use spacefindr_layout::{LayoutRect, Rect, layout_children, squarify};

const EPS: f64 = 1e-6;

fn assert_tiles(layout: &[LayoutRect<usize>], bounds: Rect) {
    let total: f64 = layout.iter().map(|l| l.rect.area()).sum();
    assert!(
        (total - bounds.area()).abs() <= EPS * bounds.area().max(1.0),
        "area {total} != {}",
        bounds.area()
    );
    for l in layout {
        assert!(l.rect.width >= 0.0 && l.rect.height >= 0.0);
        assert!(l.rect.x >= bounds.x - EPS && l.rect.right() <= bounds.right() + EPS);
        assert!(l.rect.y >= bounds.y - EPS && l.rect.bottom() <= bounds.bottom() + EPS);
    }
}

// ──────────────────── strategies ────────────────────

fn arb_bounds() -> impl Strategy<Value = Rect> {
    (-500.0f64..500.0, -500.0f64..500.0, 1.0f64..2000.0, 1.0f64..2000.0)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn arb_weights() -> impl Strategy<Value = Vec<u64>> {
    prop_oneof![
        prop::collection::vec(0u64..1_000, 0..60),
        prop::collection::vec(0u64..u64::MAX / 64, 1..20),
        prop::collection::vec(Just(0u64), 1..10),
    ]
}

// ──────────────────── properties ────────────────────

proptest! {
    #[test]
    fn prop_one_rect_per_item(weights in arb_weights(), bounds in arb_bounds()) {
        let layout = squarify(weights.iter().copied().enumerate(), bounds);
        prop_assert_eq!(layout.len(), weights.len());

        let mut seen: Vec<usize> = layout.iter().map(|l| l.item).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..weights.len()).collect::<Vec<_>>());
    }

    #[test]
    fn prop_rects_tile_bounds(weights in arb_weights(), bounds in arb_bounds()) {
        prop_assume!(!weights.is_empty());
        let layout = squarify(weights.iter().copied().enumerate(), bounds);
        assert_tiles(&layout, bounds);
    }

    #[test]
    fn prop_rects_do_not_overlap(weights in arb_weights(), bounds in arb_bounds()) {
        let layout = squarify(weights.iter().copied().enumerate(), bounds);
        for (i, a) in layout.iter().enumerate() {
            for b in &layout[i + 1..] {
                prop_assert!(a.rect.intersection_area(&b.rect) <= EPS * bounds.area());
            }
        }
    }

    #[test]
    fn prop_output_sorted_descending(weights in arb_weights(), bounds in arb_bounds()) {
        let layout = squarify(weights.iter().copied().enumerate(), bounds);
        for pair in layout.windows(2) {
            let (a, b) = (weights[pair[0].item], weights[pair[1].item]);
            prop_assert!(a > b || (a == b && pair[0].item < pair[1].item));
        }
    }

    #[test]
    fn prop_area_proportional_to_weight(
        weights in prop::collection::vec(1u64..1_000, 1..40),
        bounds in arb_bounds(),
    ) {
        let total: u64 = weights.iter().sum();
        let layout = squarify(weights.iter().copied().enumerate(), bounds);
        for l in &layout {
            let expected = bounds.area() * weights[l.item] as f64 / total as f64;
            prop_assert!((l.rect.area() - expected).abs() <= 1e-6 * bounds.area());
        }
    }

    #[test]
    fn prop_deterministic(weights in arb_weights(), bounds in arb_bounds()) {
        let first = squarify(weights.iter().copied().enumerate(), bounds);
        let second = squarify(weights.iter().copied().enumerate(), bounds);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_empty_input() {
    let layout = squarify(Vec::<(usize, u64)>::new(), Rect::new(0.0, 0.0, 10.0, 10.0));
    assert!(layout.is_empty());
}

#[test]
fn test_single_item_gets_full_rect() {
    let bounds = Rect::new(3.5, -2.0, 640.0, 480.0);
    for weight in [0, 1, 12_345] {
        let layout = squarify([("only", weight)], bounds);
        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].rect, bounds);
    }
}

#[test]
fn test_layout_children_of_folder() {
    let mut tree = StorageTree::new("/data");
    let root = tree.root();
    let media = tree.add_child(root, StorageNode::folder("media", ""));
    tree.add_child(media, StorageNode::file("movie.mkv", "", 600));
    let docs = tree.add_child(root, StorageNode::folder("docs", ""));
    tree.add_child(docs, StorageNode::file("notes.txt", "", 100));
    let readme = tree.add_child(root, StorageNode::file("readme.md", "", 300));
    aggregate_sizes(&mut tree);

    let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
    let layout = layout_children(&tree, root, bounds);

    let order: Vec<_> = layout.iter().map(|l| l.item).collect();
    assert_eq!(order, [media, readme, docs]);
    assert!((layout[0].rect.area() - 6000.0).abs() < 1e-9);
    assert!((layout[2].rect.area() - 1000.0).abs() < 1e-9);

    let hit = layout
        .iter()
        .find(|l| l.rect.contains(99.0, 99.0))
        .map(|l| l.item);
    assert!(hit.is_some());
}

#[test]
fn test_layout_children_of_file_is_empty() {
    let mut tree = StorageTree::new("/data");
    let file = tree.add_child(tree.root(), StorageNode::file("a.bin", "", 10));
    assert!(layout_children(&tree, file, Rect::new(0.0, 0.0, 5.0, 5.0)).is_empty());
}

#[test]
fn test_layout_serializes() {
    let layout = squarify([("a", 1u64)], Rect::new(0.0, 0.0, 2.0, 1.0));
    let json = serde_json::to_value(&layout).unwrap();
    assert_eq!(json[0]["item"], "a");
    assert_eq!(json[0]["rect"]["width"], 2.0);
}
