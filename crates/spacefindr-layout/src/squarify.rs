//! Median-split squarified treemap.

use std::cmp::Reverse;
use std::iter;

use spacefindr_core::{NodeId, StorageTree};

use crate::rect::{LayoutRect, Rect};

/// A run of sorted items still to be placed inside `bounds`.
#[derive(Debug, Clone, Copy)]
struct Segment {
    start: usize,
    end: usize,
    bounds: Rect,
}

/// Lay out weighted items inside `bounds`.
///
/// Items are stably sorted by descending weight and the result follows that
/// order, one rectangle per item. Each run of items is split where its
/// cumulative weight first reaches half of the run's total, along the longer
/// side of its rectangle, and each half gets an extent proportional to its
/// weight. The rectangles tile `bounds` exactly, up to floating-point
/// rounding. Items of a run whose total weight is zero share its extent
/// evenly.
pub fn squarify<T, I>(items: I, bounds: Rect) -> Vec<LayoutRect<T>>
where
    I: IntoIterator<Item = (T, u64)>,
{
    let mut items: Vec<(T, u64)> = items.into_iter().collect();
    if items.is_empty() {
        return Vec::new();
    }
    items.sort_by_key(|&(_, weight)| Reverse(weight));

    let prefix: Vec<u128> = iter::once(0)
        .chain(items.iter().scan(0u128, |acc, &(_, weight)| {
            *acc += u128::from(weight);
            Some(*acc)
        }))
        .collect();

    let mut rects = vec![Rect::default(); items.len()];
    let mut stack = vec![Segment {
        start: 0,
        end: items.len(),
        bounds,
    }];

    while let Some(segment) = stack.pop() {
        if segment.end - segment.start == 1 {
            rects[segment.start] = segment.bounds;
            continue;
        }

        let (k, fraction) = split_point(&prefix, segment.start, segment.end);
        let mid = segment.start + k;
        let (first, rest) = if segment.bounds.width > segment.bounds.height {
            segment.bounds.split_x(fraction)
        } else {
            segment.bounds.split_y(fraction)
        };

        // `first` is popped next so rectangles are produced in item order.
        stack.push(Segment {
            start: mid,
            end: segment.end,
            bounds: rest,
        });
        stack.push(Segment {
            start: segment.start,
            end: mid,
            bounds: first,
        });
    }

    items
        .into_iter()
        .zip(rects)
        .map(|((item, _), rect)| LayoutRect { item, rect })
        .collect()
}

/// Size of the leading half of `start..end` and its share of the extent.
///
/// Requires at least two items in the run.
fn split_point(prefix: &[u128], start: usize, end: usize) -> (usize, f64) {
    let base = prefix[start];
    let total = prefix[end] - base;
    let count = end - start;

    if total == 0 {
        return (1, 1.0 / count as f64);
    }

    let k = prefix[start + 1..=end].partition_point(|&acc| 2 * (acc - base) < total) + 1;
    // Sorted descending, the last item never holds half the weight on its own.
    let k = k.min(count - 1);
    let first_total = prefix[start + k] - base;
    (k, first_total as f64 / total as f64)
}

/// Lay out the direct children of `folder` by size.
///
/// Files and childless folders produce no rectangles.
pub fn layout_children(
    tree: &StorageTree,
    folder: NodeId,
    bounds: Rect,
) -> Vec<LayoutRect<NodeId>> {
    let children = tree.children(folder);
    tracing::trace!(
        folder = %tree.get(folder).full_path.display(),
        children = children.len(),
        width = bounds.width,
        height = bounds.height,
        "laying out folder"
    );
    squarify(
        children.iter().map(|&id| (id, tree.get(id).size)),
        bounds,
    )
}
