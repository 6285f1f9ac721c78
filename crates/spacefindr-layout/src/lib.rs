//! Treemap layout for spacefindr.
//!
//! Maps one level of a [`StorageTree`](spacefindr_core::StorageTree) into
//! rectangles whose areas are proportional to entry sizes. Layout is a pure
//! function over in-memory data and is cheap enough to rerun on every
//! viewport change.
//!
//! ```
//! use spacefindr_layout::{Rect, squarify};
//!
//! let rects = squarify([("a", 300), ("b", 100)], Rect::new(0.0, 0.0, 40.0, 10.0));
//! assert_eq!(rects[0].item, "a");
//! assert_eq!(rects[0].rect.width, 30.0);
//! ```

#![warn(missing_docs)]

mod rect;
mod squarify;

pub use rect::{LayoutRect, Rect};
pub use squarify::{layout_children, squarify};
