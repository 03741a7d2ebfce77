//! Hit testing: canvas point → block lookup.
//!
//! Blocks are painted in z-index order, later insertion on top for equal
//! z. The topmost block under the point wins.

use crate::geometry::{block_bounds, intersects};
use bw_core::id::BlockId;
use bw_core::model::{Block, Size};
use kurbo::{Point, Rect};

/// Find the topmost visible block containing `point` (canvas space).
/// Returns `None` on empty canvas.
pub fn hit_test<'a>(
    blocks: impl IntoIterator<Item = &'a Block>,
    point: Point,
    fallback: Size,
) -> Option<BlockId> {
    let mut best: Option<&Block> = None;
    for block in blocks {
        if !block.visible {
            continue;
        }
        let b = block_bounds(block, fallback);
        // Edges count as inside so a click on a border still grabs the block.
        let inside = point.x >= b.x0 && point.x <= b.x1 && point.y >= b.y0 && point.y <= b.y1;
        if inside && best.is_none_or(|top| block.z_index >= top.z_index) {
            best = Some(block);
        }
    }
    best.map(|b| b.id)
}

/// All visible blocks whose bounds intersect `rect` (canvas space).
/// Used for marquee selection.
pub fn hit_test_rect<'a>(
    blocks: impl IntoIterator<Item = &'a Block>,
    rect: Rect,
    fallback: Size,
) -> Vec<BlockId> {
    let rect = rect.abs();
    blocks
        .into_iter()
        .filter(|b| b.visible && intersects(&block_bounds(b, fallback), &rect))
        .map(|b| b.id)
        .collect()
}
