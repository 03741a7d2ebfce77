//! Viewport transform and block bounds.
//!
//! Canvas space is where block positions live. Screen space is the
//! container the canvas is drawn into:
//! `screen = canvas * zoom + (viewport.x, viewport.y)`.

use bw_core::model::{Block, Size};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

/// Pan offset (screen pixels) and zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub const fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    /// Canvas → screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate((self.x, self.y)) * Affine::scale(self.zoom)
    }

    pub fn canvas_to_screen(&self, p: Point) -> Point {
        self.transform() * p
    }

    pub fn screen_to_canvas(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.zoom, (p.y - self.y) / self.zoom)
    }
}

/// Size of the element the canvas is rendered into, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Canvas-space bounds of a block, using `fallback` when it has no size.
pub fn block_bounds(block: &Block, fallback: Size) -> Rect {
    let size = block.size.unwrap_or(fallback);
    Rect::new(
        block.position.x,
        block.position.y,
        block.position.x + size.width,
        block.position.y + size.height,
    )
}

/// Strict AABB overlap: rectangles that only share an edge do not overlap.
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

/// Whether `inner` lies entirely within `outer` (edges included).
pub fn contains_rect(outer: &Rect, inner: &Rect) -> bool {
    inner.x0 >= outer.x0 && inner.x1 <= outer.x1 && inner.y0 >= outer.y0 && inner.y1 <= outer.y1
}
