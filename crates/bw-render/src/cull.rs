//! Virtual-scroll culling.
//!
//! Decides which blocks are realized into the rendering layer. One linear
//! pass per call, constant work per block: transform the block's canvas
//! bounds to screen space and test it against the container rectangle
//! grown by `margin` on every side.
//!
//! The engine knows nothing about drag state. Callers that want the block
//! under the pointer rendered separately filter it out before calling.

use crate::geometry::{ContainerSize, Viewport, block_bounds, contains_rect, intersects};
use bw_core::id::BlockId;
use bw_core::model::{Block, Size};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullConfig {
    /// Extra screen pixels around the container treated as visible.
    pub margin: f64,
    pub default_block_width: f64,
    pub default_block_height: f64,
    /// Time each `calculate_visible_blocks` call.
    pub track_performance: bool,
}

impl Default for CullConfig {
    fn default() -> Self {
        Self {
            margin: 200.0,
            default_block_width: 200.0,
            default_block_height: 60.0,
            track_performance: true,
        }
    }
}

impl CullConfig {
    pub fn default_size(&self) -> Size {
        Size::new(self.default_block_width, self.default_block_height)
    }
}

/// Per-block classification against the un-expanded container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockVisibility {
    pub id: BlockId,
    /// Entirely inside the container.
    pub fully_visible: bool,
    /// Intersecting the container at all; also true for fully visible
    /// blocks.
    pub partially_visible: bool,
}

impl BlockVisibility {
    pub fn is_on_screen(&self) -> bool {
        self.partially_visible
    }

    /// Intersecting the container but cut by one of its edges.
    pub fn is_clipped(&self) -> bool {
        self.partially_visible && !self.fully_visible
    }
}

/// Result of the most recent `calculate_visible_blocks` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CullStats {
    pub total_blocks: usize,
    pub visible_blocks: usize,
    pub culled_blocks: usize,
    /// `culled / total`, 0 when there are no blocks.
    pub culling_efficiency: f64,
    pub last_duration: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityEngine {
    config: CullConfig,
    stats: CullStats,
}

impl VisibilityEngine {
    pub fn new(config: CullConfig) -> Self {
        Self {
            config,
            stats: CullStats::default(),
        }
    }

    pub fn config(&self) -> &CullConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CullConfig) {
        self.config = config;
    }

    /// Blocks intersecting the margin-expanded container, in source order.
    /// Hidden blocks are always culled.
    pub fn calculate_visible_blocks<'a>(
        &mut self,
        blocks: impl IntoIterator<Item = &'a Block>,
        viewport: &Viewport,
        container: ContainerSize,
    ) -> Vec<&'a Block> {
        let started = self.config.track_performance.then(Instant::now);
        let fallback = self.config.default_size();
        let transform = viewport.transform();
        let area = container.rect().inflate(self.config.margin, self.config.margin);

        let mut total = 0;
        let mut visible = Vec::new();
        for block in blocks {
            total += 1;
            if !block.visible {
                continue;
            }
            let screen = transform.transform_rect_bbox(block_bounds(block, fallback));
            if intersects(&screen, &area) {
                visible.push(block);
            }
        }

        let culled = total - visible.len();
        self.stats = CullStats {
            total_blocks: total,
            visible_blocks: visible.len(),
            culled_blocks: culled,
            culling_efficiency: if total == 0 {
                0.0
            } else {
                culled as f64 / total as f64
            },
            last_duration: started.map(|t| t.elapsed()),
        };
        log::trace!(
            "culled {culled}/{total} blocks in {:?}",
            self.stats.last_duration
        );
        visible
    }

    /// Classify every block against the container without margin.
    pub fn calculate_block_visibility<'a>(
        &self,
        blocks: impl IntoIterator<Item = &'a Block>,
        viewport: &Viewport,
        container: ContainerSize,
    ) -> Vec<BlockVisibility> {
        let fallback = self.config.default_size();
        let transform = viewport.transform();
        let area = container.rect();

        blocks
            .into_iter()
            .map(|block| {
                let screen = transform.transform_rect_bbox(block_bounds(block, fallback));
                let on_screen = block.visible && intersects(&screen, &area);
                let fully = on_screen && contains_rect(&area, &screen);
                BlockVisibility {
                    id: block.id,
                    fully_visible: fully,
                    partially_visible: on_screen,
                }
            })
            .collect()
    }

    pub fn performance_stats(&self) -> CullStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bw_core::model::{BlockKind, BlockType, Position};
    use pretty_assertions::assert_eq;

    fn block_at(name: &str, x: f64, y: f64, size: Option<Size>) -> Block {
        let mut ty = BlockType::new("t", name, BlockKind::Move);
        ty.size = size;
        Block::from_type(BlockId::intern(name), &ty, Position::new(x, y))
    }

    const CONTAINER: ContainerSize = ContainerSize::new(400.0, 400.0);

    #[test]
    fn near_block_is_visible_far_block_is_culled() {
        let mut engine = VisibilityEngine::new(CullConfig {
            margin: 200.0,
            ..Default::default()
        });
        let near = block_at("near", 0.0, 0.0, Some(Size::new(100.0, 50.0)));
        let far = block_at("far", 10_000.0, 10_000.0, Some(Size::new(100.0, 50.0)));
        let vp = Viewport::default();

        let visible = engine.calculate_visible_blocks([&near], &vp, CONTAINER);
        assert_eq!(visible.len(), 1);
        let visible = engine.calculate_visible_blocks([&far], &vp, CONTAINER);
        assert!(visible.is_empty());
    }

    #[test]
    fn margin_keeps_offscreen_neighbours() {
        let mut engine = VisibilityEngine::new(CullConfig::default());
        let just_outside = block_at("edge", 450.0, 0.0, Some(Size::new(50.0, 50.0)));
        let vp = Viewport::default();
        assert_eq!(
            engine
                .calculate_visible_blocks([&just_outside], &vp, CONTAINER)
                .len(),
            1
        );
        engine.set_config(CullConfig {
            margin: 0.0,
            ..Default::default()
        });
        assert!(
            engine
                .calculate_visible_blocks([&just_outside], &vp, CONTAINER)
                .is_empty()
        );
    }

    #[test]
    fn pan_and_zoom_are_applied() {
        let mut engine = VisibilityEngine::new(CullConfig {
            margin: 0.0,
            ..Default::default()
        });
        let b = block_at("b", 1000.0, 1000.0, Some(Size::new(100.0, 100.0)));
        // Pan so canvas (1000,1000) lands at screen (100,100).
        let panned = Viewport::new(-900.0, -900.0, 1.0);
        assert_eq!(engine.calculate_visible_blocks([&b], &panned, CONTAINER).len(), 1);
        // Zooming out brings it into view without panning.
        let zoomed = Viewport::new(0.0, 0.0, 0.3);
        assert_eq!(engine.calculate_visible_blocks([&b], &zoomed, CONTAINER).len(), 1);
        let zoomed_in = Viewport::new(0.0, 0.0, 2.0);
        assert!(engine.calculate_visible_blocks([&b], &zoomed_in, CONTAINER).is_empty());
    }

    #[test]
    fn default_size_applies_to_unsized_blocks() {
        let mut engine = VisibilityEngine::new(CullConfig {
            margin: 0.0,
            default_block_width: 200.0,
            default_block_height: 60.0,
            track_performance: false,
        });
        // Starts left of the container; only the default width reaches in.
        let b = block_at("unsized", -150.0, 10.0, None);
        let vp = Viewport::default();
        assert_eq!(engine.calculate_visible_blocks([&b], &vp, CONTAINER).len(), 1);
        assert_eq!(engine.performance_stats().last_duration, None);
    }

    #[test]
    fn hidden_blocks_are_culled() {
        let mut engine = VisibilityEngine::default();
        let mut b = block_at("hidden", 0.0, 0.0, None);
        b.visible = false;
        assert!(
            engine
                .calculate_visible_blocks([&b], &Viewport::default(), CONTAINER)
                .is_empty()
        );
        assert_eq!(engine.performance_stats().culled_blocks, 1);
    }

    #[test]
    fn source_order_is_preserved() {
        let mut engine = VisibilityEngine::default();
        let blocks: Vec<Block> = (0..5)
            .map(|i| block_at(&format!("o{i}"), 300.0 - i as f64 * 50.0, 0.0, None))
            .collect();
        let visible = engine.calculate_visible_blocks(&blocks, &Viewport::default(), CONTAINER);
        let names: Vec<&str> = visible.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["o0", "o1", "o2", "o3", "o4"]);
    }

    #[test]
    fn culling_efficiency_bounds() {
        let mut engine = VisibilityEngine::default();
        let vp = Viewport::default();
        let far: Vec<Block> = (0..10)
            .map(|i| block_at(&format!("far{i}"), 50_000.0 + i as f64, 50_000.0, None))
            .collect();
        engine.calculate_visible_blocks(&far, &vp, CONTAINER);
        let stats = engine.performance_stats();
        assert_eq!(stats.total_blocks, 10);
        assert_eq!(stats.culled_blocks, 10);
        assert_eq!(stats.culling_efficiency, 1.0);

        engine.calculate_visible_blocks(std::iter::empty(), &vp, CONTAINER);
        let stats = engine.performance_stats();
        assert_eq!(stats.total_blocks, 0);
        assert_eq!(stats.culling_efficiency, 0.0);
    }

    #[test]
    fn visibility_classification() {
        let engine = VisibilityEngine::default();
        let vp = Viewport::default();
        let inside = block_at("inside", 10.0, 10.0, Some(Size::new(50.0, 50.0)));
        let straddling = block_at("straddling", 380.0, 10.0, Some(Size::new(50.0, 50.0)));
        let outside = block_at("outside", 500.0, 10.0, Some(Size::new(50.0, 50.0)));

        let info = engine.calculate_block_visibility([&inside, &straddling, &outside], &vp, CONTAINER);
        assert_eq!(
            info,
            vec![
                BlockVisibility {
                    id: inside.id,
                    fully_visible: true,
                    partially_visible: true,
                },
                BlockVisibility {
                    id: straddling.id,
                    fully_visible: false,
                    partially_visible: true,
                },
                BlockVisibility {
                    id: outside.id,
                    fully_visible: false,
                    partially_visible: false,
                },
            ]
        );
        assert!(info[0].is_on_screen() && info[1].is_on_screen() && !info[2].is_on_screen());
        assert!(!info[0].is_clipped() && info[1].is_clipped());
    }
}
