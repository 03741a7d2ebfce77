//! Integration tests: culling blocks straight out of a `BlockStore`.

use bw_core::model::*;
use bw_core::{BlockId, BlockStore};
use bw_render::{ContainerSize, CullConfig, Viewport, VisibilityEngine, hit_test};
use kurbo::Point;
use std::time::Instant;

const CONTAINER: ContainerSize = ContainerSize::new(800.0, 600.0);

/// A `cols` x `rows` grid of 100x40 blocks spaced 150px apart.
fn grid_store(cols: usize, rows: usize) -> BlockStore {
    let mut store = BlockStore::new();
    let ty = BlockType::new("t_move", "move", BlockKind::Move).with_size(Size::new(100.0, 40.0));
    for r in 0..rows {
        for c in 0..cols {
            store
                .create_block(&ty, Some(Position::new(c as f64 * 150.0, r as f64 * 150.0)))
                .unwrap();
        }
    }
    store
}

#[test]
fn grid_culling_counts() {
    let store = grid_store(20, 20);
    let mut engine = VisibilityEngine::new(CullConfig {
        margin: 0.0,
        ..Default::default()
    });

    let visible = engine.calculate_visible_blocks(store.blocks(), &Viewport::default(), CONTAINER);
    // Columns starting at 0..=750 and rows at 0..=450 reach into 800x600.
    assert_eq!(visible.len(), 6 * 4);

    let stats = engine.performance_stats();
    assert_eq!(stats.total_blocks, 400);
    assert_eq!(stats.visible_blocks + stats.culled_blocks, 400);
    assert!(stats.culling_efficiency > 0.9);
}

#[test]
fn panning_moves_the_window() {
    let store = grid_store(20, 20);
    let mut engine = VisibilityEngine::new(CullConfig {
        margin: 0.0,
        ..Default::default()
    });

    let far_corner = Viewport::new(-19.0 * 150.0, -19.0 * 150.0, 1.0);
    let visible = engine.calculate_visible_blocks(store.blocks(), &far_corner, CONTAINER);
    assert!(!visible.is_empty());
    for b in &visible {
        assert!(b.position.x >= 19.0 * 150.0 - 100.0);
        assert!(b.position.y >= 19.0 * 150.0 - 40.0);
    }
}

#[test]
fn hit_test_store_blocks() {
    let store = grid_store(3, 3);
    let hit = hit_test(store.blocks(), Point::new(160.0, 10.0), CullConfig::default().default_size());
    let expected = store
        .blocks()
        .find(|b| b.position == Position::new(150.0, 0.0))
        .map(|b| b.id);
    assert_eq!(hit, expected);
    assert_eq!(
        hit_test(store.blocks(), Point::new(120.0, 10.0), CullConfig::default().default_size()),
        None::<BlockId>
    );
}

#[test]
#[ignore] // Run manually with `cargo test --test culling -- --nocapture --ignored`
fn benchmark_culling_thousand_blocks() {
    let store = grid_store(40, 25);
    let mut engine = VisibilityEngine::default();

    let start = Instant::now();
    for i in 0..1_000 {
        let vp = Viewport::new(-(i as f64), -(i as f64) * 0.5, 1.0);
        engine.calculate_visible_blocks(store.blocks(), &vp, CONTAINER);
    }
    let duration = start.elapsed();

    println!(
        "Culled 1,000 blocks x 1,000 frames in {:?} ({:?}/frame)",
        duration,
        duration / 1_000
    );
    assert!(duration / 1_000 < std::time::Duration::from_millis(3));
}
