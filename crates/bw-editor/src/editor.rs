//! The editor context.
//!
//! Owns the block store, the canvas store, the batch engine and the
//! visibility engine. Created once by the host and passed by reference;
//! there are no global stores.

use crate::batch::{BatchConfig, BatchEngine, BatchStats, CommitOutcome, Domain, Operation};
use crate::canvas::CanvasStore;
use crate::error::EditorError;
use bw_core::id::BlockId;
use bw_core::model::{BlockPatch, Position};
use bw_core::store::BlockStore;
use bw_render::{
    BlockVisibility, ContainerSize, CullConfig, CullStats, VisibilityEngine, hit_test,
    hit_test_rect,
};
use kurbo::{Point, Rect};
use serde::Deserialize;
use std::time::Instant;

/// Host-tunable settings, typically read from a project's `config` object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub batch: BatchConfig,
    pub cull: CullConfig,
}

impl EditorConfig {
    /// Read from a JSON value. Missing keys fall back to defaults.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(value)
    }
}

/// Everything operations may mutate.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub blocks: BlockStore,
    pub canvas: CanvasStore,
}

#[derive(Debug, Default)]
pub struct Editor {
    pub state: EditorState,
    batch: BatchEngine<EditorState>,
    culler: VisibilityEngine,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            state: EditorState::default(),
            batch: BatchEngine::new(config.batch),
            culler: VisibilityEngine::new(config.cull),
        }
    }

    pub fn blocks(&self) -> &BlockStore {
        &self.state.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut BlockStore {
        &mut self.state.blocks
    }

    pub fn canvas(&self) -> &CanvasStore {
        &self.state.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut CanvasStore {
        &mut self.state.canvas
    }

    // ─── Atomic updates ──────────────────────────────────────────────────

    /// Run `f` as a one-operation transaction.
    ///
    /// If `f` fails both stores are restored to their state before the
    /// call and the error is returned.
    pub fn batch_update(
        &mut self,
        f: impl FnOnce(&mut EditorState) -> Result<(), EditorError> + 'static,
    ) -> Result<(), EditorError> {
        let blocks_before = self.state.blocks.snapshot();
        let canvas_before = self.state.canvas.snapshot();

        self.batch.begin_transaction(None)?;
        self.batch.add_to_transaction(
            Operation::new(Domain::Project, f).with_rollback(move |state: &mut EditorState| {
                state.blocks.restore(blocks_before);
                state.canvas.restore(canvas_before);
                Ok(())
            }),
        )?;
        match self.batch.commit_transaction(&mut self.state)? {
            CommitOutcome::Committed => Ok(()),
            CommitOutcome::RolledBack { error, .. } => Err(error),
        }
    }

    // ─── Batch engine delegation ─────────────────────────────────────────

    /// Queue a fire-and-forget operation.
    pub fn queue(&mut self, op: Operation<EditorState>) {
        self.batch.add_operation(op, &mut self.state);
    }

    pub fn flush(&mut self) {
        self.batch.flush(&mut self.state);
    }

    /// Host event-loop hook; see `BatchEngine::poll`.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.batch.poll(&mut self.state, now)
    }

    pub fn pending_operations(&self) -> usize {
        self.batch.pending_len()
    }

    /// Returns the id of the opened transaction.
    pub fn begin_transaction(&mut self, id: Option<&str>) -> Result<String, EditorError> {
        Ok(self.batch.begin_transaction(id)?.id().to_string())
    }

    pub fn add_to_transaction(&mut self, op: Operation<EditorState>) -> Result<(), EditorError> {
        Ok(self.batch.add_to_transaction(op)?)
    }

    pub fn commit_transaction(&mut self) -> Result<CommitOutcome, EditorError> {
        Ok(self.batch.commit_transaction(&mut self.state)?)
    }

    pub fn rollback_transaction(&mut self) -> Result<(), EditorError> {
        Ok(self.batch.rollback_transaction(&mut self.state)?)
    }

    pub fn batch_stats(&self) -> BatchStats {
        self.batch.stats()
    }

    // ─── Visibility ──────────────────────────────────────────────────────

    /// Recompute the visible set for `container` and record it on the
    /// canvas. The block being dragged is left out; the host draws it on
    /// its own layer.
    pub fn refresh_visibility(&mut self, container: ContainerSize) -> Vec<BlockId> {
        let viewport = self.state.canvas.viewport();
        let dragged = self.state.canvas.interaction().dragged_block;
        let visible: Vec<BlockId> = self
            .culler
            .calculate_visible_blocks(
                self.state.blocks.blocks().filter(|b| Some(b.id) != dragged),
                &viewport,
                container,
            )
            .into_iter()
            .map(|b| b.id)
            .collect();

        let stats = self.culler.performance_stats();
        self.state
            .canvas
            .record_render(visible.clone(), stats.last_duration);
        visible
    }

    pub fn block_visibility(&self, container: ContainerSize) -> Vec<BlockVisibility> {
        self.culler.calculate_block_visibility(
            self.state.blocks.blocks(),
            &self.state.canvas.viewport(),
            container,
        )
    }

    pub fn cull_stats(&self) -> CullStats {
        self.culler.performance_stats()
    }

    pub fn cull_config(&self) -> &CullConfig {
        self.culler.config()
    }

    // ─── Pointer helpers ─────────────────────────────────────────────────

    /// Topmost block under a screen-space point.
    pub fn block_at(&self, screen: Position) -> Option<BlockId> {
        let p = self.state.canvas.screen_to_canvas(screen);
        hit_test(
            self.state.blocks.blocks(),
            Point::new(p.x, p.y),
            self.culler.config().default_size(),
        )
    }

    /// Close the marquee and select every block it touches.
    ///
    /// With `extend` the hits are added to the current selection instead
    /// of replacing it. Returns the hits.
    pub fn finish_selection_box(&mut self, extend: bool) -> Vec<BlockId> {
        let Some(screen) = self.state.canvas.end_selection_box() else {
            return Vec::new();
        };
        let canvas = &self.state.canvas;
        let p0 = canvas.screen_to_canvas(Position::new(screen.x0, screen.y0));
        let p1 = canvas.screen_to_canvas(Position::new(screen.x1, screen.y1));
        let hits = hit_test_rect(
            self.state.blocks.blocks(),
            Rect::new(p0.x, p0.y, p1.x, p1.y),
            self.culler.config().default_size(),
        );

        if extend {
            let mut ids = self.state.canvas.selected_ids();
            ids.extend(hits.iter().copied());
            self.state.canvas.select_blocks(ids);
        } else {
            self.state.canvas.select_blocks(hits.iter().copied());
        }
        log::debug!("marquee selected {} blocks", hits.len());
        hits
    }

    /// Move every selected block by a screen-space delta, atomically.
    pub fn move_selected(&mut self, dx: f64, dy: f64) -> Result<(), EditorError> {
        let zoom = self.state.canvas.viewport().zoom;
        let (dx, dy) = (dx / zoom, dy / zoom);
        let ids = self.state.canvas.selected_ids();
        self.batch_update(move |state| {
            for id in ids {
                let Some(block) = state.blocks.get_block(id) else {
                    continue;
                };
                let to = BlockPatch::position(block.position.x + dx, block.position.y + dy);
                state.blocks.update_block(id, &to)?;
            }
            Ok(())
        })
    }

    /// Delete every selected deletable block and clear the selection.
    /// Returns the ids that were removed.
    pub fn delete_selected(&mut self) -> Vec<BlockId> {
        let mut removed = Vec::new();
        for id in self.state.canvas.selected_ids() {
            let deletable = self
                .state
                .blocks
                .get_block(id)
                .is_some_and(|b| b.deletable);
            if deletable && self.state.blocks.delete_block(id).is_some() {
                removed.push(id);
            }
        }
        self.state.canvas.clear_selection();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bw_core::model::{BlockKind, BlockType, Size};
    use pretty_assertions::assert_eq;

    fn move_type() -> BlockType {
        BlockType::new("t_move", "move", BlockKind::Move).with_size(Size::new(100.0, 40.0))
    }

    #[test]
    fn config_from_project_value() {
        let value = serde_json::json!({ "cull": { "margin": 50.0 }, "batch": { "max_batch_size": 8 } });
        let cfg = EditorConfig::from_value(&value).unwrap();
        assert_eq!(cfg.cull.margin, 50.0);
        assert_eq!(cfg.cull.default_block_width, 200.0);
        assert_eq!(cfg.batch.max_batch_size, 8);
        assert_eq!(
            EditorConfig::from_value(&serde_json::Value::Null).unwrap(),
            EditorConfig::default()
        );
    }

    #[test]
    fn batch_update_restores_both_stores_on_error() {
        let mut editor = Editor::default();
        let a = editor.blocks_mut().create_block(&move_type(), None).unwrap();
        let blocks_before = editor.blocks().snapshot();

        let err = editor
            .batch_update(move |state| {
                state.blocks.update_block(a, &BlockPatch::name("renamed"))?;
                state.canvas.set_viewport_zoom(2.0)?;
                state.canvas.set_viewport_zoom(0.0)?;
                Ok(())
            })
            .unwrap_err();

        assert_eq!(err.code(), "INVALID_ZOOM");
        assert_eq!(editor.blocks().snapshot(), blocks_before);
        assert_eq!(editor.canvas().viewport().zoom, 1.0);
        // The implicit transaction is closed.
        assert!(editor.begin_transaction(None).is_ok());
    }

    #[test]
    fn batch_update_commits() {
        let mut editor = Editor::default();
        let a = editor.blocks_mut().create_block(&move_type(), None).unwrap();
        editor
            .batch_update(move |state| {
                state.blocks.update_block(a, &BlockPatch::position(5.0, 6.0))?;
                state.canvas.select_block(a, false);
                Ok(())
            })
            .unwrap();
        assert_eq!(editor.blocks().get_block(a).unwrap().position, Position::new(5.0, 6.0));
        assert!(editor.canvas().is_selected(a));
    }

    #[test]
    fn dragged_block_is_excluded_from_visibility() {
        let mut editor = Editor::default();
        let a = editor.blocks_mut().create_block(&move_type(), None).unwrap();
        let b = editor
            .blocks_mut()
            .create_block(&move_type(), Some(Position::new(150.0, 0.0)))
            .unwrap();
        let container = ContainerSize::new(800.0, 600.0);

        assert_eq!(editor.refresh_visibility(container), vec![a, b]);
        editor.canvas_mut().begin_drag(a);
        assert_eq!(editor.refresh_visibility(container), vec![b]);

        let perf = editor.canvas().performance();
        assert_eq!(perf.visible_block_ids, vec![b]);
        assert_eq!(perf.render_count, 2);
    }

    #[test]
    fn marquee_selects_in_canvas_space() {
        let mut editor = Editor::default();
        let a = editor
            .blocks_mut()
            .create_block(&move_type(), Some(Position::new(100.0, 100.0)))
            .unwrap();
        let far = editor
            .blocks_mut()
            .create_block(&move_type(), Some(Position::new(1000.0, 1000.0)))
            .unwrap();
        // Zoomed to 2x: canvas (100,100) is at screen (200,200).
        editor.canvas_mut().set_viewport_zoom(2.0).unwrap();

        editor.canvas_mut().start_selection_box(Position::new(190.0, 190.0));
        editor.canvas_mut().update_selection_box(Position::new(260.0, 260.0)).unwrap();
        assert_eq!(editor.finish_selection_box(false), vec![a]);
        assert!(editor.canvas().is_selected(a));
        assert!(!editor.canvas().is_selected(far));
        assert_eq!(editor.block_at(Position::new(210.0, 210.0)), Some(a));
    }

    #[test]
    fn move_and_delete_selection() {
        let mut editor = Editor::default();
        let a = editor.blocks_mut().create_block(&move_type(), None).unwrap();
        let b = editor.blocks_mut().create_block(&move_type(), None).unwrap();
        editor.canvas_mut().set_viewport_zoom(2.0).unwrap();
        editor.canvas_mut().select_blocks([a, b]);

        editor.move_selected(20.0, -10.0).unwrap();
        assert_eq!(editor.blocks().get_block(a).unwrap().position, Position::new(10.0, -5.0));
        assert_eq!(editor.blocks().get_block(b).unwrap().position, Position::new(10.0, -5.0));

        assert_eq!(editor.delete_selected(), vec![a, b]);
        assert_eq!(editor.blocks().block_count(), 0);
        assert!(editor.canvas().selected_ids().is_empty());
    }

    #[test]
    fn queued_operations_flush_on_poll() {
        let mut editor = Editor::default();
        let a = editor.blocks_mut().create_block(&move_type(), None).unwrap();
        editor.queue(Operation::new(Domain::Block, move |state: &mut EditorState| {
            state.blocks.update_block(a, &BlockPatch::position(1.0, 1.0))?;
            Ok(())
        }));
        assert_eq!(editor.pending_operations(), 1);
        assert!(editor.poll(Instant::now() + std::time::Duration::from_secs(1)));
        assert_eq!(editor.blocks().get_block(a).unwrap().position, Position::new(1.0, 1.0));
        assert_eq!(editor.batch_stats().flush_count, 1);
    }
}
