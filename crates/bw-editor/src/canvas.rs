//! Canvas state: viewport, selection, marquee, pointer interaction and
//! render bookkeeping.
//!
//! Mouse positions and the selection box are in screen space. Block
//! positions are in canvas space; `Viewport` converts between the two.

use bw_core::event::{SubscriptionId, Subscribers};
use bw_core::id::BlockId;
use bw_core::model::Position;
use bw_render::Viewport;
use indexmap::IndexSet;
use kurbo::{Point, Rect};
use serde::Serialize;
use std::time::Duration;

/// Zoom bounds enforced by `zoom_at`. `set_viewport_zoom` only requires
/// a positive zoom.
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanvasStateError {
    #[error("viewport {field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("zoom must be greater than zero, got {zoom}")]
    InvalidZoom { zoom: f64 },
    #[error("no selection box in progress")]
    NoSelectionBox,
}

impl CanvasStateError {
    pub fn code(&self) -> &'static str {
        match self {
            CanvasStateError::NonFinite { .. } => "NON_FINITE",
            CanvasStateError::InvalidZoom { .. } => "INVALID_ZOOM",
            CanvasStateError::NoSelectionBox => "NO_SELECTION_BOX",
        }
    }

    pub fn context(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Events emitted by `CanvasStore`.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    ViewportChanged(Viewport),
    SelectionChanged,
    SelectionBoxChanged,
    InteractionChanged,
    RenderRecorded { visible: usize },
    Restored,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectionBox {
    pub start: Position,
    pub current: Position,
}

impl SelectionBox {
    /// Normalized rectangle regardless of drag direction.
    pub fn rect(&self) -> Rect {
        Rect::from_points(
            Point::new(self.start.x, self.start.y),
            Point::new(self.current.x, self.current.y),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub is_dragging: bool,
    pub dragged_block: Option<BlockId>,
    pub is_selecting: bool,
    pub last_mouse: Option<Position>,
    pub hovered_block: Option<BlockId>,
}

/// Written by whoever runs the visibility pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPerformance {
    pub visible_block_ids: Vec<BlockId>,
    pub render_count: u64,
    pub last_render_duration: Option<Duration>,
}

/// The complete canvas state. Also the snapshot type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    pub viewport: Viewport,
    pub selected: IndexSet<BlockId>,
    pub last_selected: Option<BlockId>,
    pub selection_box: Option<SelectionBox>,
    pub interaction: Interaction,
    pub performance: RenderPerformance,
}

#[derive(Debug, Clone, Default)]
pub struct CanvasStore {
    state: CanvasState,
    subscribers: Subscribers<CanvasEvent>,
}

fn finite(field: &'static str, value: f64) -> Result<f64, CanvasStateError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CanvasStateError::NonFinite { field, value })
    }
}

fn valid_zoom(zoom: f64) -> Result<f64, CanvasStateError> {
    finite("zoom", zoom)?;
    if zoom <= 0.0 {
        return Err(CanvasStateError::InvalidZoom { zoom });
    }
    Ok(zoom)
}

impl CanvasStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&CanvasEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn emit(&self, event: CanvasEvent) {
        self.subscribers.emit(&event);
    }

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), CanvasStateError> {
        finite("x", viewport.x)?;
        finite("y", viewport.y)?;
        valid_zoom(viewport.zoom)?;
        self.state.viewport = viewport;
        self.emit(CanvasEvent::ViewportChanged(viewport));
        Ok(())
    }

    /// Change zoom only; pan offset is kept.
    pub fn set_viewport_zoom(&mut self, zoom: f64) -> Result<(), CanvasStateError> {
        let zoom = valid_zoom(zoom)?;
        self.state.viewport.zoom = zoom;
        self.emit(CanvasEvent::ViewportChanged(self.state.viewport));
        Ok(())
    }

    /// Pan by a screen-space delta.
    pub fn move_viewport(&mut self, dx: f64, dy: f64) -> Result<(), CanvasStateError> {
        let x = finite("x", self.state.viewport.x + dx)?;
        let y = finite("y", self.state.viewport.y + dy)?;
        self.state.viewport.x = x;
        self.state.viewport.y = y;
        self.emit(CanvasEvent::ViewportChanged(self.state.viewport));
        Ok(())
    }

    pub fn reset_viewport(&mut self) {
        self.state.viewport = Viewport::default();
        self.emit(CanvasEvent::ViewportChanged(self.state.viewport));
    }

    /// Multiply zoom by `factor`, keeping the canvas point under the
    /// screen-space `anchor` fixed. Zoom is clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn zoom_at(&mut self, factor: f64, anchor: Position) -> Result<(), CanvasStateError> {
        let factor = valid_zoom(factor)?;
        let vp = self.state.viewport;
        let zoom = (vp.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let pinned = vp.screen_to_canvas(Point::new(anchor.x, anchor.y));
        self.set_viewport(Viewport::new(
            anchor.x - pinned.x * zoom,
            anchor.y - pinned.y * zoom,
            zoom,
        ))
    }

    pub fn screen_to_canvas(&self, p: Position) -> Position {
        let c = self.state.viewport.screen_to_canvas(Point::new(p.x, p.y));
        Position::new(c.x, c.y)
    }

    pub fn canvas_to_screen(&self, p: Position) -> Position {
        let s = self.state.viewport.canvas_to_screen(Point::new(p.x, p.y));
        Position::new(s.x, s.y)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Single mode replaces the selection; multi mode toggles `id`.
    pub fn select_block(&mut self, id: BlockId, multi: bool) {
        if !multi {
            self.state.selected.clear();
            self.state.selected.insert(id);
            self.state.last_selected = Some(id);
        } else if self.state.selected.shift_remove(&id) {
            if self.state.last_selected == Some(id) {
                self.state.last_selected = self.state.selected.last().copied();
            }
        } else {
            self.state.selected.insert(id);
            self.state.last_selected = Some(id);
        }
        self.emit(CanvasEvent::SelectionChanged);
    }

    /// Replace the selection.
    pub fn select_blocks(&mut self, ids: impl IntoIterator<Item = BlockId>) {
        self.state.selected = ids.into_iter().collect();
        self.state.last_selected = self.state.selected.last().copied();
        self.emit(CanvasEvent::SelectionChanged);
    }

    pub fn deselect_block(&mut self, id: BlockId) {
        if !self.state.selected.shift_remove(&id) {
            return;
        }
        if self.state.last_selected == Some(id) {
            self.state.last_selected = self.state.selected.last().copied();
        }
        self.emit(CanvasEvent::SelectionChanged);
    }

    pub fn clear_selection(&mut self) {
        self.state.selected.clear();
        self.state.last_selected = None;
        self.emit(CanvasEvent::SelectionChanged);
    }

    pub fn is_selected(&self, id: BlockId) -> bool {
        self.state.selected.contains(&id)
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> Vec<BlockId> {
        self.state.selected.iter().copied().collect()
    }

    pub fn last_selected(&self) -> Option<BlockId> {
        self.state.last_selected
    }

    // ─── Selection box ───────────────────────────────────────────────────

    pub fn start_selection_box(&mut self, at: Position) {
        self.state.selection_box = Some(SelectionBox {
            start: at,
            current: at,
        });
        self.state.interaction.is_selecting = true;
        self.emit(CanvasEvent::SelectionBoxChanged);
    }

    pub fn update_selection_box(&mut self, at: Position) -> Result<(), CanvasStateError> {
        let sel = self
            .state
            .selection_box
            .as_mut()
            .ok_or(CanvasStateError::NoSelectionBox)?;
        sel.current = at;
        self.emit(CanvasEvent::SelectionBoxChanged);
        Ok(())
    }

    pub fn selection_box(&self) -> Option<SelectionBox> {
        self.state.selection_box
    }

    /// Close the marquee and return its normalized screen rectangle.
    pub fn end_selection_box(&mut self) -> Option<Rect> {
        let sel = self.state.selection_box.take()?;
        self.state.interaction.is_selecting = false;
        self.emit(CanvasEvent::SelectionBoxChanged);
        Some(sel.rect())
    }

    // ─── Interaction ─────────────────────────────────────────────────────

    pub fn interaction(&self) -> &Interaction {
        &self.state.interaction
    }

    pub fn begin_drag(&mut self, id: BlockId) {
        self.state.interaction.is_dragging = true;
        self.state.interaction.dragged_block = Some(id);
        self.emit(CanvasEvent::InteractionChanged);
    }

    pub fn end_drag(&mut self) {
        self.state.interaction.is_dragging = false;
        self.state.interaction.dragged_block = None;
        self.emit(CanvasEvent::InteractionChanged);
    }

    /// Record the pointer position and return the delta since the last one.
    pub fn set_mouse_position(&mut self, at: Position) -> Option<(f64, f64)> {
        let delta = self
            .state
            .interaction
            .last_mouse
            .map(|last| (at.x - last.x, at.y - last.y));
        self.state.interaction.last_mouse = Some(at);
        delta
    }

    pub fn set_hovered_block(&mut self, id: Option<BlockId>) {
        if self.state.interaction.hovered_block != id {
            self.state.interaction.hovered_block = id;
            self.emit(CanvasEvent::InteractionChanged);
        }
    }

    // ─── Performance ─────────────────────────────────────────────────────

    pub fn record_render(&mut self, visible: Vec<BlockId>, duration: Option<Duration>) {
        let count = visible.len();
        let perf = &mut self.state.performance;
        perf.visible_block_ids = visible;
        perf.render_count += 1;
        perf.last_render_duration = duration;
        self.emit(CanvasEvent::RenderRecorded { visible: count });
    }

    pub fn performance(&self) -> &RenderPerformance {
        &self.state.performance
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> CanvasState {
        self.state.clone()
    }

    pub fn restore(&mut self, state: CanvasState) {
        self.state = state;
        self.emit(CanvasEvent::Restored);
    }
}
