//! Integration tests: a drag-and-drop session end to end.

use bw_core::model::*;
use bw_core::{BlockEvent, ProjectFile};
use bw_editor::{Editor, EditorConfig};
use bw_render::ContainerSize;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

const CONTAINER: ContainerSize = ContainerSize::new(1024.0, 768.0);

fn palette() -> (BlockType, BlockType, BlockType) {
    let flag = BlockType::new("t_flag", "when flag clicked", BlockKind::Flag)
        .with_size(Size::new(160.0, 50.0));
    let repeat = BlockType::new("t_repeat", "repeat", BlockKind::Loop)
        .with_content([ContentItem::text("label", "repeat"), ContentItem::value("times", "10")])
        .with_size(Size::new(160.0, 80.0));
    let step = BlockType::new("t_move", "move", BlockKind::Move)
        .with_content([ContentItem::value("steps", "10")])
        .with_size(Size::new(140.0, 40.0));
    (flag, repeat, step)
}

#[test]
fn build_program_by_dragging() {
    let mut editor = Editor::new(EditorConfig::default());
    let (flag_t, repeat_t, step_t) = palette();

    let events = Rc::new(RefCell::new(0usize));
    let counter = events.clone();
    editor.blocks_mut().subscribe(move |e| {
        if matches!(e, BlockEvent::Connected { .. }) {
            *counter.borrow_mut() += 1;
        }
    });

    let flag = editor.blocks_mut().create_block(&flag_t, Some(Position::new(40.0, 40.0))).unwrap();
    let repeat = editor.blocks_mut().create_block(&repeat_t, Some(Position::new(40.0, 90.0))).unwrap();
    let s1 = editor.blocks_mut().create_block(&step_t, Some(Position::new(300.0, 300.0))).unwrap();
    let s2 = editor.blocks_mut().create_block(&step_t, Some(Position::new(300.0, 360.0))).unwrap();

    // Drag s1 into the loop: while dragging it is not part of the visible set.
    editor.canvas_mut().begin_drag(s1);
    assert!(!editor.refresh_visibility(CONTAINER).contains(&s1));
    editor
        .batch_update(move |s| {
            s.blocks.update_block(s1, &BlockPatch::position(60.0, 130.0))?;
            s.blocks.connect_blocks(repeat, s1)?;
            Ok(())
        })
        .unwrap();
    editor.canvas_mut().end_drag();

    editor.blocks_mut().connect_blocks(flag, repeat).unwrap();
    editor.blocks_mut().connect_blocks(repeat, s2).unwrap();

    let store = editor.blocks();
    assert_eq!(store.chain_from(flag), vec![flag, repeat]);
    assert_eq!(store.loop_children(repeat), vec![s1, s2]);
    assert!(store.check_integrity().is_empty());
    assert_eq!(*events.borrow(), 3);

    let visible = editor.refresh_visibility(CONTAINER);
    assert_eq!(visible, vec![flag, repeat, s1, s2]);
}

#[test]
fn pan_far_away_culls_everything() {
    let mut editor = Editor::default();
    let (_, _, step_t) = palette();
    for i in 0..20 {
        editor
            .blocks_mut()
            .create_block(&step_t, Some(Position::new(i as f64 * 50.0, 0.0)))
            .unwrap();
    }
    editor.canvas_mut().move_viewport(-100_000.0, 0.0).unwrap();
    assert!(editor.refresh_visibility(CONTAINER).is_empty());
    assert_eq!(editor.cull_stats().culling_efficiency, 1.0);

    editor.canvas_mut().reset_viewport();
    assert_eq!(editor.refresh_visibility(CONTAINER).len(), 20);
}

#[test]
fn project_roundtrip_through_editor() {
    let mut editor = Editor::default();
    let (flag_t, _, step_t) = palette();
    let flag = editor.blocks_mut().create_block(&flag_t, None).unwrap();
    let step = editor.blocks_mut().create_block(&step_t, None).unwrap();
    editor.blocks_mut().connect_blocks(flag, step).unwrap();

    let json = editor
        .blocks()
        .export_project("demo", "2024-01-01T00:00:00Z")
        .to_json_string()
        .unwrap();

    let file = ProjectFile::from_json_str(&json).unwrap();
    let config = EditorConfig::from_value(&file.config).unwrap();
    let mut reopened = Editor::new(config);
    let issues = reopened.blocks_mut().import_project(&file).unwrap();
    assert!(issues.is_empty());
    assert_eq!(reopened.blocks().chain_from(flag), vec![flag, step]);
}
