//! Integration tests: link invariants survive arbitrary mutation sequences.
//!
//! proptest generates sequences of create / connect / disconnect / delete
//! calls against one store. After every call the store must pass
//! `check_integrity` and contain no cycle.

use bw_core::model::*;
use bw_core::{BlockId, BlockStore, RelationshipError};
use proptest::prelude::*;
use std::collections::HashSet;

const KINDS: [BlockKind; 3] = [BlockKind::Works, BlockKind::Move, BlockKind::Loop];

/// One store call. Indices pick among the live blocks, modulo their count.
#[derive(Clone, Debug)]
enum Op {
    Create(usize),
    Connect(usize, usize),
    Disconnect(usize, usize),
    Delete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => (0..KINDS.len()).prop_map(Op::Create),
        6 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Connect(a, b)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Disconnect(a, b)),
        1 => any::<usize>().prop_map(Op::Delete),
    ]
}

fn create(store: &mut BlockStore, kind: BlockKind) -> BlockId {
    let ty = BlockType::new("t", "node", kind);
    store
        .create_block(&ty, None)
        .unwrap_or_else(|e| panic!("create failed: {e}"))
}

fn assert_acyclic(store: &BlockStore) {
    for start in store.blocks() {
        let mut stack = vec![start.id];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(b) = store.get_block(id) else {
                continue;
            };
            for next in [b.child_id, b.loop_first_child_id].into_iter().flatten() {
                assert_ne!(next, start.id, "cycle back to {}", start.id);
                stack.push(next);
            }
        }
    }
}

fn assert_consistent(store: &BlockStore, step: usize, op: &Op) {
    let issues = store.check_integrity();
    assert!(issues.is_empty(), "step {step} ({op:?}): {issues:#?}");
    assert_acyclic(store);
}

fn pick(ids: &[BlockId], i: usize) -> BlockId {
    ids[i % ids.len()]
}

fn apply(store: &mut BlockStore, ids: &mut Vec<BlockId>, op: &Op, step: usize) {
    if ids.is_empty() {
        ids.push(create(store, BlockKind::Loop));
    }
    match *op {
        Op::Create(k) => ids.push(create(store, KINDS[k])),
        Op::Connect(a, b) => {
            let (a, b) = (pick(ids, a), pick(ids, b));
            let before = store.snapshot();
            match store.connect_blocks(a, b) {
                Ok(()) => {
                    let parent = store.get_block(a).map(|p| p.is_loop());
                    let child = store.get_block(b).and_then(|c| c.parent_id);
                    assert_eq!(child, Some(a), "step {step}: child must point at its parent");
                    if parent == Some(false) {
                        let link = store.get_block(a).and_then(|p| p.child_id);
                        assert_eq!(link, Some(b), "step {step}: parent must point at its child");
                    }
                }
                Err(RelationshipError::SelfConnection { .. } | RelationshipError::Cycle { .. }) => {
                    assert_eq!(store.snapshot(), before, "step {step}: failed connect mutated");
                }
                Err(other) => panic!("step {step}: unexpected {other}"),
            }
        }
        Op::Disconnect(a, b) => store.disconnect_blocks(pick(ids, a), pick(ids, b)),
        Op::Delete(a) => {
            let a = pick(ids, a);
            store.delete_block(a);
            ids.retain(|&id| id != a);
            for other in store.blocks() {
                assert_ne!(other.parent_id, Some(a));
                assert_ne!(other.child_id, Some(a));
                assert_ne!(other.loop_first_child_id, Some(a));
                assert_ne!(other.loop_last_child_id, Some(a));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn mutations_keep_links_consistent(
        seed in prop::collection::vec(0..KINDS.len(), 1..8),
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let mut store = BlockStore::new();
        let mut ids: Vec<BlockId> = seed.iter().map(|&k| create(&mut store, KINDS[k])).collect();
        for (step, op) in ops.iter().enumerate() {
            apply(&mut store, &mut ids, op, step);
            assert_consistent(&store, step, op);
        }
        prop_assert_eq!(store.block_count(), ids.len());
    }
}

#[test]
fn connecting_to_loop_member_links_both_ends() {
    let mut store = BlockStore::new();
    let lp = create(&mut store, BlockKind::Loop);
    let a = create(&mut store, BlockKind::Move);
    let x = create(&mut store, BlockKind::Move);
    store.connect_blocks(lp, a).unwrap();
    store.connect_blocks(a, x).unwrap();

    assert_eq!(store.get_block(a).unwrap().child_id, Some(x));
    assert_eq!(store.get_block(x).unwrap().parent_id, Some(a));
    assert_eq!(store.loop_children(lp), vec![a, x]);
    assert!(store.check_integrity().is_empty());
}

#[test]
fn every_block_has_at_most_one_parent() {
    let mut store = BlockStore::new();
    let ty = BlockType::new("t", "node", BlockKind::Works);
    let lp = BlockType::new("t_loop", "loop", BlockKind::Loop);
    let p1 = store.create_block(&ty, None).unwrap();
    let p2 = store.create_block(&lp, None).unwrap();
    let c = store.create_block(&ty, None).unwrap();

    store.connect_blocks(p1, c).unwrap();
    store.connect_blocks(p2, c).unwrap();

    let referencing: Vec<BlockId> = store
        .blocks()
        .filter(|b| {
            b.child_id == Some(c) || b.loop_first_child_id == Some(c) || b.loop_last_child_id == Some(c)
        })
        .map(|b| b.id)
        .collect();
    assert_eq!(referencing, vec![p2]);
    assert_eq!(store.get_block(c).unwrap().parent_id, Some(p2));
    assert!(store.check_integrity().is_empty());
}
