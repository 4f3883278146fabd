//! Property tests: the forest invariant holds after every dispatched action

use proptest::prelude::*;
use qedit_core::{
    Action, Coding, Dispatcher, ItemProperty, ItemType, Outcome, Parent, PropertyValue, SequentialIds,
    Tree,
};

#[derive(Debug, Clone)]
enum Op {
    Add { parent: usize, index: usize },
    Delete { target: usize },
    Move { target: usize, parent: usize, index: usize },
    Duplicate { target: usize },
    SetType { target: usize, item_type: usize },
    SetCodes { target: usize, ids: Vec<Option<u8>> },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..16, 0usize..8).prop_map(|(parent, index)| Op::Add { parent, index }),
        1 => (0usize..16).prop_map(|target| Op::Delete { target }),
        2 => (0usize..16, 0usize..16, 0usize..8)
            .prop_map(|(target, parent, index)| Op::Move { target, parent, index }),
        1 => (0usize..16).prop_map(|target| Op::Duplicate { target }),
        1 => (0usize..16, 0usize..ItemType::ALL.len())
            .prop_map(|(target, item_type)| Op::SetType { target, item_type }),
        1 => (0usize..16, prop::collection::vec(prop::option::of(0u8..3), 0..5))
            .prop_map(|(target, ids)| Op::SetCodes { target, ids }),
    ]
}

/// Current link ids in document order
fn ids(tree: &Tree) -> Vec<String> {
    tree.walk().map(String::from).collect()
}

fn pick(ids: &[String], n: usize) -> Option<String> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[n % ids.len()].clone())
    }
}

/// 0 is the root, anything else an existing item
fn pick_parent(ids: &[String], n: usize) -> Parent {
    match n {
        0 => Parent::Root,
        _ => pick(ids, n - 1).map_or(Parent::Root, Parent::Item),
    }
}

fn to_action(tree: &Tree, op: &Op) -> Option<Action> {
    let ids = ids(tree);
    Some(match *op {
        Op::Add { parent, index } => Action::AddItem {
            parent: pick_parent(&ids, parent),
            index,
        },
        Op::Delete { target } => Action::DeleteItem {
            link_id: pick(&ids, target)?,
        },
        Op::Move {
            target,
            parent,
            index,
        } => Action::MoveItem {
            link_id: pick(&ids, target)?,
            new_parent: pick_parent(&ids, parent),
            new_index: index,
        },
        Op::Duplicate { target } => Action::DuplicateItem {
            link_id: pick(&ids, target)?,
        },
        Op::SetType { target, item_type } => Action::UpdateItemProperty {
            link_id: pick(&ids, target)?,
            property: ItemProperty::Type,
            value: PropertyValue::Type(ItemType::ALL[item_type]),
        },
        Op::SetCodes {
            target,
            ids: ref coding_ids,
        } => Action::SetItemCodes {
            link_id: pick(&ids, target)?,
            codes: coding_ids
                .iter()
                .enumerate()
                .map(|(n, id)| {
                    let mut coding = Coding::new("http://example.org", n.to_string(), "");
                    coding.id = id.map(|id| format!("c{id}"));
                    coding
                })
                .collect(),
        },
    })
}

fn dispatcher() -> Dispatcher {
    Dispatcher::with_ids(Tree::new(), Box::new(SequentialIds::new("p")))
        .with_default_item_type(ItemType::Group)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn forest_invariant_holds_after_every_action(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut d = dispatcher();
        for op in &ops {
            let Some(action) = to_action(d.tree(), op) else { continue };
            let before = d.tree().clone();
            let outcome = d.dispatch(action);

            prop_assert!(d.tree().check_invariants().is_ok());
            prop_assert_eq!(d.tree().walk().count(), d.tree().len());
            if let Outcome::Rejected(_) = outcome {
                prop_assert_eq!(d.tree(), &before);
            }
        }
    }

    #[test]
    fn delete_removes_every_descendant(
        ops in prop::collection::vec(op_strategy(), 1..30),
        victim in 0usize..16,
    ) {
        let mut d = dispatcher();
        for op in &ops {
            if let Some(action) = to_action(d.tree(), op) {
                d.dispatch(action);
            }
        }

        let ids = ids(d.tree());
        let Some(target) = pick(&ids, victim) else { return Ok(()) };
        let doomed: Vec<String> = d.tree().descendants(&target).map(String::from).collect();

        let outcome = d.dispatch(Action::DeleteItem { link_id: target.clone() });
        prop_assert!(outcome.is_applied());
        prop_assert!(d.tree().item(&target).is_none());
        for id in &doomed {
            prop_assert!(d.tree().item(id).is_none());
            prop_assert!(d.tree().parent(id).is_none());
        }
    }
}
