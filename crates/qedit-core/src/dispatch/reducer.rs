//! The pure transition function
//!
//! `reduce` never touches its input. It applies the action to a clone,
//! re-checks the forest invariants and hands back either the new tree or a
//! rejection. A rejected action leaves nothing behind.

use super::action::{Action, CodingProperty, ItemProperty, PropertyValue};
use crate::model::extension;
use crate::model::value::non_empty;
use crate::model::{
    Coding, IdGenerator, InvariantViolation, Item, ItemType, Parent, TranslatableProperty,
    Translation, Tree,
};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Why an action was refused
///
/// Rejections are structural no-ops: the tree is unchanged and editing
/// continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("no item with linkId '{0}'")]
    UnknownItem(String),

    #[error("parent '{0}' does not exist")]
    UnknownParent(Parent),

    #[error("item '{0}' is a display item and cannot have children")]
    ChildlessParent(String),

    #[error("cannot move '{link_id}' into its own subtree ('{target}')")]
    CyclicMove { link_id: String, target: String },

    #[error("{property}: {reason}")]
    PropertyMismatch { property: String, reason: String },

    #[error("index {index} out of range for '{link_id}' (length {len})")]
    IndexOutOfRange {
        link_id: String,
        index: usize,
        len: usize,
    },

    #[error("language '{0}' is not configured")]
    UnknownLanguage(String),

    #[error("language '{0}' is already present")]
    DuplicateLanguage(String),

    #[error("transition would break the tree: {0}")]
    InvariantBroken(#[from] InvariantViolation),
}

/// Result of one transition
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The action produced a new state
    Applied {
        tree: Tree,
        /// Link id of the item the action created, if any
        created: Option<String>,
    },
    /// `Save`: no structural effect
    Checkpoint,
    Rejected(Rejection),
}

/// Inputs to a transition besides the tree and the action
pub struct ReduceContext<'a> {
    pub ids: &'a mut dyn IdGenerator,
    /// Type given to items created by `AddItem`
    pub default_item_type: ItemType,
}

type Applied = Result<Option<String>, Rejection>;

/// Apply one action to a snapshot
pub fn reduce(tree: &Tree, action: Action, ctx: &mut ReduceContext<'_>) -> Transition {
    if matches!(action, Action::Save) {
        return Transition::Checkpoint;
    }

    let mut next = tree.clone();
    let created = match apply(&mut next, action, ctx) {
        Ok(created) => created,
        Err(rejection) => return Transition::Rejected(rejection),
    };

    match next.check_invariants() {
        Ok(()) => Transition::Applied {
            tree: next,
            created,
        },
        Err(violation) => Transition::Rejected(violation.into()),
    }
}

fn apply(tree: &mut Tree, action: Action, ctx: &mut ReduceContext<'_>) -> Applied {
    match action {
        Action::AddItem { parent, index } => add_item(tree, parent, index, ctx),
        Action::DeleteItem { link_id } => {
            if tree.remove_subtree(&link_id).is_empty() {
                return Err(Rejection::UnknownItem(link_id));
            }
            Ok(None)
        }
        Action::MoveItem {
            link_id,
            new_parent,
            new_index,
        } => move_item(tree, link_id, new_parent, new_index),
        Action::DuplicateItem { link_id } => duplicate_item(tree, &link_id, ctx.ids),
        Action::UpdateItemProperty {
            link_id,
            property,
            value,
        } => update_property(tree, &link_id, property, value),

        Action::SetItemCodes { link_id, mut codes } => {
            assign_coding_ids(&mut codes, ctx.ids);
            let item = item_mut(tree, &link_id)?;
            item.code = codes;
            let kept: HashSet<String> = item.code.iter().filter_map(|c| c.id.clone()).collect();
            prune_code_translations(tree, &link_id, &kept);
            Ok(None)
        }
        Action::UpdateItemCodeProperty {
            link_id,
            index,
            property,
            value,
        } => {
            let item = item_mut(tree, &link_id)?;
            let len = item.code.len();
            if index >= len {
                return Err(Rejection::IndexOutOfRange {
                    link_id,
                    index,
                    len,
                });
            }
            let value = non_empty(value);
            let needs_id = item.code[index].id.is_none();
            if needs_id {
                let id = fresh_coding_id(&item.code, ctx.ids);
                item.code[index].id = Some(id);
            }
            let coding = &mut item.code[index];
            match property {
                CodingProperty::System => coding.system = value,
                CodingProperty::Code => coding.code = value,
                CodingProperty::Display => coding.display = value,
                CodingProperty::Version => coding.version = value,
            }
            Ok(None)
        }
        Action::DeleteItemCode { link_id, index } => {
            let item = item_mut(tree, &link_id)?;
            let len = item.code.len();
            if index >= len {
                return Err(Rejection::IndexOutOfRange {
                    link_id,
                    index,
                    len,
                });
            }
            let removed = item.code.remove(index);
            if let Some(id) = removed.id {
                clear_translation(tree, &link_id, &TranslatableProperty::CodeDisplay(id));
            }
            Ok(None)
        }

        Action::SetItemExtension {
            link_id,
            extension: ext,
        } => {
            let item = item_mut(tree, &link_id)?;
            *item = extension::set(item, ext);
            Ok(None)
        }
        Action::RemoveItemExtension { link_id, url } => {
            let item = item_mut(tree, &link_id)?;
            *item = extension::remove(item, &url);
            clear_translation(tree, &link_id, &TranslatableProperty::ExtensionText(url));
            Ok(None)
        }

        Action::SetEnableWhen {
            link_id,
            conditions,
        } => {
            item_mut(tree, &link_id)?.enable_when = conditions;
            Ok(None)
        }
        Action::AddEnableWhen { link_id, condition } => {
            item_mut(tree, &link_id)?.enable_when.push(condition);
            Ok(None)
        }
        Action::UpdateEnableWhen {
            link_id,
            index,
            condition,
        } => {
            let item = item_mut(tree, &link_id)?;
            let len = item.enable_when.len();
            match item.enable_when.get_mut(index) {
                Some(slot) => {
                    *slot = condition;
                    Ok(None)
                }
                None => Err(Rejection::IndexOutOfRange {
                    link_id,
                    index,
                    len,
                }),
            }
        }
        Action::DeleteEnableWhen { link_id, index } => {
            let item = item_mut(tree, &link_id)?;
            let len = item.enable_when.len();
            if index >= len {
                return Err(Rejection::IndexOutOfRange {
                    link_id,
                    index,
                    len,
                });
            }
            item.enable_when.remove(index);
            Ok(None)
        }
        Action::SetEnableBehavior { link_id, behavior } => {
            item_mut(tree, &link_id)?.enable_behavior = behavior;
            Ok(None)
        }

        Action::SetAnswerOptions { link_id, options } => {
            let count = options.len();
            item_mut(tree, &link_id)?.answer_options = options;
            prune_answer_translations(tree, &link_id, count);
            Ok(None)
        }

        Action::SetMetadata { field, value } => {
            tree.metadata.set(field, value);
            Ok(None)
        }
        Action::AddLanguage { language } => {
            let language = language.trim().to_string();
            if language.is_empty() {
                return Err(Rejection::PropertyMismatch {
                    property: "language".into(),
                    reason: "language code is empty".into(),
                });
            }
            if tree.languages().contains_key(&language)
                || tree.metadata.language.as_deref() == Some(language.as_str())
            {
                return Err(Rejection::DuplicateLanguage(language));
            }
            tree.languages_mut().insert(language, Translation::new());
            Ok(None)
        }
        Action::RemoveLanguage { language } => {
            if tree.languages_mut().shift_remove(&language).is_none() {
                return Err(Rejection::UnknownLanguage(language));
            }
            Ok(None)
        }
        Action::UpdateTranslation {
            language,
            link_id,
            property,
            value,
        } => {
            if !tree.contains(&link_id) {
                return Err(Rejection::UnknownItem(link_id));
            }
            translation_mut(tree, language)?.set(&link_id, property, value);
            Ok(None)
        }
        Action::UpdateMetadataTranslation {
            language,
            field,
            value,
        } => {
            if !field.is_translatable() {
                return Err(Rejection::PropertyMismatch {
                    property: field.name().into(),
                    reason: "field is not translatable".into(),
                });
            }
            translation_mut(tree, language)?.set_metadata(field, value);
            Ok(None)
        }
        Action::ReplaceDocument { tree: replacement } => {
            *tree = *replacement;
            Ok(None)
        }
        Action::Save => Ok(None),
    }
}

fn item_mut<'a>(tree: &'a mut Tree, link_id: &str) -> Result<&'a mut Item, Rejection> {
    tree.item_mut(link_id)
        .ok_or_else(|| Rejection::UnknownItem(link_id.to_string()))
}

fn translation_mut(tree: &mut Tree, language: String) -> Result<&mut Translation, Rejection> {
    match tree.languages_mut().get_mut(&language) {
        Some(translation) => Ok(translation),
        None => Err(Rejection::UnknownLanguage(language)),
    }
}

/// Items that can receive children under `parent`
fn check_parent(tree: &Tree, parent: &Parent) -> Result<(), Rejection> {
    if tree.child_list(parent).is_none() {
        return Err(Rejection::UnknownParent(parent.clone()));
    }
    if let Parent::Item(id) = parent
        && let Some(owner) = tree.item(id)
        && !owner.item_type.can_have_children()
    {
        return Err(Rejection::ChildlessParent(id.clone()));
    }
    Ok(())
}

/// Draw ids until one is not taken
fn fresh_link_id(tree: &Tree, ids: &mut dyn IdGenerator, reserved: &HashMap<String, String>) -> String {
    loop {
        let id = ids.next_id();
        if !tree.contains(&id) && !reserved.values().any(|taken| taken == &id) {
            return id;
        }
    }
}

fn fresh_coding_id(codes: &[Coding], ids: &mut dyn IdGenerator) -> String {
    loop {
        let id = ids.next_id();
        if !codes.iter().any(|c| c.id.as_deref() == Some(id.as_str())) {
            return id;
        }
    }
}

/// Give a fresh id to every coding that has none or repeats an earlier one
pub(crate) fn assign_coding_ids(codes: &mut [Coding], ids: &mut dyn IdGenerator) {
    for index in 0..codes.len() {
        let reusable = codes[index].id.as_deref().is_some_and(|id| {
            !codes[..index]
                .iter()
                .any(|earlier| earlier.id.as_deref() == Some(id))
        });
        if !reusable {
            let id = fresh_coding_id(codes, ids);
            codes[index].id = Some(id);
        }
    }
}

fn add_item(tree: &mut Tree, parent: Parent, index: usize, ctx: &mut ReduceContext<'_>) -> Applied {
    check_parent(tree, &parent)?;
    let link_id = fresh_link_id(tree, ctx.ids, &HashMap::new());
    tree.insert(&parent, index, Item::new(link_id.clone(), ctx.default_item_type));
    Ok(Some(link_id))
}

fn move_item(tree: &mut Tree, link_id: String, new_parent: Parent, new_index: usize) -> Applied {
    if !tree.contains(&link_id) {
        return Err(Rejection::UnknownItem(link_id));
    }
    check_parent(tree, &new_parent)?;
    if let Parent::Item(target) = &new_parent
        && (target == &link_id || tree.is_descendant(target, &link_id))
    {
        return Err(Rejection::CyclicMove {
            link_id,
            target: target.clone(),
        });
    }
    tree.detach(&link_id);
    tree.attach(&new_parent, new_index, link_id);
    Ok(None)
}

fn duplicate_item(tree: &mut Tree, link_id: &str, ids: &mut dyn IdGenerator) -> Applied {
    let (parent, index) = tree
        .position(link_id)
        .ok_or_else(|| Rejection::UnknownItem(link_id.to_string()))?;

    let mut subtree = vec![link_id.to_string()];
    subtree.extend(tree.descendants(link_id).map(String::from));

    let mut mapping: HashMap<String, String> = HashMap::with_capacity(subtree.len());
    for old in &subtree {
        let new = fresh_link_id(tree, ids, &mapping);
        mapping.insert(old.clone(), new);
    }

    // Pre-order guarantees a parent copy exists before its children, and
    // appending siblings in walk order keeps their relative order.
    for old in &subtree {
        let Some(original) = tree.item(old) else {
            continue;
        };
        let mut copy = original.clone();
        copy.link_id = mapping[old].clone();
        for condition in &mut copy.enable_when {
            if let Some(remapped) = mapping.get(&condition.question) {
                condition.question = remapped.clone();
            }
        }

        if old == link_id {
            tree.insert(&parent, index + 1, copy);
        } else {
            let owner = tree
                .parent(old)
                .and_then(|p| p.link_id().map(|id| mapping[id].clone()))
                .ok_or_else(|| Rejection::UnknownItem(old.clone()))?;
            let target = Parent::Item(owner);
            let end = tree.child_list(&target).map_or(0, <[String]>::len);
            tree.insert(&target, end, copy);
        }
    }

    for translation in tree.languages_mut().values_mut() {
        for (old, new) in &mapping {
            translation.copy_item(old, new);
        }
    }

    Ok(Some(mapping[link_id].clone()))
}

fn update_property(
    tree: &mut Tree,
    link_id: &str,
    property: ItemProperty,
    value: PropertyValue,
) -> Applied {
    let has_children = !tree.children(link_id).is_empty();
    let item = item_mut(tree, link_id)?;
    let mismatch = |expected: &str| Rejection::PropertyMismatch {
        property: property.to_string(),
        reason: format!("expected {expected}"),
    };

    match property {
        ItemProperty::Text | ItemProperty::Prefix | ItemProperty::Definition => {
            let slot = match property {
                ItemProperty::Text => &mut item.text,
                ItemProperty::Prefix => &mut item.prefix,
                _ => &mut item.definition,
            };
            *slot = match value {
                PropertyValue::Text(text) => non_empty(text),
                PropertyValue::Unset => None,
                _ => return Err(mismatch("text")),
            };
        }
        ItemProperty::Required | ItemProperty::Repeats | ItemProperty::ReadOnly => {
            let slot = match property {
                ItemProperty::Required => &mut item.required,
                ItemProperty::Repeats => &mut item.repeats,
                _ => &mut item.read_only,
            };
            *slot = match value {
                PropertyValue::Flag(flag) => Some(flag),
                PropertyValue::Unset => None,
                _ => return Err(mismatch("a boolean")),
            };
        }
        ItemProperty::MaxLength => {
            item.max_length = match value {
                PropertyValue::Number(_) if !item.item_type.supports_max_length() => {
                    return Err(Rejection::PropertyMismatch {
                        property: property.to_string(),
                        reason: format!("not supported on {} items", item.item_type),
                    });
                }
                PropertyValue::Number(n) => Some(n),
                PropertyValue::Unset => None,
                _ => return Err(mismatch("a number")),
            };
        }
        ItemProperty::Type => {
            let PropertyValue::Type(item_type) = value else {
                return Err(mismatch("an item type"));
            };
            if has_children && !item_type.can_have_children() {
                return Err(Rejection::ChildlessParent(link_id.to_string()));
            }
            item.item_type = item_type;
            if !item_type.has_answer_options() {
                item.answer_options.clear();
            }
            if !item_type.supports_max_length() {
                item.max_length = None;
            }
        }
    }
    Ok(None)
}

fn clear_translation(tree: &mut Tree, link_id: &str, property: &TranslatableProperty) {
    for translation in tree.languages_mut().values_mut() {
        translation.set(link_id, property.clone(), None);
    }
}

fn prune_code_translations(tree: &mut Tree, link_id: &str, kept: &HashSet<String>) {
    for translation in tree.languages_mut().values_mut() {
        let stale: Vec<TranslatableProperty> = translation
            .item(link_id)
            .into_iter()
            .flat_map(|props| props.keys())
            .filter(|p| matches!(p, TranslatableProperty::CodeDisplay(id) if !kept.contains(id)))
            .cloned()
            .collect();
        for property in stale {
            translation.set(link_id, property, None);
        }
    }
}

fn prune_answer_translations(tree: &mut Tree, link_id: &str, count: usize) {
    for translation in tree.languages_mut().values_mut() {
        let stale: Vec<TranslatableProperty> = translation
            .item(link_id)
            .into_iter()
            .flat_map(|props| props.keys())
            .filter(|p| matches!(p, TranslatableProperty::AnswerOption(i) if *i >= count))
            .cloned()
            .collect();
        for property in stale {
            translation.set(link_id, property, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::model::extension::{self, UNIT_URL};
    use crate::validation::{ErrorProperty, validate_translations};
    use crate::model::{
        EnableWhen, EnableWhenOperator, Extension, MetadataField, SequentialIds, TypedValue,
    };

    struct Harness {
        tree: Tree,
        ids: SequentialIds,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                tree: Tree::new(),
                ids: SequentialIds::new("n"),
            }
        }

        fn run(&mut self, action: Action) -> Transition {
            let mut ctx = ReduceContext {
                ids: &mut self.ids,
                default_item_type: ItemType::String,
            };
            let transition = reduce(&self.tree, action, &mut ctx);
            if let Transition::Applied { tree, .. } = &transition {
                self.tree = tree.clone();
            }
            transition
        }

        fn add(&mut self, parent: Parent, index: usize) -> String {
            match self.run(Action::AddItem { parent, index }) {
                Transition::Applied {
                    created: Some(id), ..
                } => id,
                other => panic!("add failed: {other:?}"),
            }
        }

        fn set_type(&mut self, id: &str, item_type: ItemType) {
            let t = self.run(Action::UpdateItemProperty {
                link_id: id.into(),
                property: ItemProperty::Type,
                value: PropertyValue::Type(item_type),
            });
            assert!(matches!(t, Transition::Applied { .. }), "{t:?}");
        }

        fn rejected(&mut self, action: Action) -> Rejection {
            let before = self.tree.clone();
            match self.run(action) {
                Transition::Rejected(r) => {
                    assert_eq!(self.tree, before);
                    r
                }
                other => panic!("expected rejection, got {other:?}"),
            }
        }
    }

    /// root: [g]; g: [q1, q2]
    fn group_with_two() -> (Harness, String, String, String) {
        let mut h = Harness::new();
        let g = h.add(Parent::Root, 0);
        h.set_type(&g, ItemType::Group);
        let q1 = h.add(Parent::item(&g), 0);
        let q2 = h.add(Parent::item(&g), 1);
        (h, g, q1, q2)
    }

    #[test]
    fn test_add_item_uses_default_type_and_clamps() {
        let mut h = Harness::new();
        let a = h.add(Parent::Root, 0);
        let b = h.add(Parent::Root, 42);
        assert_eq!(h.tree.root(), [a.clone(), b]);
        assert_eq!(h.tree.item(&a).unwrap().item_type, ItemType::String);
    }

    #[test]
    fn test_add_item_unknown_or_display_parent() {
        let mut h = Harness::new();
        assert_eq!(
            h.rejected(Action::AddItem {
                parent: Parent::item("nope"),
                index: 0
            }),
            Rejection::UnknownParent(Parent::item("nope"))
        );

        let d = h.add(Parent::Root, 0);
        h.set_type(&d, ItemType::Display);
        assert_eq!(
            h.rejected(Action::AddItem {
                parent: Parent::item(&d),
                index: 0
            }),
            Rejection::ChildlessParent(d)
        );
    }

    #[test]
    fn test_delete_cascades_and_unknown_is_noop() {
        let (mut h, g, q1, q2) = group_with_two();
        assert!(matches!(
            h.run(Action::DeleteItem { link_id: g.clone() }),
            Transition::Applied { .. }
        ));
        for id in [&g, &q1, &q2] {
            assert!(h.tree.item(id).is_none());
            assert!(h.tree.parent(id).is_none());
        }
        assert!(h.tree.is_empty());

        assert_eq!(
            h.rejected(Action::DeleteItem { link_id: g.clone() }),
            Rejection::UnknownItem(g)
        );
    }

    #[test]
    fn test_move_reorders_and_reparents() {
        let (mut h, g, q1, q2) = group_with_two();
        h.run(Action::MoveItem {
            link_id: q2.clone(),
            new_parent: Parent::item(&g),
            new_index: 0,
        });
        assert_eq!(h.tree.children(&g), [q2.clone(), q1.clone()]);

        h.run(Action::MoveItem {
            link_id: q1.clone(),
            new_parent: Parent::Root,
            new_index: 100,
        });
        assert_eq!(h.tree.root(), [g.clone(), q1]);
        assert_eq!(h.tree.children(&g), [q2]);
    }

    #[test]
    fn test_move_into_own_subtree_rejected() {
        let (mut h, g, q1, _) = group_with_two();
        h.set_type(&q1, ItemType::Group);
        let inner = h.add(Parent::item(&q1), 0);
        h.set_type(&inner, ItemType::Group);

        assert_eq!(
            h.rejected(Action::MoveItem {
                link_id: g.clone(),
                new_parent: Parent::item(&inner),
                new_index: 0,
            }),
            Rejection::CyclicMove {
                link_id: g.clone(),
                target: inner
            }
        );
        assert!(matches!(
            h.rejected(Action::MoveItem {
                link_id: g.clone(),
                new_parent: Parent::item(&g),
                new_index: 0,
            }),
            Rejection::CyclicMove { .. }
        ));
    }

    #[test]
    fn test_duplicate_copies_subtree_after_original() {
        let (mut h, g, q1, q2) = group_with_two();
        h.run(Action::set_text(&q1, "Name?"));
        h.run(Action::AddEnableWhen {
            link_id: q2.clone(),
            condition: EnableWhen::new(&q1, EnableWhenOperator::Exists, TypedValue::Boolean(true)),
        });
        h.run(Action::SetItemExtension {
            link_id: q1.clone(),
            extension: Extension::Regex("^[a-z]+$".into()),
        });

        let copy = match h.run(Action::DuplicateItem { link_id: g.clone() }) {
            Transition::Applied {
                created: Some(id), ..
            } => id,
            other => panic!("{other:?}"),
        };

        assert_eq!(h.tree.root(), [g.clone(), copy.clone()]);
        let copied_children = h.tree.children(&copy).to_vec();
        assert_eq!(copied_children.len(), 2);
        assert!(!copied_children.contains(&q1));

        let c1 = h.tree.item(&copied_children[0]).unwrap();
        assert_eq!(c1.text.as_deref(), Some("Name?"));
        assert!(c1.extensions.contains(extension::REGEX_URL));

        let c2 = h.tree.item(&copied_children[1]).unwrap();
        assert_eq!(c2.enable_when[0].question, copied_children[0]);
        // original untouched
        assert_eq!(h.tree.item(&q2).unwrap().enable_when[0].question, q1);
        assert_eq!(h.tree.len(), 6);
    }

    #[test]
    fn test_duplicate_copies_translations() {
        let (mut h, _, q1, _) = group_with_two();
        h.run(Action::AddLanguage {
            language: "nb-NO".into(),
        });
        h.run(Action::UpdateTranslation {
            language: "nb-NO".into(),
            link_id: q1.clone(),
            property: TranslatableProperty::Text,
            value: Some("Navn?".into()),
        });
        let copy = match h.run(Action::DuplicateItem { link_id: q1.clone() }) {
            Transition::Applied {
                created: Some(id), ..
            } => id,
            other => panic!("{other:?}"),
        };
        let nb = h.tree.translation("nb-NO").unwrap();
        assert_eq!(nb.get(&copy, &TranslatableProperty::Text), Some("Navn?"));
    }

    #[test]
    fn test_update_property_kinds() {
        let (mut h, g, q1, _) = group_with_two();
        h.run(Action::UpdateItemProperty {
            link_id: q1.clone(),
            property: ItemProperty::MaxLength,
            value: PropertyValue::Number(50),
        });
        assert_eq!(h.tree.item(&q1).unwrap().max_length, Some(50));

        h.run(Action::UpdateItemProperty {
            link_id: q1.clone(),
            property: ItemProperty::MaxLength,
            value: PropertyValue::Unset,
        });
        assert_eq!(h.tree.item(&q1).unwrap().max_length, None);

        assert!(matches!(
            h.rejected(Action::UpdateItemProperty {
                link_id: q1.clone(),
                property: ItemProperty::Required,
                value: PropertyValue::Text("yes".into()),
            }),
            Rejection::PropertyMismatch { .. }
        ));

        h.run(Action::set_text(&q1, ""));
        assert_eq!(h.tree.item(&q1).unwrap().text, None);

        assert_eq!(
            h.rejected(Action::UpdateItemProperty {
                link_id: g.clone(),
                property: ItemProperty::Type,
                value: PropertyValue::Type(ItemType::Display),
            }),
            Rejection::ChildlessParent(g)
        );
    }

    #[test]
    fn test_code_list_edits() {
        let (mut h, _, q1, _) = group_with_two();
        h.run(Action::SetItemCodes {
            link_id: q1.clone(),
            codes: vec![
                Coding::new("http://loinc.org", "8302-2", "Body height"),
                Coding::new("http://snomed.info/sct", "50373000", "Body height measure"),
            ],
        });
        let codes = &h.tree.item(&q1).unwrap().code;
        assert!(codes.iter().all(|c| c.id.is_some()));
        assert_ne!(codes[0].id, codes[1].id);

        h.run(Action::UpdateItemCodeProperty {
            link_id: q1.clone(),
            index: 1,
            property: CodingProperty::Display,
            value: "Height".into(),
        });
        assert_eq!(
            h.tree.item(&q1).unwrap().code[1].display.as_deref(),
            Some("Height")
        );

        assert_eq!(
            h.rejected(Action::DeleteItemCode {
                link_id: q1.clone(),
                index: 5
            }),
            Rejection::IndexOutOfRange {
                link_id: q1.clone(),
                index: 5,
                len: 2
            }
        );

        h.run(Action::DeleteItemCode {
            link_id: q1.clone(),
            index: 0,
        });
        let codes = &h.tree.item(&q1).unwrap().code;
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].code.as_deref(), Some("50373000"));
    }

    fn coding_with_id(id: &str, code: &str, display: &str) -> Coding {
        let mut coding = Coding::new("http://example.org", code, display);
        coding.id = Some(id.into());
        coding
    }

    #[test]
    fn test_set_codes_reissues_repeated_ids() {
        let (mut h, _, q1, _) = group_with_two();
        h.run(Action::AddLanguage {
            language: "fr".into(),
        });
        h.run(Action::SetItemCodes {
            link_id: q1.clone(),
            codes: vec![coding_with_id("dup", "1", "One"), coding_with_id("dup", "2", "Two")],
        });
        let codes = h.tree.item(&q1).unwrap().code.clone();
        assert_eq!(codes[0].id.as_deref(), Some("dup"));
        let second = codes[1].id.clone().unwrap();
        assert_ne!(second, "dup");

        h.run(Action::UpdateTranslation {
            language: "fr".into(),
            link_id: q1.clone(),
            property: TranslatableProperty::CodeDisplay("dup".into()),
            value: Some("Un".into()),
        });
        let gaps = validate_translations(&h.tree, &ValidationConfig::default());
        assert_eq!(gaps.len(), 1);
        assert_eq!(
            gaps[0].error_property,
            ErrorProperty::Translation(TranslatableProperty::CodeDisplay(second))
        );
    }

    #[test]
    fn test_set_codes_drops_translations_of_replaced_codings() {
        let (mut h, _, q1, _) = group_with_two();
        h.run(Action::AddLanguage {
            language: "fr".into(),
        });
        h.run(Action::SetItemCodes {
            link_id: q1.clone(),
            codes: vec![coding_with_id("c1", "1", "One"), coding_with_id("c2", "2", "Two")],
        });
        for (id, display) in [("c1", "Un"), ("c2", "Deux")] {
            h.run(Action::UpdateTranslation {
                language: "fr".into(),
                link_id: q1.clone(),
                property: TranslatableProperty::CodeDisplay(id.into()),
                value: Some(display.into()),
            });
        }

        h.run(Action::SetItemCodes {
            link_id: q1.clone(),
            codes: vec![coding_with_id("c2", "2", "Two")],
        });
        let fr = h.tree.translation("fr").unwrap();
        assert_eq!(fr.get(&q1, &TranslatableProperty::CodeDisplay("c1".into())), None);
        assert_eq!(
            fr.get(&q1, &TranslatableProperty::CodeDisplay("c2".into())),
            Some("Deux")
        );
    }

    #[test]
    fn test_max_length_rejected_where_unsupported() {
        let (mut h, _, q1, _) = group_with_two();
        h.set_type(&q1, ItemType::Boolean);
        assert!(matches!(
            h.rejected(Action::UpdateItemProperty {
                link_id: q1.clone(),
                property: ItemProperty::MaxLength,
                value: PropertyValue::Number(5),
            }),
            Rejection::PropertyMismatch { .. }
        ));
        assert!(matches!(
            h.run(Action::UpdateItemProperty {
                link_id: q1.clone(),
                property: ItemProperty::MaxLength,
                value: PropertyValue::Unset,
            }),
            Transition::Applied { .. }
        ));
    }

    #[test]
    fn test_extension_set_then_remove_restores_item() {
        let (mut h, _, q1, _) = group_with_two();
        let before = h.tree.item(&q1).unwrap().clone();
        h.run(Action::SetItemExtension {
            link_id: q1.clone(),
            extension: Extension::Unit(Coding::from_code("mg")),
        });
        assert!(extension::get(h.tree.item(&q1).unwrap(), UNIT_URL).is_some());

        h.run(Action::RemoveItemExtension {
            link_id: q1.clone(),
            url: UNIT_URL.into(),
        });
        assert_eq!(h.tree.item(&q1).unwrap(), &before);
    }

    #[test]
    fn test_enable_when_edits() {
        let (mut h, _, q1, q2) = group_with_two();
        let cond = EnableWhen::new(&q1, EnableWhenOperator::Equal, TypedValue::String("x".into()));
        h.run(Action::AddEnableWhen {
            link_id: q2.clone(),
            condition: cond.clone(),
        });
        let updated = EnableWhen::new(&q1, EnableWhenOperator::NotEqual, TypedValue::String("y".into()));
        h.run(Action::UpdateEnableWhen {
            link_id: q2.clone(),
            index: 0,
            condition: updated.clone(),
        });
        assert_eq!(h.tree.item(&q2).unwrap().enable_when, vec![updated]);

        assert!(matches!(
            h.rejected(Action::DeleteEnableWhen {
                link_id: q2.clone(),
                index: 3
            }),
            Rejection::IndexOutOfRange { .. }
        ));
        h.run(Action::DeleteEnableWhen {
            link_id: q2.clone(),
            index: 0,
        });
        assert!(h.tree.item(&q2).unwrap().enable_when.is_empty());
    }

    #[test]
    fn test_language_lifecycle() {
        let (mut h, _, q1, _) = group_with_two();
        h.run(Action::SetMetadata {
            field: MetadataField::Language,
            value: Some("en-US".into()),
        });
        assert_eq!(
            h.rejected(Action::AddLanguage {
                language: "en-US".into()
            }),
            Rejection::DuplicateLanguage("en-US".into())
        );
        assert_eq!(
            h.rejected(Action::UpdateTranslation {
                language: "fr".into(),
                link_id: q1.clone(),
                property: TranslatableProperty::Text,
                value: Some("Nom?".into()),
            }),
            Rejection::UnknownLanguage("fr".into())
        );

        h.run(Action::AddLanguage {
            language: "fr".into(),
        });
        h.run(Action::UpdateMetadataTranslation {
            language: "fr".into(),
            field: MetadataField::Title,
            value: Some("Formulaire".into()),
        });
        assert_eq!(
            h.tree.translation("fr").unwrap().metadata(MetadataField::Title),
            Some("Formulaire")
        );
        assert!(matches!(
            h.rejected(Action::UpdateMetadataTranslation {
                language: "fr".into(),
                field: MetadataField::Version,
                value: Some("2".into()),
            }),
            Rejection::PropertyMismatch { .. }
        ));

        h.run(Action::RemoveLanguage {
            language: "fr".into(),
        });
        assert!(h.tree.languages().is_empty());
    }

    #[test]
    fn test_delete_drops_translations() {
        let (mut h, g, q1, _) = group_with_two();
        h.run(Action::AddLanguage {
            language: "nb-NO".into(),
        });
        h.run(Action::UpdateTranslation {
            language: "nb-NO".into(),
            link_id: q1.clone(),
            property: TranslatableProperty::Text,
            value: Some("Navn?".into()),
        });
        h.run(Action::DeleteItem { link_id: g });
        assert!(h.tree.translation("nb-NO").unwrap().is_empty());
    }

    #[test]
    fn test_save_is_checkpoint() {
        let (mut h, ..) = group_with_two();
        let before = h.tree.clone();
        assert_eq!(h.run(Action::Save), Transition::Checkpoint);
        assert_eq!(h.tree, before);
    }

    #[test]
    fn test_replace_document_checks_invariants() {
        let (mut h, ..) = group_with_two();
        let mut other = Tree::new();
        other.insert(&Parent::Root, 0, Item::new("x", ItemType::Boolean));
        h.run(Action::ReplaceDocument {
            tree: Box::new(other.clone()),
        });
        assert_eq!(h.tree, other);
    }
}
