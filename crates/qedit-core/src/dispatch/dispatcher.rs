//! Stateful owner of the current tree

use super::action::Action;
use super::reducer::{ReduceContext, Rejection, Transition, reduce};
use crate::model::{IdGenerator, ItemType, Tree, UuidGenerator};
use tracing::{debug, warn};

/// What a dispatched action did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied { created: Option<String> },
    Checkpoint,
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }

    /// Link id of the item created by the action, if any
    pub fn created(&self) -> Option<&str> {
        match self {
            Outcome::Applied { created } => created.as_deref(),
            _ => None,
        }
    }
}

/// The single mutation entry point
///
/// Holds the current tree exclusively. Readers borrow it between dispatches
/// through [`Dispatcher::tree`].
pub struct Dispatcher {
    tree: Tree,
    ids: Box<dyn IdGenerator>,
    default_item_type: ItemType,
    revision: u64,
    dirty: bool,
}

impl Dispatcher {
    /// Start from `tree` with random link ids
    pub fn new(tree: Tree) -> Self {
        Self::with_ids(tree, Box::new(UuidGenerator))
    }

    pub fn with_ids(tree: Tree, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            tree,
            ids,
            default_item_type: ItemType::String,
            revision: 0,
            dirty: false,
        }
    }

    /// Type given to items created by `AddItem`
    pub fn with_default_item_type(mut self, item_type: ItemType) -> Self {
        self.default_item_type = item_type;
        self
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Number of committed transitions
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether anything was committed since the last `Save`
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The id source, for importers building a replacement tree
    pub fn ids_mut(&mut self) -> &mut dyn IdGenerator {
        self.ids.as_mut()
    }

    pub fn dispatch(&mut self, action: Action) -> Outcome {
        let name = action.name();
        let mut ctx = ReduceContext {
            ids: self.ids.as_mut(),
            default_item_type: self.default_item_type,
        };

        match reduce(&self.tree, action, &mut ctx) {
            Transition::Applied { tree, created } => {
                self.tree = tree;
                self.revision += 1;
                self.dirty = true;
                debug!(action = name, revision = self.revision, "Applied action");
                Outcome::Applied { created }
            }
            Transition::Checkpoint => {
                self.dirty = false;
                debug!(revision = self.revision, "Checkpoint");
                Outcome::Checkpoint
            }
            Transition::Rejected(rejection) => {
                if matches!(rejection, Rejection::InvariantBroken(_)) {
                    warn!(action = name, "Rejected action: {}", rejection);
                } else {
                    debug!(action = name, "Rejected action: {}", rejection);
                }
                Outcome::Rejected(rejection)
            }
        }
    }

    /// Apply actions in order, stopping at nothing; returns every outcome
    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = Action>) -> Vec<Outcome> {
        actions.into_iter().map(|a| self.dispatch(a)).collect()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("items", &self.tree.len())
            .field("revision", &self.revision)
            .field("dirty", &self.dirty)
            .finish()
    }
}
