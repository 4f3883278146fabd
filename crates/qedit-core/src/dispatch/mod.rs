//! Action dispatcher
//!
//! Every change to a questionnaire is an [`Action`] applied by [`reduce`].
//! [`Dispatcher`] wraps the reducer with the current state and an id source.

pub mod action;
pub mod dispatcher;
pub mod reducer;

pub use action::{Action, CodingProperty, ItemProperty, PropertyValue};
pub use dispatcher::{Dispatcher, Outcome};
pub use reducer::{ReduceContext, Rejection, Transition, reduce};
