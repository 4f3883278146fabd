//! Orphan-reference pass

use super::{ErrorCode, ErrorProperty, ValidationError};
use crate::config::ValidationConfig;
use crate::model::{EnableWhen, EnableWhenOperator, Item, Tree, TypedValue};

/// Find references that do not resolve to a valid target
///
/// An `enableWhen.question` must name an existing item outside the
/// referencing item's own subtree. Ancestors and items in sibling subtrees
/// are valid targets.
pub fn validate_orphans(tree: &Tree, config: &ValidationConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for link_id in tree.walk() {
        let Some(item) = tree.item(link_id) else {
            continue;
        };
        tracing::trace!(link_id, "Checking references");

        for (index, condition) in item.enable_when.iter().enumerate() {
            if let Some(error) = check_condition(tree, item, condition) {
                errors.push(error.at(index));
            }
        }

        if config.codes {
            check_codes(item, &mut errors);
        }

        for extension in item.extensions.iter() {
            if extension.missing_companion() {
                errors.push(ValidationError::new(
                    link_id,
                    ErrorProperty::Extension(extension.url().to_string()),
                    ErrorCode::MissingCompanion,
                    format!("extension '{}' has no value", extension.url()),
                ));
            }
        }
    }

    errors
}

fn check_condition(tree: &Tree, item: &Item, condition: &EnableWhen) -> Option<ValidationError> {
    let link_id = item.link_id.as_str();
    let question = condition.question.as_str();
    let error = |code, message: String| {
        Some(ValidationError::new(
            link_id,
            ErrorProperty::EnableWhen,
            code,
            message,
        ))
    };

    let Some(target) = tree.item(question) else {
        return error(
            ErrorCode::MissingReference,
            format!("enableWhen refers to unknown item '{question}'"),
        );
    };
    if question == link_id {
        return error(
            ErrorCode::SelfReference,
            "enableWhen refers to the item itself".to_string(),
        );
    }
    if tree.is_descendant(question, link_id) {
        return error(
            ErrorCode::DescendantReference,
            format!("enableWhen refers to '{question}' inside this item's subtree"),
        );
    }

    if condition.operator == EnableWhenOperator::Exists
        && !matches!(condition.answer, TypedValue::Boolean(_))
    {
        return error(
            ErrorCode::ExistsNeedsBoolean,
            "'exists' needs a boolean answer".to_string(),
        );
    }

    if let Some(answer) = condition.answer.as_coding()
        && !target.answer_options.is_empty()
        && !target
            .answer_options
            .iter()
            .filter_map(|option| option.value.as_coding())
            .any(|option| option.same_concept(answer))
    {
        return error(
            ErrorCode::AnswerNotInOptions,
            format!(
                "answer '{}' is not an option of '{question}'",
                answer.code.as_deref().unwrap_or_default()
            ),
        );
    }

    None
}

fn check_codes(item: &Item, errors: &mut Vec<ValidationError>) {
    for (index, coding) in item.code.iter().enumerate() {
        let missing = match (coding.has_code(), coding.has_system()) {
            (true, true) => continue,
            (false, false) => "code and system",
            (false, true) => "code",
            (true, false) => "system",
        };
        errors.push(
            ValidationError::new(
                &item.link_id,
                ErrorProperty::Code,
                ErrorCode::IncompleteCoding,
                format!("coding has no {missing}"),
            )
            .at(index),
        );
    }
}
