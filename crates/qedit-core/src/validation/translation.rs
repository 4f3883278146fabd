//! Translation-completeness pass

use super::{ErrorCode, ErrorProperty, ValidationError};
use crate::config::ValidationConfig;
use crate::model::{TranslatableProperty, Tree};

/// Report every base-language string without an entry in an additional
/// language
///
/// Checks the document's configured languages unless the config names its
/// own list. A document without additional languages trivially passes.
pub fn validate_translations(tree: &Tree, config: &ValidationConfig) -> Vec<ValidationError> {
    if !config.translations {
        return Vec::new();
    }

    let languages: Vec<&str> = match &config.languages {
        Some(languages) => languages.iter().map(String::as_str).collect(),
        None => tree.languages().keys().map(String::as_str).collect(),
    };
    if languages.is_empty() {
        return Vec::new();
    }

    let mut errors = Vec::new();
    for link_id in tree.walk() {
        let Some(item) = tree.item(link_id) else {
            continue;
        };
        let properties = item.translatable_properties();
        if properties.is_empty() {
            continue;
        }

        for &language in &languages {
            let translation = tree.translation(language);
            for (property, _) in &properties {
                let present = translation.and_then(|t| t.get(link_id, property));
                if present.is_some() {
                    continue;
                }
                let mut error = ValidationError::new(
                    link_id,
                    ErrorProperty::Translation(property.clone()),
                    ErrorCode::MissingTranslation,
                    format!("{property} has no {language} translation"),
                )
                .in_language(language);
                if let TranslatableProperty::AnswerOption(index) = property {
                    error = error.at(*index);
                }
                errors.push(error);
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, ItemType, Parent, Translation};

    /// root: [a, b]; both with text
    fn tree() -> Tree {
        let mut tree = Tree::new();
        tree.insert(&Parent::Root, 0, Item::new("a", ItemType::String).with_text("Name?"));
        tree.insert(&Parent::Root, 1, Item::new("b", ItemType::Integer).with_text("Age?"));
        tree
    }

    #[test]
    fn test_no_languages_passes() {
        assert!(validate_translations(&tree(), &ValidationConfig::default()).is_empty());
    }

    #[test]
    fn test_one_violation_per_untranslated_item() {
        let mut tree = tree();
        let mut nb = Translation::new();
        nb.set("a", TranslatableProperty::Text, Some("Navn?".into()));
        tree.languages_mut().insert("nb-NO".into(), nb);

        let errors = validate_translations(&tree, &ValidationConfig::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].link_id, "b");
        assert_eq!(errors[0].language.as_deref(), Some("nb-NO"));
        assert_eq!(
            errors[0].error_property,
            ErrorProperty::Translation(TranslatableProperty::Text)
        );
    }

    #[test]
    fn test_items_without_text_need_nothing() {
        let mut tree = Tree::new();
        tree.insert(&Parent::Root, 0, Item::new("g", ItemType::Group));
        tree.languages_mut().insert("fr".into(), Translation::new());
        assert!(validate_translations(&tree, &ValidationConfig::default()).is_empty());
    }

    #[test]
    fn test_config_language_override() {
        let tree = tree();
        let config = ValidationConfig {
            languages: Some(vec!["se".into()]),
            ..ValidationConfig::default()
        };
        let errors = validate_translations(&tree, &config);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.language.as_deref() == Some("se")));
    }

    #[test]
    fn test_disabled_pass() {
        let mut tree = tree();
        tree.languages_mut().insert("fr".into(), Translation::new());
        let config = ValidationConfig {
            translations: false,
            ..ValidationConfig::default()
        };
        assert!(validate_translations(&tree, &config).is_empty());
    }
}
