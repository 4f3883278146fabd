//! Tree to Questionnaire generator
//!
//! A deterministic fold from the root order list downwards. Child order in the
//! output is the order-list order; nothing depends on map iteration order, so
//! generating an unmodified tree twice yields byte-identical output.

use super::fhir_types::{
    FhirAnswerOption, FhirCoding, FhirEnableWhen, FhirExtension, PrimitiveElement, Questionnaire,
    QuestionnaireItem, write_choice,
};
use crate::model::extension::ADDITIONAL_LANGUAGE_URL;
use crate::model::{
    Extension, Item, MetadataField, TranslatableProperty, Tree, TypedValue,
};
use crate::result::Result;
use serde_json::Map;
use tracing::trace;

/// Build the Questionnaire resource for `tree`
pub fn generate(tree: &Tree) -> Questionnaire {
    let generator = Generator { tree };
    generator.questionnaire()
}

/// Serialize `tree` as Questionnaire JSON
pub fn generate_json(tree: &Tree, pretty: bool) -> Result<String> {
    let questionnaire = generate(tree);
    let json = if pretty {
        serde_json::to_string_pretty(&questionnaire)?
    } else {
        serde_json::to_string(&questionnaire)?
    };
    Ok(json)
}

/// Serialize `tree` as a JSON value (the form carried by host messages)
pub fn generate_value(tree: &Tree) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(generate(tree))?)
}

struct Generator<'a> {
    tree: &'a Tree,
}

impl<'a> Generator<'a> {
    fn questionnaire(&self) -> Questionnaire {
        let metadata = &self.tree.metadata;
        let extension = self
            .tree
            .languages()
            .keys()
            .map(|language| {
                FhirExtension::with_value(
                    ADDITIONAL_LANGUAGE_URL,
                    &TypedValue::Code(language.clone()),
                )
            })
            .collect();

        Questionnaire {
            resource_type: "Questionnaire".to_string(),
            id: metadata.id.clone(),
            language: metadata.language.clone(),
            extension,
            url: metadata.url.clone(),
            version: metadata.version.clone(),
            name: metadata.name.clone(),
            title: metadata.title.clone(),
            title_element: self.metadata_element(MetadataField::Title),
            status: metadata.status.clone(),
            subject_type: metadata.subject_type.clone(),
            date: metadata.date.clone(),
            publisher: metadata.publisher.clone(),
            description: metadata.description.clone(),
            description_element: self.metadata_element(MetadataField::Description),
            purpose: metadata.purpose.clone(),
            purpose_element: self.metadata_element(MetadataField::Purpose),
            item: self.items(self.tree.root()),
        }
    }

    fn items(&self, link_ids: &[String]) -> Vec<QuestionnaireItem> {
        link_ids
            .iter()
            .filter_map(|id| self.tree.item(id))
            .map(|item| self.item(item))
            .collect()
    }

    fn item(&self, item: &Item) -> QuestionnaireItem {
        trace!(link_id = %item.link_id, "Generating item");
        let link_id = item.link_id.as_str();

        QuestionnaireItem {
            extension: item
                .extensions
                .iter()
                .map(|ext| {
                    let property = TranslatableProperty::ExtensionText(ext.url().to_string());
                    extension(ext, &self.translations(link_id, &property))
                })
                .collect(),
            link_id: item.link_id.clone(),
            definition: item.definition.clone(),
            code: item
                .code
                .iter()
                .map(|coding| FhirCoding {
                    system: coding.system.clone(),
                    version: coding.version.clone(),
                    code: coding.code.clone(),
                    display: coding.display.clone(),
                    display_element: coding.id.as_ref().and_then(|id| {
                        let property = TranslatableProperty::CodeDisplay(id.clone());
                        PrimitiveElement::from_translations(&self.translations(link_id, &property))
                    }),
                })
                .collect(),
            prefix: item.prefix.clone(),
            prefix_element: self.element(link_id, TranslatableProperty::Prefix),
            text: item.text.clone(),
            text_element: self.element(link_id, TranslatableProperty::Text),
            item_type: item.item_type.code().to_string(),
            enable_when: item
                .enable_when
                .iter()
                .map(|condition| {
                    let mut answer = Map::new();
                    write_choice(&mut answer, "answer", &condition.answer, &[]);
                    FhirEnableWhen {
                        question: condition.question.clone(),
                        operator: condition.operator.code().to_string(),
                        answer,
                    }
                })
                .collect(),
            enable_behavior: item.enable_behavior.map(|b| b.code().to_string()),
            required: item.required,
            repeats: item.repeats,
            read_only: item.read_only,
            max_length: item.max_length,
            answer_option: item
                .answer_options
                .iter()
                .enumerate()
                .map(|(index, option)| {
                    let translations =
                        self.translations(link_id, &TranslatableProperty::AnswerOption(index));
                    let mut value = Map::new();
                    write_choice(&mut value, "value", &option.value, &translations);
                    FhirAnswerOption {
                        value,
                        initial_selected: option.initial_selected,
                    }
                })
                .collect(),
            item: self.items(self.tree.children(link_id)),
        }
    }

    /// `(language, text)` pairs for one property, in language order
    fn translations(&self, link_id: &str, property: &TranslatableProperty) -> Vec<(&'a str, &'a str)> {
        self.tree
            .languages()
            .iter()
            .filter_map(|(language, translation)| {
                translation
                    .get(link_id, property)
                    .map(|text| (language.as_str(), text))
            })
            .collect()
    }

    fn element(&self, link_id: &str, property: TranslatableProperty) -> Option<PrimitiveElement> {
        PrimitiveElement::from_translations(&self.translations(link_id, &property))
    }

    fn metadata_element(&self, field: MetadataField) -> Option<PrimitiveElement> {
        let translations: Vec<(&str, &str)> = self
            .tree
            .languages()
            .iter()
            .filter_map(|(language, translation)| {
                translation
                    .metadata(field)
                    .map(|text| (language.as_str(), text))
            })
            .collect();
        PrimitiveElement::from_translations(&translations)
    }
}

fn extension(ext: &Extension, translations: &[(&str, &str)]) -> FhirExtension {
    let mut value = Map::new();
    if let Some(typed) = ext.value() {
        write_choice(&mut value, "value", &typed, translations);
    }
    FhirExtension {
        url: ext.url().to_string(),
        value,
        extension: ext.nested().iter().map(|nested| extension(nested, &[])).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::extension::UNIT_URL;
    use crate::model::{
        AnswerOption, Coding, EnableWhen, EnableWhenOperator, ItemType, Parent, Translation,
    };
    use serde_json::json;

    /// root: [a]; a: [b]
    fn sample() -> Tree {
        let mut tree = Tree::new();
        tree.insert(&Parent::Root, 0, Item::new("a", ItemType::Group).with_text("Person"));
        tree.insert(&Parent::item("a"), 0, Item::new("b", ItemType::String).with_text("Name?"));
        tree
    }

    #[test]
    fn test_nested_items_in_order() {
        let mut tree = sample();
        tree.insert(&Parent::item("a"), 0, Item::new("first", ItemType::Boolean));
        tree.item_mut("b").unwrap().max_length = Some(50);

        let json = generate_value(&tree).unwrap();
        assert_eq!(
            json,
            json!({
                "resourceType": "Questionnaire",
                "status": "draft",
                "item": [{
                    "linkId": "a",
                    "text": "Person",
                    "type": "group",
                    "item": [
                        {"linkId": "first", "type": "boolean"},
                        {"linkId": "b", "text": "Name?", "type": "string", "maxLength": 50}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_codes_omit_empty_fields_and_ids() {
        let mut tree = sample();
        let mut coding = Coding::new("http://loinc.org", "8302-2", "");
        coding.id = Some("c-1".into());
        tree.item_mut("b").unwrap().code.push(coding);

        let json = generate_value(&tree).unwrap();
        assert_eq!(
            json["item"][0]["item"][0]["code"],
            json!([{"system": "http://loinc.org", "code": "8302-2"}])
        );
    }

    #[test]
    fn test_extensions_use_typed_value_fields() {
        let mut tree = sample();
        let b = tree.item_mut("b").unwrap();
        b.extensions.set(Extension::Unit(Coding::new(
            "http://unitsofmeasure.org",
            "mg",
            "milligram",
        )));
        b.extensions.set(Extension::MinLength(2));
        b.extensions.set(Extension::Hidden(true));

        let json = generate_value(&tree).unwrap();
        assert_eq!(
            json["item"][0]["item"][0]["extension"],
            json!([
                {"url": UNIT_URL, "valueCoding": {
                    "system": "http://unitsofmeasure.org", "code": "mg", "display": "milligram"
                }},
                {"url": "http://hl7.org/fhir/StructureDefinition/minLength", "valueInteger": 2},
                {"url": "http://hl7.org/fhir/StructureDefinition/questionnaire-hidden", "valueBoolean": true}
            ])
        );
    }

    #[test]
    fn test_enable_when_and_answer_options() {
        let mut tree = sample();
        tree.insert(&Parent::Root, 1, Item::new("c", ItemType::Choice));
        let c = tree.item_mut("c").unwrap();
        c.answer_options = vec![AnswerOption {
            value: TypedValue::Coding(Coding::new("urn:yn", "y", "Yes")),
            initial_selected: Some(true),
        }];
        c.enable_when = vec![EnableWhen::new(
            "b",
            EnableWhenOperator::Exists,
            TypedValue::Boolean(true),
        )];

        let json = generate_value(&tree).unwrap();
        let c = &json["item"][1];
        assert_eq!(
            c["enableWhen"],
            json!([{"question": "b", "operator": "exists", "answerBoolean": true}])
        );
        assert_eq!(
            c["answerOption"],
            json!([{"valueCoding": {"system": "urn:yn", "code": "y", "display": "Yes"}, "initialSelected": true}])
        );
    }

    #[test]
    fn test_translations_emitted_per_language() {
        let mut tree = sample();
        tree.metadata.title = Some("Form".into());
        let mut nb = Translation::new();
        nb.set("b", TranslatableProperty::Text, Some("Navn?".into()));
        nb.set_metadata(MetadataField::Title, Some("Skjema".into()));
        tree.languages_mut().insert("nb-NO".into(), nb);
        tree.languages_mut().insert("se".into(), Translation::new());

        let json = generate_value(&tree).unwrap();
        assert_eq!(
            json["extension"],
            json!([
                {"url": ADDITIONAL_LANGUAGE_URL, "valueCode": "nb-NO"},
                {"url": ADDITIONAL_LANGUAGE_URL, "valueCode": "se"}
            ])
        );
        assert_eq!(
            json["_title"]["extension"][0]["extension"][1]["valueString"],
            "Skjema"
        );
        assert_eq!(
            json["item"][0]["item"][0]["_text"]["extension"][0]["extension"][0]["valueCode"],
            "nb-NO"
        );
        assert!(json["item"][0].get("_text").is_none());
    }

    #[test]
    fn test_output_is_stable() {
        let tree = sample();
        assert_eq!(
            generate_json(&tree, true).unwrap(),
            generate_json(&tree, true).unwrap()
        );
        assert!(!generate_json(&tree, false).unwrap().contains('\n'));
    }
}
