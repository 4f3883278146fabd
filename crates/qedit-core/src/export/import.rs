//! Questionnaire to tree importer (inverse of the generator)

use super::fhir_types::{
    FhirExtension, PrimitiveElement, Questionnaire, QuestionnaireItem, element_translations,
    read_choice,
};
use crate::dispatch::reducer::assign_coding_ids;
use crate::error::QeditError;
use crate::model::extension::ADDITIONAL_LANGUAGE_URL;
use crate::model::{
    AnswerOption, Coding, EnableBehavior, EnableWhen, EnableWhenOperator, Extension, IdGenerator,
    Item, ItemType, Metadata, MetadataField, Parent, TranslatableProperty, Tree,
};
use crate::result::Result;
use serde_json::Value;
use std::collections::HashSet;

/// Read a Questionnaire JSON document into a tree
///
/// `ids` supplies the client-local ids of imported codings.
pub fn import_questionnaire(json: &str, ids: &mut dyn IdGenerator) -> Result<Tree> {
    let value: Value = serde_json::from_str(json)?;
    import_value(value, ids)
}

/// Same as [`import_questionnaire`] for an already parsed document
pub fn import_value(value: Value, ids: &mut dyn IdGenerator) -> Result<Tree> {
    match value.get("resourceType").and_then(Value::as_str) {
        Some("Questionnaire") => {}
        Some(other) => {
            return Err(QeditError::import_error(format!(
                "expected a Questionnaire, got {other}"
            )));
        }
        None => return Err(QeditError::import_error("missing resourceType")),
    }
    let questionnaire: Questionnaire = serde_json::from_value(value)?;

    let mut importer = Importer {
        tree: Tree::new(),
        ids,
        seen: HashSet::new(),
    };
    importer.metadata(&questionnaire);
    for fhir_item in &questionnaire.item {
        importer.item(&Parent::Root, fhir_item)?;
    }

    let tree = importer.tree;
    tree.check_invariants()
        .map_err(|e| QeditError::import_error(e.to_string()))?;
    tracing::debug!(
        items = tree.len(),
        languages = tree.languages().len(),
        "Imported questionnaire"
    );
    Ok(tree)
}

struct Importer<'a> {
    tree: Tree,
    ids: &'a mut dyn IdGenerator,
    seen: HashSet<String>,
}

impl Importer<'_> {
    fn metadata(&mut self, q: &Questionnaire) {
        self.tree.metadata = Metadata {
            id: q.id.clone(),
            url: q.url.clone(),
            name: q.name.clone(),
            title: q.title.clone(),
            version: q.version.clone(),
            status: q.status.clone(),
            date: q.date.clone(),
            publisher: q.publisher.clone(),
            description: q.description.clone(),
            purpose: q.purpose.clone(),
            language: q.language.clone(),
            subject_type: q.subject_type.clone(),
        };

        for extension in &q.extension {
            if extension.url != ADDITIONAL_LANGUAGE_URL {
                continue;
            }
            if let Some(language) = extension.value.get("valueCode").and_then(Value::as_str) {
                self.tree
                    .languages_mut()
                    .entry(language.to_string())
                    .or_default();
            }
        }

        for (field, element) in [
            (MetadataField::Title, &q.title_element),
            (MetadataField::Description, &q.description_element),
            (MetadataField::Purpose, &q.purpose_element),
        ] {
            for (language, content) in element_translations(element.as_ref()) {
                self.tree
                    .languages_mut()
                    .entry(language)
                    .or_default()
                    .set_metadata(field, Some(content));
            }
        }
    }

    fn item(&mut self, parent: &Parent, fhir: &QuestionnaireItem) -> Result<()> {
        let link_id = fhir.link_id.trim();
        if link_id.is_empty() {
            return Err(QeditError::import_error("item without linkId"));
        }
        if !self.seen.insert(link_id.to_string()) {
            return Err(QeditError::import_error(format!(
                "duplicate linkId '{link_id}'"
            )));
        }
        let item_type = fhir
            .item_type
            .parse::<ItemType>()
            .map_err(|e: String| QeditError::import_error(format!("{link_id}: {e}")))?;

        let mut item = Item::new(link_id, item_type);
        item.text = fhir.text.clone();
        item.prefix = fhir.prefix.clone();
        item.definition = fhir.definition.clone();
        item.required = fhir.required;
        item.repeats = fhir.repeats;
        item.read_only = fhir.read_only;
        item.max_length = fhir.max_length;
        item.enable_behavior = fhir
            .enable_behavior
            .as_deref()
            .map(str::parse::<EnableBehavior>)
            .transpose()
            .map_err(|e: String| QeditError::import_error(format!("{link_id}: {e}")))?;

        self.translate(link_id, TranslatableProperty::Text, fhir.text_element.as_ref());
        self.translate(link_id, TranslatableProperty::Prefix, fhir.prefix_element.as_ref());

        item.code = fhir
            .code
            .iter()
            .map(|c| Coding {
                id: None,
                system: c.system.clone(),
                version: c.version.clone(),
                code: c.code.clone(),
                display: c.display.clone(),
            })
            .collect();
        assign_coding_ids(&mut item.code, self.ids);
        for (coding, fhir_coding) in item.code.iter().zip(&fhir.code) {
            if let Some(id) = &coding.id {
                self.translate(
                    link_id,
                    TranslatableProperty::CodeDisplay(id.clone()),
                    fhir_coding.display_element.as_ref(),
                );
            }
        }

        for fhir_extension in &fhir.extension {
            let (extension, translations) = read_extension(fhir_extension)
                .map_err(|e| QeditError::import_error(format!("{link_id}: {e}")))?;
            let property = TranslatableProperty::ExtensionText(extension.url().to_string());
            self.add_translations(link_id, &property, translations);
            item.extensions.set(extension);
        }

        for condition in &fhir.enable_when {
            let operator = condition
                .operator
                .parse::<EnableWhenOperator>()
                .map_err(|e: String| QeditError::import_error(format!("{link_id}: {e}")))?;
            let (answer, _) = read_choice(&condition.answer, "answer")
                .map_err(|e| QeditError::import_error(format!("{link_id}: {e}")))?
                .ok_or_else(|| {
                    QeditError::import_error(format!("{link_id}: enableWhen without answer"))
                })?;
            item.enable_when
                .push(EnableWhen::new(condition.question.clone(), operator, answer));
        }

        for (index, option) in fhir.answer_option.iter().enumerate() {
            let (value, translations) = read_choice(&option.value, "value")
                .map_err(|e| QeditError::import_error(format!("{link_id}: {e}")))?
                .ok_or_else(|| {
                    QeditError::import_error(format!("{link_id}: answerOption without value"))
                })?;
            self.add_translations(link_id, &TranslatableProperty::AnswerOption(index), translations);
            item.answer_options.push(AnswerOption {
                value,
                initial_selected: option.initial_selected,
            });
        }

        let end = self.tree.child_list(parent).map_or(0, <[String]>::len);
        self.tree.insert(parent, end, item);

        let me = Parent::item(link_id);
        for child in &fhir.item {
            self.item(&me, child)?;
        }
        Ok(())
    }

    fn translate(&mut self, link_id: &str, property: TranslatableProperty, element: Option<&PrimitiveElement>) {
        self.add_translations(link_id, &property, element_translations(element));
    }

    fn add_translations(
        &mut self,
        link_id: &str,
        property: &TranslatableProperty,
        translations: Vec<(String, String)>,
    ) {
        for (language, content) in translations {
            self.tree
                .languages_mut()
                .entry(language)
                .or_default()
                .set(link_id, property.clone(), Some(content));
        }
    }
}

/// Decode one extension, typed where the URL is known
fn read_extension(fhir: &FhirExtension) -> std::result::Result<(Extension, Vec<(String, String)>), String> {
    let (value, translations) = match read_choice(&fhir.value, "value")? {
        Some((value, translations)) => (Some(value), translations),
        None => (None, Vec::new()),
    };
    let nested = fhir
        .extension
        .iter()
        .map(|e| read_extension(e).map(|(extension, _)| extension))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((Extension::from_parts(&fhir.url, value, nested), translations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::generator::generate_json;
    use crate::model::{SequentialIds, TypedValue};
    use serde_json::json;

    fn import(value: Value) -> Result<Tree> {
        import_value(value, &mut SequentialIds::new("c"))
    }

    #[test]
    fn test_rejects_other_resources() {
        let err = import(json!({"resourceType": "Patient"})).unwrap_err();
        assert!(err.to_string().contains("Patient"));
        assert!(import(json!({"item": []})).is_err());
    }

    #[test]
    fn test_rejects_bad_items() {
        let missing = json!({"resourceType": "Questionnaire", "status": "draft",
            "item": [{"type": "string"}]});
        assert!(import(missing).is_err());

        let duplicate = json!({"resourceType": "Questionnaire", "status": "draft",
            "item": [{"linkId": "a", "type": "group", "item": [{"linkId": "a", "type": "string"}]}]});
        assert!(import(duplicate).unwrap_err().to_string().contains("duplicate"));

        let unknown = json!({"resourceType": "Questionnaire", "status": "draft",
            "item": [{"linkId": "a", "type": "checkbox"}]});
        assert!(import(unknown).is_err());
    }

    #[test]
    fn test_reads_structure_and_values() {
        let tree = import(json!({
            "resourceType": "Questionnaire",
            "status": "active",
            "title": "Intake",
            "item": [{
                "linkId": "g", "type": "group",
                "item": [
                    {"linkId": "smoker", "type": "boolean", "required": true},
                    {"linkId": "packs", "type": "integer",
                     "enableWhen": [{"question": "smoker", "operator": "=", "answerBoolean": true}],
                     "extension": [{"url": "http://hl7.org/fhir/StructureDefinition/minLength", "valueInteger": 1}]}
                ]
            }]
        }))
        .unwrap();

        assert_eq!(tree.metadata.status, "active");
        assert_eq!(tree.children("g"), ["smoker", "packs"]);
        let packs = tree.item("packs").unwrap();
        assert_eq!(packs.item_type, ItemType::Integer);
        assert_eq!(packs.enable_when[0].answer, TypedValue::Boolean(true));
        assert_eq!(
            packs.extensions.iter().next(),
            Some(&Extension::MinLength(1))
        );
    }

    #[test]
    fn test_known_url_with_wrong_kind_is_kept_raw() {
        let tree = import(json!({
            "resourceType": "Questionnaire", "status": "draft",
            "item": [{"linkId": "a", "type": "string", "extension": [
                {"url": "http://hl7.org/fhir/StructureDefinition/minLength", "valueString": "3"}
            ]}]
        }))
        .unwrap();
        assert!(matches!(
            tree.item("a").unwrap().extensions.iter().next(),
            Some(Extension::Other { .. })
        ));
    }

    #[test]
    fn test_reads_translations_and_languages() {
        let tree = import(json!({
            "resourceType": "Questionnaire", "status": "draft",
            "extension": [{"url": ADDITIONAL_LANGUAGE_URL, "valueCode": "se"}],
            "item": [{
                "linkId": "a", "type": "string", "text": "Name?",
                "_text": {"extension": [{
                    "url": "http://hl7.org/fhir/StructureDefinition/translation",
                    "extension": [
                        {"url": "lang", "valueCode": "nb-NO"},
                        {"url": "content", "valueString": "Navn?"}
                    ]
                }]}
            }]
        }))
        .unwrap();

        let languages: Vec<_> = tree.languages().keys().cloned().collect();
        assert_eq!(languages, vec!["se", "nb-NO"]);
        assert_eq!(
            tree.translation("nb-NO").unwrap().get("a", &TranslatableProperty::Text),
            Some("Navn?")
        );
    }

    #[test]
    fn test_round_trip_is_stable() {
        let source = json!({
            "resourceType": "Questionnaire",
            "language": "en-US",
            "extension": [{"url": ADDITIONAL_LANGUAGE_URL, "valueCode": "nb-NO"}],
            "title": "Vitals",
            "status": "draft",
            "item": [{
                "linkId": "g", "type": "group", "text": "Vitals",
                "item": [{
                    "linkId": "h", "type": "quantity", "text": "Height",
                    "code": [{"system": "http://loinc.org", "code": "8302-2", "display": "Body height",
                              "_display": {"extension": [{
                                  "url": "http://hl7.org/fhir/StructureDefinition/translation",
                                  "extension": [{"url": "lang", "valueCode": "nb-NO"},
                                                {"url": "content", "valueString": "Høyde"}]}]}}],
                    "extension": [{"url": "http://hl7.org/fhir/StructureDefinition/questionnaire-unit",
                                   "valueCoding": {"system": "http://unitsofmeasure.org", "code": "cm"}},
                                  {"url": "http://example.org/custom", "extension": [
                                      {"url": "part", "valueString": "x"}]}]
                }, {
                    "linkId": "g2", "type": "group",
                    "item": [{"linkId": "note", "type": "display", "text": "Thanks"}]
                }]
            }]
        });

        let first = import(source).unwrap();
        let once = generate_json(&first, true).unwrap();
        let second = import_questionnaire(&once, &mut SequentialIds::new("z")).unwrap();
        let twice = generate_json(&second, true).unwrap();
        assert_eq!(once, twice);
        assert!(once.contains("Høyde"));
    }
}
