//! Document-level descriptive fields

use std::fmt;
use std::str::FromStr;

/// Publication status of the questionnaire
pub const DEFAULT_STATUS: &str = "draft";

/// Document metadata (everything on the Questionnaire that is not an item)
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub id: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub status: String,
    pub date: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub purpose: Option<String>,
    pub language: Option<String>,
    pub subject_type: Vec<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            id: None,
            url: None,
            name: None,
            title: None,
            version: None,
            status: DEFAULT_STATUS.to_string(),
            date: None,
            publisher: None,
            description: None,
            purpose: None,
            language: None,
            subject_type: Vec::new(),
        }
    }
}

/// Settable metadata field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataField {
    Id,
    Url,
    Name,
    Title,
    Version,
    Status,
    Date,
    Publisher,
    Description,
    Purpose,
    Language,
    /// Comma separated list of resource types
    SubjectType,
}

impl MetadataField {
    pub const ALL: [MetadataField; 12] = [
        MetadataField::Id,
        MetadataField::Url,
        MetadataField::Name,
        MetadataField::Title,
        MetadataField::Version,
        MetadataField::Status,
        MetadataField::Date,
        MetadataField::Publisher,
        MetadataField::Description,
        MetadataField::Purpose,
        MetadataField::Language,
        MetadataField::SubjectType,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetadataField::Id => "id",
            MetadataField::Url => "url",
            MetadataField::Name => "name",
            MetadataField::Title => "title",
            MetadataField::Version => "version",
            MetadataField::Status => "status",
            MetadataField::Date => "date",
            MetadataField::Publisher => "publisher",
            MetadataField::Description => "description",
            MetadataField::Purpose => "purpose",
            MetadataField::Language => "language",
            MetadataField::SubjectType => "subjectType",
        }
    }

    /// Fields that carry human-readable text and can be translated
    pub fn is_translatable(self) -> bool {
        matches!(
            self,
            MetadataField::Title | MetadataField::Description | MetadataField::Purpose
        )
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetadataField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetadataField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown metadata field '{s}'"))
    }
}

impl Metadata {
    /// Read a field as text
    pub fn get(&self, field: MetadataField) -> Option<String> {
        match field {
            MetadataField::Id => self.id.clone(),
            MetadataField::Url => self.url.clone(),
            MetadataField::Name => self.name.clone(),
            MetadataField::Title => self.title.clone(),
            MetadataField::Version => self.version.clone(),
            MetadataField::Status => Some(self.status.clone()),
            MetadataField::Date => self.date.clone(),
            MetadataField::Publisher => self.publisher.clone(),
            MetadataField::Description => self.description.clone(),
            MetadataField::Purpose => self.purpose.clone(),
            MetadataField::Language => self.language.clone(),
            MetadataField::SubjectType => {
                if self.subject_type.is_empty() {
                    None
                } else {
                    Some(self.subject_type.join(","))
                }
            }
        }
    }

    /// Write a field; `None` or an empty string clears it
    ///
    /// Clearing `status` resets it to draft since the element is mandatory.
    pub fn set(&mut self, field: MetadataField, value: Option<String>) {
        let value = value.filter(|v| !v.is_empty());
        match field {
            MetadataField::Id => self.id = value,
            MetadataField::Url => self.url = value,
            MetadataField::Name => self.name = value,
            MetadataField::Title => self.title = value,
            MetadataField::Version => self.version = value,
            MetadataField::Status => {
                self.status = value.unwrap_or_else(|| DEFAULT_STATUS.to_string())
            }
            MetadataField::Date => self.date = value,
            MetadataField::Publisher => self.publisher = value,
            MetadataField::Description => self.description = value,
            MetadataField::Purpose => self.purpose = value,
            MetadataField::Language => self.language = value,
            MetadataField::SubjectType => {
                self.subject_type = value
                    .map(|v| {
                        v.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_draft() {
        assert_eq!(Metadata::default().status, "draft");
    }

    #[test]
    fn test_set_and_clear() {
        let mut meta = Metadata::default();
        meta.set(MetadataField::Title, Some("Intake".into()));
        assert_eq!(meta.get(MetadataField::Title).as_deref(), Some("Intake"));

        meta.set(MetadataField::Title, Some(String::new()));
        assert_eq!(meta.title, None);

        meta.set(MetadataField::Status, Some("active".into()));
        meta.set(MetadataField::Status, None);
        assert_eq!(meta.status, "draft");
    }

    #[test]
    fn test_subject_type_list() {
        let mut meta = Metadata::default();
        meta.set(MetadataField::SubjectType, Some("Patient, Practitioner".into()));
        assert_eq!(meta.subject_type, vec!["Patient", "Practitioner"]);
        assert_eq!(
            meta.get(MetadataField::SubjectType).as_deref(),
            Some("Patient,Practitioner")
        );
    }

    #[test]
    fn test_field_names_parse() {
        for field in MetadataField::ALL {
            assert_eq!(field.name().parse::<MetadataField>().unwrap(), field);
        }
    }
}
