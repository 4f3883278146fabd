//! Host messaging boundary
//!
//! The editor is embedded in a host and talks to it only through these
//! messages. Payloads carry the generated Questionnaire, never the internal
//! tree.

use crate::config::EditorConfig;
use crate::dispatch::{Action, Dispatcher, Outcome};
use crate::error::QeditError;
use crate::export::{generate_json, import_value};
use crate::model::{IdGenerator, Tree, UuidGenerator};
use crate::result::Result;
use crate::validation::{ValidationReport, validate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Host to editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msgId")]
pub enum HostMessage {
    /// Replace the document with this Questionnaire
    #[serde(rename = "SAGESendToStructor")]
    Load {
        #[serde(rename = "questionnaireResource")]
        questionnaire_resource: Value,
    },
    /// Ask for the current document
    #[serde(rename = "SAGETriggerSend")]
    RequestDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyType {
    Start,
    Load,
}

/// Editor to host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msgId")]
pub enum EditorMessage {
    #[serde(rename = "StructorReady")]
    Ready {
        #[serde(rename = "readyType")]
        ready_type: ReadyType,
    },
    /// The generated Questionnaire as a JSON string
    #[serde(rename = "StructorSendToSAGE")]
    Document {
        #[serde(rename = "questionnaireStr")]
        serialized_form: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

/// One embedded editing session
pub struct EditorSession {
    dispatcher: Dispatcher,
    config: EditorConfig,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Result<Self> {
        Self::with_ids(config, Box::new(UuidGenerator))
    }

    /// Start from an empty document in the configured base language
    pub fn with_ids(config: EditorConfig, ids: Box<dyn IdGenerator>) -> Result<Self> {
        let item_type = config.editor.item_type()?;
        let mut tree = Tree::new();
        tree.metadata.language = Some(config.editor.default_language.clone());
        let dispatcher = Dispatcher::with_ids(tree, ids).with_default_item_type(item_type);
        Ok(Self { dispatcher, config })
    }

    /// The message announcing the editor to the host
    pub fn start(&self) -> EditorMessage {
        info!("Editor session started");
        EditorMessage::Ready {
            ready_type: ReadyType::Start,
        }
    }

    pub fn tree(&self) -> &Tree {
        self.dispatcher.tree()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// React to one host message
    pub fn handle(&mut self, message: HostMessage) -> EditorMessage {
        match message {
            HostMessage::Load {
                questionnaire_resource,
            } => match self.load(questionnaire_resource) {
                Ok(()) => EditorMessage::Ready {
                    ready_type: ReadyType::Load,
                },
                Err(err) => {
                    warn!("Rejected load: {}", err);
                    EditorMessage::Error {
                        message: err.to_string(),
                    }
                }
            },
            HostMessage::RequestDocument => self
                .dispatch(Action::Save)
                .1
                .unwrap_or_else(|| EditorMessage::Error {
                    message: "document could not be produced".to_string(),
                }),
        }
    }

    /// Parse and handle one raw message; malformed input becomes an error
    /// message rather than a failure
    pub fn handle_json(&mut self, raw: &str) -> EditorMessage {
        match serde_json::from_str::<HostMessage>(raw) {
            Ok(message) => self.handle(message),
            Err(e) => {
                let err = QeditError::message_error(e.to_string());
                warn!("{}", err);
                EditorMessage::Error {
                    message: err.to_string(),
                }
            }
        }
    }

    /// Forward an edit; a `Save` checkpoint also yields the document message
    pub fn dispatch(&mut self, action: Action) -> (Outcome, Option<EditorMessage>) {
        let outcome = self.dispatcher.dispatch(action);
        let message = match outcome {
            Outcome::Checkpoint => Some(self.document_message()),
            _ => None,
        };
        (outcome, message)
    }

    /// Run both validation passes with the session's config
    pub fn validate(&self) -> ValidationReport {
        validate(self.tree(), &self.config.validation)
    }

    fn load(&mut self, resource: Value) -> Result<()> {
        let tree = import_value(resource, self.dispatcher.ids_mut())?;
        let items = tree.len();
        match self.dispatcher.dispatch(Action::ReplaceDocument {
            tree: Box::new(tree),
        }) {
            Outcome::Applied { .. } => {}
            Outcome::Rejected(rejection) => {
                return Err(QeditError::import_error(rejection.to_string()));
            }
            Outcome::Checkpoint => {}
        }
        self.dispatcher.dispatch(Action::Save);
        info!(items, "Loaded questionnaire from host");
        Ok(())
    }

    fn document_message(&self) -> EditorMessage {
        match generate_json(self.tree(), self.config.generator.pretty) {
            Ok(serialized_form) => EditorMessage::Document { serialized_form },
            Err(err) => EditorMessage::Error {
                message: err.to_string(),
            },
        }
    }
}
