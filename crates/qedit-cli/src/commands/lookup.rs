//! Terminology lookup command

use qedit_core::{QeditError, Result};
use qedit_terminology::{
    BioportalClient, LookupError, LookupOptions, TerminologyLookup, UcumClient,
};
use std::path::PathBuf;
use tracing::debug;

use crate::output::OutputFormatter;
use crate::{OutputFormat, Service};

pub struct LookupRequest {
    pub query: String,
    pub service: Service,
    pub ontologies: Vec<String>,
    pub semantic_types: Vec<String>,
    pub text: bool,
    pub exact: bool,
    pub api_key: Option<String>,
}

pub async fn lookup_command(
    request: LookupRequest,
    format: OutputFormat,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = super::load_config(config_path, None)?.terminology;
    if request.api_key.is_some() {
        config.bioportal.api_key = request.api_key;
    }

    let mut options = LookupOptions::default()
        .ontologies(request.ontologies)
        .semantic_types(request.semantic_types);
    if request.text {
        options = options.text();
    }
    if request.exact {
        options = options.exact();
    }
    debug!(service = ?request.service, query = %request.query, "Looking up codings");

    let service_error = |e: LookupError| QeditError::config_error(format!("Failed to set up lookup: {e}"));
    let client: Box<dyn TerminologyLookup> = match request.service {
        Service::Bioportal => Box::new(BioportalClient::from_config(&config).map_err(service_error)?),
        Service::Ucum => Box::new(UcumClient::from_config(&config).map_err(service_error)?),
    };

    let codings = client.lookup(&request.query, &options).await;
    OutputFormatter::new(format).print_codings(&codings)
}
