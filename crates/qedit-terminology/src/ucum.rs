//! UCUM unit search via the NLM Clinical Table Search Service

use crate::error::{LookupError, LookupResult};
use crate::lookup::{LookupOptions, TerminologyLookup, http_client, read_json};
use async_trait::async_trait;
use qedit_core::Coding;
use qedit_core::config::TerminologyConfig;
use serde_json::Value;
use std::time::Duration;

pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

#[derive(Debug, Clone)]
pub struct UcumClient {
    client: reqwest::Client,
    base_url: String,
}

impl UcumClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> LookupResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &TerminologyConfig) -> LookupResult<Self> {
        Self::new(
            config.ucum.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub async fn search_units(&self, text: &str) -> LookupResult<Vec<Coding>> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("terms", text)])
            .send()
            .await?;
        let body: Value = read_json(response).await?;
        parse_units(&body)
    }
}

/// Response shape: `[total, codes, extra, [[code, name], ...]]`
fn parse_units(body: &Value) -> LookupResult<Vec<Coding>> {
    let rows = match body.get(3) {
        Some(Value::Array(rows)) => rows,
        Some(Value::Null) => return Ok(Vec::new()),
        _ => return Err(LookupError::decode("missing display rows")),
    };
    Ok(rows
        .iter()
        .filter_map(|row| {
            let code = row.get(0)?.as_str()?;
            let display = row.get(1).and_then(Value::as_str).unwrap_or_default();
            Some(Coding::new(UCUM_SYSTEM, code, display))
        })
        .collect())
}

#[async_trait]
impl TerminologyLookup for UcumClient {
    fn name(&self) -> &'static str {
        "ucum"
    }

    async fn search(&self, query: &str, _options: &LookupOptions) -> LookupResult<Vec<Coding>> {
        self.search_units(query).await
    }
}
