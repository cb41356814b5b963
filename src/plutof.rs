use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::domain::{CandidateRecord, ShName, ShVersion, TaxonId, TaxonNode, Threshold};
use crate::error::ShError;

pub const DEFAULT_API_URL: &str = "https://api.plutof.ut.ee/v1/public";

pub trait TaxonomyService: Send + Sync {
    fn search_clusters(
        &self,
        accession: &str,
        threshold: &Threshold,
        version: &ShVersion,
    ) -> Result<Vec<CandidateRecord>, ShError>;

    /// `None` when the SH exists without a linked taxon.
    fn taxon_for_sh(&self, sh: &ShName) -> Result<Option<TaxonNode>, ShError>;

    fn taxon_by_id(&self, taxon_id: &TaxonId) -> Result<TaxonNode, ShError>;
}

#[derive(Clone)]
pub struct PlutofHttpClient {
    client: Client,
    base_url: String,
    max_retries: usize,
}

impl PlutofHttpClient {
    pub fn new(base_url: &str, timeout: Duration, max_retries: usize) -> Result<Self, ShError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("unite-sh/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ShError::PlutofHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| ShError::PlutofHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/dshclusters/search/", self.base_url)
    }

    fn taxon_url(&self, taxon_id: &TaxonId) -> String {
        format!("{}/taxa/{}", self.base_url, taxon_id.as_str())
    }

    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ShError> {
        debug!(url, ?query, "PlutoF request");
        let response = self.send_with_retries(|| self.client.get(url).query(query))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| ShError::PlutofResponse(format!("{url}: {err}")))
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<reqwest::blocking::Response, ShError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match make_req().send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < self.max_retries && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        debug!(status, attempt, "retrying PlutoF request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < self.max_retries && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        debug!(%err, attempt, "retrying PlutoF request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(ShError::PlutofHttp(err.to_string()));
                }
            }
        }
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ShError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "PlutoF request failed".to_string());
        Err(ShError::PlutofStatus { status, message })
    }
}

impl TaxonomyService for PlutofHttpClient {
    fn search_clusters(
        &self,
        accession: &str,
        threshold: &Threshold,
        version: &ShVersion,
    ) -> Result<Vec<CandidateRecord>, ShError> {
        let raw = self.get_json(
            &self.search_url(),
            &[
                ("sequence_accession_nr", accession),
                ("threshold", threshold.as_str()),
                ("version", version.as_str()),
            ],
        )?;
        parse_candidates(&raw)
    }

    fn taxon_for_sh(&self, sh: &ShName) -> Result<Option<TaxonNode>, ShError> {
        let raw = self.get_json(&self.search_url(), &[("name", sh.as_str())])?;
        match parse_sh_taxon_link(&raw, sh)? {
            Some(taxon_id) => self.taxon_by_id(&taxon_id).map(Some),
            None => Ok(None),
        }
    }

    fn taxon_by_id(&self, taxon_id: &TaxonId) -> Result<TaxonNode, ShError> {
        let raw = self.get_json(&self.taxon_url(taxon_id), &[])?;
        parse_taxon(&raw, taxon_id)
    }
}

pub fn parse_candidates(raw: &Value) -> Result<Vec<CandidateRecord>, ShError> {
    data_array(raw)?
        .iter()
        .map(|item| {
            let attributes = item
                .get("attributes")
                .ok_or_else(|| ShError::PlutofResponse("cluster without attributes".to_string()))?;
            let name = required_str(attributes, "name")?;
            let version = attributes
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let has_conflict = attributes
                .get("has_conflict")
                .map(is_truthy)
                .unwrap_or(false);
            let has_designators = attributes
                .get("designators")
                .map(is_truthy)
                .unwrap_or(false);
            let taxon_ref = item
                .pointer("/relationships/taxon_node/data")
                .filter(|data| data.get("type").and_then(Value::as_str) == Some("Taxon"))
                .and_then(|data| data.get("id"))
                .and_then(id_string)
                .map(TaxonId::new);
            Ok(CandidateRecord {
                version,
                name,
                has_conflict,
                has_designators,
                taxon_ref,
            })
        })
        .collect()
}

pub fn parse_sh_taxon_link(raw: &Value, sh: &ShName) -> Result<Option<TaxonId>, ShError> {
    let mut taxon_id = None;
    for item in data_array(raw)? {
        let name = item
            .pointer("/attributes/name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if name != sh.as_str() {
            debug!(found = name, expected = %sh, "skipping cluster with a different SH name");
            continue;
        }
        taxon_id = item
            .pointer("/relationships/taxon_node/data/id")
            .and_then(id_string)
            .map(TaxonId::new);
    }
    Ok(taxon_id)
}

/// Parses a `taxa/<id>` payload. Lineage ids keep the service order.
pub fn parse_taxon(raw: &Value, taxon_id: &TaxonId) -> Result<TaxonNode, ShError> {
    let data = raw
        .get("data")
        .ok_or_else(|| ShError::PlutofResponse(format!("taxon {taxon_id} without data")))?;
    let attributes = data
        .get("attributes")
        .ok_or_else(|| ShError::PlutofResponse(format!("taxon {taxon_id} without attributes")))?;
    let name = required_str(attributes, "name")?;
    let rank = required_str(attributes, "rank")?;
    let lineage = data
        .pointer("/relationships/lineage/data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.get("type").and_then(Value::as_str) == Some("Taxon"))
                .filter_map(|item| item.get("id").and_then(id_string))
                .map(TaxonId::new)
                .collect()
        })
        .unwrap_or_default();
    Ok(TaxonNode {
        id: taxon_id.clone(),
        name,
        rank,
        lineage,
    })
}

fn data_array(raw: &Value) -> Result<&Vec<Value>, ShError> {
    raw.get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ShError::PlutofResponse("expected a 'data' array".to_string()))
}

fn required_str(value: &Value, key: &str) -> Result<String, ShError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ShError::PlutofResponse(format!("missing '{key}'")))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
