//! Airtable Repository
//!
//! `RecordRepository` over the Airtable REST API using reqwest.
//! - list: GET with sort/filter params, following `offset` continuation
//! - create: POST `{"records":[{"fields":...}]}`
//! - update: PATCH `{"records":[{"id":...,"fields":...}]}`

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::config::RemoteConfig;
use super::query::ListQuery;
use super::traits::RecordRepository;
use crate::domain::{DomainError, DomainResult, RemoteRecord, TodoId};

const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<RemoteRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    records: Vec<WriteRecord<'a>>,
}

#[derive(Debug, Serialize)]
struct WriteRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    fields: &'a Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    #[serde(default)]
    records: Vec<RemoteRecord>,
}

/// Airtable implementation of the record repository
pub struct AirtableRepository {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl AirtableRepository {
    pub fn new(config: RemoteConfig) -> DomainResult<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| DomainError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> DomainResult<T> {
        let response = request
            .header(AUTHORIZATION, self.config.authorization())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Remote store answered {}", status);
            return Err(status_error(status));
        }

        let body = response.text().await.map_err(transport_error)?;
        serde_json::from_str(&body)
            .map_err(|e| DomainError::Internal(format!("Failed to parse response: {}", e)))
    }

    async fn write(&self, request: RequestBuilder, id: Option<&str>, fields: &Map<String, Value>) -> DomainResult<RemoteRecord> {
        let body = WriteRequest {
            records: vec![WriteRecord { id, fields }],
        };
        let response: WriteResponse = self.send(request.json(&body)).await?;
        response
            .records
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::Internal("response contained no records".to_string()))
    }
}

#[async_trait]
impl RecordRepository for AirtableRepository {
    async fn list(&self, query: &ListQuery) -> DomainResult<Vec<RemoteRecord>> {
        let url = self.config.records_url();
        let mut page = query.clone();
        let mut records = Vec::new();
        let mut seen_offsets: HashSet<String> = page.offset.iter().cloned().collect();

        loop {
            let response: ListResponse = self.send(self.client.get(&url).query(&page.to_params())).await?;
            records.extend(response.records);

            match response.offset {
                // A token already followed would cycle forever
                Some(offset) if seen_offsets.insert(offset.clone()) => {
                    page = page.with_offset(Some(offset));
                }
                Some(offset) => {
                    log::warn!("Stopping at repeated offset {}", offset);
                    break;
                }
                None => break,
            }
        }

        log::debug!("Fetched {} records from {}", records.len(), self.config.table_name);
        Ok(records)
    }

    async fn create(&self, fields: &Map<String, Value>) -> DomainResult<RemoteRecord> {
        let request = self.client.post(self.config.records_url());
        self.write(request, None, fields).await
    }

    async fn update(&self, id: &TodoId, fields: &Map<String, Value>) -> DomainResult<RemoteRecord> {
        let request = self.client.patch(self.config.records_url());
        self.write(request, Some(id.as_str()), fields).await
    }
}

/// Non-2xx status as a transport failure carrying the status text
fn status_error(status: StatusCode) -> DomainError {
    match status.canonical_reason() {
        Some(reason) => DomainError::Transport(reason.to_string()),
        None => DomainError::Transport(format!("Request failed with status {}", status.as_u16())),
    }
}

fn transport_error(e: reqwest::Error) -> DomainError {
    let message = e.to_string();
    if message.is_empty() {
        DomainError::Transport(DEFAULT_FAILURE_MESSAGE.to_string())
    } else {
        DomainError::Transport(message)
    }
}
