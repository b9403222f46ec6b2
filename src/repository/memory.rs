//! In-Memory Repository
//!
//! Stand-in for the remote store: keeps records in a Vec, emulates the
//! remote sort and title search, and can be told to fail or to be slow.
//! List continuation is not emulated; every list returns all matches.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::query::ListQuery;
use super::traits::RecordRepository;
use crate::domain::{DomainError, DomainResult, RemoteRecord, SortDirection, SortField, TodoId};

#[derive(Default)]
struct Inner {
    records: Vec<RemoteRecord>,
    next_id: u64,
    failures: VecDeque<String>,
}

/// In-memory implementation of the record repository
#[derive(Default)]
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
    latency: Option<Duration>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing records
    pub fn with_records(records: Vec<RemoteRecord>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                records,
                ..Default::default()
            }),
            latency: None,
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next call fail with a transport error
    pub async fn fail_next(&self, message: &str) {
        self.inner.lock().await.failures.push_back(message.to_string());
    }

    /// Current contents, in insertion order
    pub async fn records(&self) -> Vec<RemoteRecord> {
        self.inner.lock().await.records.clone()
    }

    pub async fn get(&self, id: &TodoId) -> Option<RemoteRecord> {
        self.inner
            .lock()
            .await
            .records
            .iter()
            .find(|record| record.id.as_deref() == Some(id.as_str()))
            .cloned()
    }

    async fn begin_call(&self) -> DomainResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.inner.lock().await.failures.pop_front() {
            Some(message) => Err(DomainError::Transport(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordRepository for InMemoryRepository {
    async fn list(&self, query: &ListQuery) -> DomainResult<Vec<RemoteRecord>> {
        self.begin_call().await?;
        let inner = self.inner.lock().await;

        let mut records: Vec<RemoteRecord> = inner
            .records
            .iter()
            .filter(|record| match &query.search {
                Some(term) => title_of(record).contains(term.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        match query.sort_field {
            SortField::Title => records.sort_by(|a, b| title_of(a).cmp(title_of(b))),
            SortField::CreatedTime => records.sort_by_key(|record| record.created_time),
        }
        if query.sort_direction == SortDirection::Desc {
            records.reverse();
        }

        Ok(records)
    }

    async fn create(&self, fields: &Map<String, Value>) -> DomainResult<RemoteRecord> {
        self.begin_call().await?;
        let mut inner = self.inner.lock().await;

        inner.next_id += 1;
        let seconds = i64::try_from(inner.next_id).unwrap_or(i64::MAX);
        let record = RemoteRecord {
            id: Some(format!("rec{:04}", inner.next_id)),
            created_time: TimeDelta::try_seconds(seconds).map(|offset| DateTime::<Utc>::UNIX_EPOCH + offset),
            fields: fields.clone(),
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &TodoId, fields: &Map<String, Value>) -> DomainResult<RemoteRecord> {
        self.begin_call().await?;
        let mut inner = self.inner.lock().await;

        let record = inner
            .records
            .iter_mut()
            .find(|record| record.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| DomainError::Transport("Not Found".to_string()))?;
        for (key, value) in fields {
            // Null clears the field
            if value.is_null() {
                record.fields.remove(key);
            } else {
                record.fields.insert(key.clone(), value.clone());
            }
        }
        Ok(record.clone())
    }
}

fn title_of(record: &RemoteRecord) -> &str {
    record.fields.get("title").and_then(Value::as_str).unwrap_or_default()
}
