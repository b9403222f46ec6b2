//! Todo Entity
//!
//! A todo as held in local state, the remote record shape it is built from,
//! and the partial edit used by update/revert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::{DomainError, DomainResult, Entity};

const ID_KEY: &str = "id";
const FIELDS_KEY: &str = "fields";
const TITLE_KEY: &str = "title";
const COMPLETED_KEY: &str = "isCompleted";
const LEGACY_COMPLETED_KEY: &str = "completed";
const CREATED_TIME_KEY: &str = "createdTime";

/// Keys with a dedicated slot on `Todo`; everything else lands in `extra`
const RESERVED_KEYS: &[&str] = &[ID_KEY, TITLE_KEY, COMPLETED_KEY, LEGACY_COMPLETED_KEY, CREATED_TIME_KEY];

/// Opaque todo identifier, assigned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TodoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A record as the remote store returns it: `{id, createdTime, fields}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RemoteRecord {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: Some(id.into()),
            created_time: None,
            fields,
        }
    }
}

/// A todo item in local state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    pub title: String,
    /// Completion status
    #[serde(default)]
    pub is_completed: bool,
    /// Creation time reported by the remote store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    /// Remote fields with no dedicated slot, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Todo {
    /// Create a new, not yet completed todo
    pub fn new(id: impl Into<TodoId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_completed: false,
            created_time: None,
            extra: Map::new(),
        }
    }

    /// Normalize a remote record
    ///
    /// The id comes from the record, falling back to `fields.id`. Records
    /// with no usable id are rejected.
    pub fn from_record(record: &RemoteRecord) -> DomainResult<Self> {
        let id = record
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| record.fields.get(ID_KEY).and_then(id_from_value));
        Self::from_fields(id, &record.fields, record.created_time)
    }

    /// Normalize raw JSON: either `{id, fields: {...}}` or a bare fields object
    pub fn from_value(value: &Value) -> DomainResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| DomainError::InvalidInput("record is not an object".to_string()))?;

        match object.get(FIELDS_KEY).and_then(Value::as_object) {
            Some(fields) => {
                let id = object
                    .get(ID_KEY)
                    .and_then(id_from_value)
                    .or_else(|| fields.get(ID_KEY).and_then(id_from_value));
                let created_time = object.get(CREATED_TIME_KEY).and_then(parse_time);
                Self::from_fields(id, fields, created_time)
            }
            None => Self::from_fields(object.get(ID_KEY).and_then(id_from_value), object, None),
        }
    }

    fn from_fields(
        id: Option<String>,
        fields: &Map<String, Value>,
        record_created_time: Option<DateTime<Utc>>,
    ) -> DomainResult<Self> {
        let id = id.ok_or_else(|| DomainError::InvalidInput("record has no id".to_string()))?;

        let title = fields
            .get(TITLE_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        // `isCompleted` wins unless it is missing or null
        let completed = match fields.get(COMPLETED_KEY) {
            Some(value) if !value.is_null() => Some(value),
            _ => fields.get(LEGACY_COMPLETED_KEY),
        };

        let created_time = fields
            .get(CREATED_TIME_KEY)
            .and_then(parse_time)
            .or(record_created_time);

        // Null marks a removal in `TodoEdit`, so it never lives in `extra`
        let extra = fields
            .iter()
            .filter(|(key, value)| !is_reserved(key) && !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            id: TodoId(id),
            title,
            is_completed: completed.map(is_truthy).unwrap_or(false),
            created_time,
            extra,
        })
    }

    /// Merge an edit into this todo; fields the edit leaves out survive.
    /// A null extra field removes the key.
    pub fn merge(&mut self, edit: &TodoEdit) {
        if let Some(title) = &edit.title {
            self.title = title.clone();
        }
        if let Some(completed) = edit.is_completed {
            self.is_completed = completed;
        }
        for (key, value) in edit.extra_fields() {
            if value.is_null() {
                self.extra.remove(key);
            } else {
                self.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

impl Entity for Todo {
    type Id = TodoId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Partial todo: `None` fields are left as they are
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoEdit {
    pub id: TodoId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TodoEdit {
    pub fn new(id: impl Into<TodoId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            is_completed: None,
            extra: Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.is_completed = Some(completed);
        self
    }

    /// Whether merging into `todo` would change anything
    pub fn changes(&self, todo: &Todo) -> bool {
        self.title.as_ref().is_some_and(|title| *title != todo.title)
            || self.is_completed.is_some_and(|completed| completed != todo.is_completed)
            || self.extra_fields().any(|(key, value)| match todo.extra.get(key) {
                Some(current) => current != value,
                None => !value.is_null(),
            })
    }

    /// Extra fields, minus keys that have a dedicated slot on `Todo`
    pub fn extra_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.extra.iter().filter(|(key, _)| !is_reserved(key))
    }

    /// Edit that puts `snapshot` back after `attempted` was applied on top of it
    pub fn undo(snapshot: &Todo, attempted: &TodoEdit) -> Self {
        let mut edit = Self::from(snapshot);
        for (key, _) in attempted.extra_fields() {
            if !snapshot.extra.contains_key(key) {
                edit.extra.insert(key.clone(), Value::Null);
            }
        }
        edit
    }

    /// Remote fields for a PATCH carrying this edit
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields: Map<String, Value> = self
            .extra_fields()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if let Some(title) = &self.title {
            fields.insert(TITLE_KEY.to_string(), Value::String(title.clone()));
        }
        if let Some(completed) = self.is_completed {
            fields.insert(COMPLETED_KEY.to_string(), Value::Bool(completed));
        }
        fields
    }
}

/// Full snapshot of a todo, used to undo an optimistic change
impl From<&Todo> for TodoEdit {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.clone(),
            title: Some(todo.title.clone()),
            is_completed: Some(todo.is_completed),
            extra: todo.extra.clone(),
        }
    }
}

/// Fields for creating a new todo remotely
pub fn new_todo_fields(title: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(TITLE_KEY.to_string(), Value::String(title.to_string()));
    fields.insert(COMPLETED_KEY.to_string(), Value::Bool(false));
    fields
}

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// JSON truthiness: `false`, `0`, `""` and `null` are false
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|time| time.with_timezone(&Utc))
}
