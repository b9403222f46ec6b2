//! View Options
//!
//! Sort and search settings chosen by the user. They parameterize the
//! remote query only; local state never re-sorts.

use serde::{Deserialize, Serialize};

/// Field the remote store sorts by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortField {
    #[serde(rename = "title")]
    Title,
    #[default]
    #[serde(rename = "createdTime")]
    CreatedTime,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::CreatedTime => "createdTime",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "title" => SortField::Title,
            _ => SortField::CreatedTime,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "asc" => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

/// Sort/search settings for a list fetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOptions {
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    /// Free-text title search; blank means no filter
    #[serde(default)]
    pub query: String,
}

impl ViewOptions {
    pub fn new(sort_field: SortField, sort_direction: SortDirection) -> Self {
        Self {
            sort_field,
            sort_direction,
            query: String::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Trimmed search text, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        let term = self.query.trim();
        (!term.is_empty()).then_some(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_sort_newest_first() {
        let view = ViewOptions::default();
        assert_eq!(view.sort_field, SortField::CreatedTime);
        assert_eq!(view.sort_direction, SortDirection::Desc);
        assert_eq!(view.search_term(), None);
    }

    #[test]
    fn test_sort_names() {
        assert_eq!(SortField::from_str("title"), SortField::Title);
        assert_eq!(SortField::from_str("bogus"), SortField::CreatedTime);
        assert_eq!(SortDirection::from_str("asc").as_str(), "asc");
    }

    #[test]
    fn test_blank_query_has_no_search_term() {
        assert_eq!(ViewOptions::default().with_query("   ").search_term(), None);
        assert_eq!(ViewOptions::default().with_query(" milk ").search_term(), Some("milk"));
    }
}
