//! List Query Builder
//!
//! Turns view options into Airtable list parameters: a single-key sort,
//! an optional title search formula, and page continuation.

use crate::domain::{SortDirection, SortField, ViewOptions};

/// Parameters for one list request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    /// Trimmed, non-empty search text
    pub search: Option<String>,
    pub page_size: Option<u32>,
    /// Continuation token from the previous page
    pub offset: Option<String>,
}

impl ListQuery {
    pub fn from_view(view: &ViewOptions) -> Self {
        Self {
            sort_field: view.sort_field,
            sort_direction: view.sort_direction,
            search: view.search_term().map(str::to_string),
            page_size: None,
            offset: None,
        }
    }

    /// Same query, continuing from `offset`
    pub fn with_offset(&self, offset: Option<String>) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    /// `SEARCH("<text>",{title})`, or `None` without a search
    pub fn filter_formula(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|text| format!("SEARCH(\"{}\",{{title}})", escape_formula_string(text)))
    }

    /// Query-string pairs in request order
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("sort[0][field]".to_string(), self.sort_field.as_str().to_string()),
            ("sort[0][direction]".to_string(), self.sort_direction.as_str().to_string()),
        ];
        if let Some(formula) = self.filter_formula() {
            params.push(("filterByFormula".to_string(), formula));
        }
        if let Some(page_size) = self.page_size {
            params.push(("pageSize".to_string(), page_size.to_string()));
        }
        if let Some(offset) = &self.offset {
            params.push(("offset".to_string(), offset.clone()));
        }
        params
    }
}

/// Escape text for use inside a double-quoted formula string
pub fn escape_formula_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}
