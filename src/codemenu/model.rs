//! Request-side CodeMenu records.
//!
//! Responses are passed through as [`serde_json::Value`]; CodeMenu owns the
//! snippet schema, so nothing here validates what comes back. The types in
//! this module describe what we *send*.

use serde::Serialize;
use serde_json::Value;

/// Optional filters for listing snippets.
///
/// Empty strings are treated the same as absent filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetFilter {
    /// Text to match against code, title or description.
    pub query: Option<String>,
    /// Programming language.
    pub language: Option<String>,
    /// Tag identifier.
    pub tag: Option<String>,
    /// Group identifier.
    pub group: Option<String>,
}

impl SnippetFilter {
    /// Returns the query parameters for the non-empty filters, in a fixed order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("query", &self.query),
            ("language", &self.language),
            ("tag", &self.tag),
            ("group", &self.group),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (name, v))
        })
        .collect()
    }
}

/// Body of a snippet creation request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewSnippet {
    /// Snippet title.
    pub title: String,
    /// Code body.
    pub code: String,
    /// Language tag.
    pub language: String,
    /// Longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tag identifiers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Group identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Body of a partial snippet update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SnippetChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl SnippetChanges {
    /// Returns `true` if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.code.is_none()
            && self.language.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.group.is_none()
    }
}

/// Returns `true` if `snippet` has an `id` equal to `id`.
///
/// Numeric identifiers are compared by their decimal form.
#[must_use]
pub fn snippet_has_id(snippet: &Value, id: &str) -> bool {
    match snippet.get("id") {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

/// Replaces a snippet's `code` with `code_length` and `has_code`.
///
/// Keeps listings small: an assistant browsing snippets rarely needs every
/// code body, and can fetch one with `get_snippet`. Non-object values are
/// returned unchanged.
#[must_use]
pub fn summarize_snippet(snippet: Value) -> Value {
    let Value::Object(mut fields) = snippet else {
        return snippet;
    };

    let code = fields.shift_remove("code");
    let code_length = match &code {
        Some(Value::String(s)) => s.chars().count(),
        _ => 0,
    };
    let has_code = matches!(&code, Some(Value::String(s)) if !s.is_empty());

    fields.insert("code_length".to_string(), Value::from(code_length));
    fields.insert("has_code".to_string(), Value::Bool(has_code));
    Value::Object(fields)
}
