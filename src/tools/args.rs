//! Typed tool arguments.
//!
//! Each struct mirrors one input schema from [`super::definitions`]. Fields
//! the schema marks as required are still `Option` here: presence and
//! emptiness are checked by the dispatcher so the error text can say which
//! argument is missing instead of echoing a serde message.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{
    ToolError, CREATE_SNIPPET, DELETE_SNIPPET, GET_SNIPPET, LIST_GROUPS, LIST_SNIPPETS, LIST_TAGS,
    UPDATE_SNIPPET,
};
use crate::codemenu::{SnippetChanges, SnippetFilter};

/// Arguments for `list_snippets`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListSnippetsArgs {
    pub query: Option<String>,
    pub language: Option<String>,
    pub tag: Option<String>,
    pub group: Option<String>,
}

impl From<ListSnippetsArgs> for SnippetFilter {
    fn from(args: ListSnippetsArgs) -> Self {
        Self {
            query: args.query,
            language: args.language,
            tag: args.tag,
            group: args.group,
        }
    }
}

/// Arguments for tools addressing a single snippet (`get_snippet`, `delete_snippet`).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnippetIdArgs {
    pub id: Option<String>,
}

/// Arguments for `create_snippet`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSnippetArgs {
    pub title: Option<String>,
    pub code: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub group: Option<String>,
}

/// Arguments for `update_snippet`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSnippetArgs {
    pub id: Option<String>,
    pub title: Option<String>,
    pub code: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub group: Option<String>,
}

impl UpdateSnippetArgs {
    /// Splits the arguments into the target id and the changes to apply.
    #[must_use]
    pub fn into_parts(self) -> (Option<String>, SnippetChanges) {
        let changes = SnippetChanges {
            title: self.title,
            code: self.code,
            language: self.language,
            description: self.description,
            tags: self.tags,
            group: self.group,
        };
        (self.id, changes)
    }
}

/// Tools that take no arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

/// A decoded `tools/call`.
#[derive(Debug)]
pub enum ToolCall {
    ListSnippets(ListSnippetsArgs),
    GetSnippet(SnippetIdArgs),
    ListTags,
    ListGroups,
    CreateSnippet(CreateSnippetArgs),
    UpdateSnippet(UpdateSnippetArgs),
    DeleteSnippet(SnippetIdArgs),
}

impl ToolCall {
    /// Decodes the arguments for the named tool.
    ///
    /// Missing arguments (`null`) are treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] for unrecognised names and
    /// [`ToolError::InvalidArguments`] when the arguments contain unknown
    /// fields or values of the wrong type.
    pub fn decode(name: &str, arguments: Value) -> Result<Self, ToolError> {
        let call = match name {
            LIST_SNIPPETS => Self::ListSnippets(parse(name, arguments)?),
            GET_SNIPPET => Self::GetSnippet(parse(name, arguments)?),
            LIST_TAGS => {
                parse::<NoArgs>(name, arguments)?;
                Self::ListTags
            }
            LIST_GROUPS => {
                parse::<NoArgs>(name, arguments)?;
                Self::ListGroups
            }
            CREATE_SNIPPET => Self::CreateSnippet(parse(name, arguments)?),
            UPDATE_SNIPPET => Self::UpdateSnippet(parse(name, arguments)?),
            DELETE_SNIPPET => Self::DeleteSnippet(parse(name, arguments)?),
            _ => return Err(ToolError::UnknownTool(name.to_string())),
        };
        Ok(call)
    }
}

fn parse<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Returns the value if it is present and non-empty.
pub fn required(value: Option<String>, message: &str) -> Result<String, ToolError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ToolError::MissingArgument(message.to_string()))
}
