//! CodeMenu tools exposed over MCP.
//!
//! - [`definitions`] is the tool registry: the fixed list of tool names and
//!   input schemas returned by `tools/list`.
//! - [`Dispatcher`] runs a `tools/call`: decode arguments, make one CodeMenu
//!   API request, and shape the result.
//!
//! Every input schema is closed (`additionalProperties: false`) and the
//! argument structs in [`args`] reject unknown fields, so what a client sees
//! advertised is exactly what the dispatcher reads.

pub mod args;
pub mod dispatch;

pub use args::ToolCall;
pub use dispatch::Dispatcher;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::codemenu::ApiError;

pub const LIST_SNIPPETS: &str = "list_snippets";
pub const GET_SNIPPET: &str = "get_snippet";
pub const LIST_TAGS: &str = "list_tags";
pub const LIST_GROUPS: &str = "list_groups";
pub const CREATE_SNIPPET: &str = "create_snippet";
pub const UPDATE_SNIPPET: &str = "update_snippet";
pub const DELETE_SNIPPET: &str = "delete_snippet";

/// Tools that change data in CodeMenu.
pub const MUTATING_TOOLS: [&str; 3] = [CREATE_SNIPPET, UPDATE_SNIPPET, DELETE_SNIPPET];

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Returns the text of the first content item.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| match c {
            ToolContent::Text { text } => text.as_str(),
        })
    }
}

/// Reasons a tool call fails.
///
/// All of them reach the client as a tool result with `isError: true`, never
/// as a JSON-RPC error.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The tool is not registered (or mutations are disabled).
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A required argument is missing or empty.
    #[error("{0}")]
    MissingArgument(String),

    /// Arguments do not match the tool's input schema.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments {
        /// Tool name.
        tool: String,
        /// What serde rejected.
        reason: String,
    },

    /// The CodeMenu API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The result could not be rendered as JSON text.
    #[error("failed to serialise result: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// Returns the tools advertised to clients.
///
/// The mutating tools are only included when `allow_mutations` is set.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn definitions(allow_mutations: bool) -> Vec<ToolDefinition> {
    let mut tools = vec![
        ToolDefinition {
            name: LIST_SNIPPETS.to_string(),
            description: Some(
                "List code snippets from CodeMenu without full code content (to reduce token \
                 usage). Returns id, title, description, language, abbreviation, tags, and \
                 group info, plus code_length and has_code in place of the code."
                    .to_string(),
            ),
            input_schema: schema_object(
                &json!({
                    "query": schema_string(
                        "Search query - returns snippets whose code, title, or description contain this text"
                    ),
                    "language": schema_string(
                        "Filter by programming language (e.g., javascript, python, swift)"
                    ),
                    "tag": schema_string("Filter by tag ID - returns snippets with this tag"),
                    "group": schema_string("Filter by group ID - returns snippets in this group"),
                }),
                &[],
            ),
        },
        ToolDefinition {
            name: GET_SNIPPET.to_string(),
            description: Some(
                "Get full details of a specific snippet by ID, including the complete code content"
                    .to_string(),
            ),
            input_schema: schema_object(
                &json!({
                    "id": schema_string("The unique identifier of the snippet (UUID format)"),
                }),
                &["id"],
            ),
        },
        ToolDefinition {
            name: LIST_TAGS.to_string(),
            description: Some("List all tags available in CodeMenu".to_string()),
            input_schema: schema_object(&json!({}), &[]),
        },
        ToolDefinition {
            name: LIST_GROUPS.to_string(),
            description: Some("List all groups available in CodeMenu".to_string()),
            input_schema: schema_object(&json!({}), &[]),
        },
    ];

    if allow_mutations {
        tools.extend([
            ToolDefinition {
                name: CREATE_SNIPPET.to_string(),
                description: Some(
                    "Create a new snippet in CodeMenu. Returns the created snippet as stored by \
                     CodeMenu."
                        .to_string(),
                ),
                input_schema: schema_object(
                    &json!({
                        "title": schema_string("Snippet title"),
                        "code": schema_string("The code content"),
                        "language": schema_string("Programming language (e.g., javascript, python, swift)"),
                        "description": schema_string("Optional: longer description of the snippet"),
                        "tags": schema_string_array("Optional: tag IDs to attach"),
                        "group": schema_string("Optional: group ID to place the snippet in"),
                    }),
                    &["title", "code", "language"],
                ),
            },
            ToolDefinition {
                name: UPDATE_SNIPPET.to_string(),
                description: Some(
                    "Update an existing snippet. Only the fields given are changed; at least one \
                     field besides id is required."
                        .to_string(),
                ),
                input_schema: schema_object(
                    &json!({
                        "id": schema_string("The unique identifier of the snippet to update"),
                        "title": schema_string("Optional: new title"),
                        "code": schema_string("Optional: new code content"),
                        "language": schema_string("Optional: new programming language"),
                        "description": schema_string("Optional: new description"),
                        "tags": schema_string_array("Optional: replacement list of tag IDs"),
                        "group": schema_string("Optional: new group ID"),
                    }),
                    &["id"],
                ),
            },
            ToolDefinition {
                name: DELETE_SNIPPET.to_string(),
                description: Some("Delete a snippet from CodeMenu by ID".to_string()),
                input_schema: schema_object(
                    &json!({
                        "id": schema_string("The unique identifier of the snippet to delete"),
                    }),
                    &["id"],
                ),
            },
        ]);
    }

    tools
}

fn schema_object(properties: &Value, required: &[&str]) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn schema_string(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description,
    })
}

fn schema_string_array(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": description,
    })
}
