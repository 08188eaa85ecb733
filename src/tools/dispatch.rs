//! Tool call dispatch.
//!
//! One `tools/call` becomes at most one CodeMenu API request. Argument
//! problems are reported before anything is sent.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::args::{required, ToolCall};
use super::{definitions, ToolCallResult, ToolDefinition, ToolError, MUTATING_TOOLS};
use crate::codemenu::{summarize_snippet, CodeMenuClient, NewSnippet, Payload};
use crate::config::ToolsConfig;

/// Maps tool invocations to CodeMenu API calls.
#[derive(Debug)]
pub struct Dispatcher {
    client: CodeMenuClient,
    tools: ToolsConfig,
    definitions: Vec<ToolDefinition>,
}

impl Dispatcher {
    /// Creates a dispatcher using `client` for all API calls.
    #[must_use]
    pub fn new(client: CodeMenuClient, tools: ToolsConfig) -> Self {
        Self {
            client,
            tools,
            definitions: definitions(tools.allow_mutations),
        }
    }

    /// Returns the advertised tools.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Returns `true` if `name` is an advertised tool.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.definitions.iter().any(|t| t.name == name)
    }

    /// Runs a tool call. Failures come back as error results, never as `Err`.
    pub async fn call(&self, name: &str, arguments: Value) -> ToolCallResult {
        if MUTATING_TOOLS.contains(&name) {
            info!(tool = name, "Mutating tool call");
        } else {
            debug!(tool = name, "Tool call");
        }

        match self.execute(name, arguments).await {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => {
                let unreachable = matches!(&e, ToolError::Api(api) if api.is_unreachable());
                warn!(tool = name, unreachable, error = %e, "Tool call failed");
                ToolCallResult::error(format!("Error: {e}"))
            }
        }
    }

    async fn execute(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        if !self.is_registered(name) {
            return Err(ToolError::UnknownTool(name.to_string()));
        }

        match ToolCall::decode(name, arguments)? {
            ToolCall::ListSnippets(args) => {
                let snippets = self.client.list_snippets(&args.into()).await?;
                let snippets: Vec<Value> = if self.tools.summarize_listings {
                    snippets.into_iter().map(summarize_snippet).collect()
                } else {
                    snippets
                };
                Ok(serde_json::to_string_pretty(&snippets)?)
            }

            ToolCall::GetSnippet(args) => {
                let id = required(args.id, "Snippet ID is required")?;
                let snippet = self.client.get_snippet(&id).await?;
                Ok(serde_json::to_string_pretty(&snippet)?)
            }

            ToolCall::ListTags => render(self.client.list_tags().await?, || json!([])),

            ToolCall::ListGroups => render(self.client.list_groups().await?, || json!([])),

            ToolCall::CreateSnippet(args) => {
                let snippet = NewSnippet {
                    title: required(args.title, "Missing required parameter: title")?,
                    code: required(args.code, "Missing required parameter: code")?,
                    language: required(args.language, "Missing required parameter: language")?,
                    description: args.description,
                    tags: args.tags,
                    group: args.group,
                };
                let payload = self.client.create_snippet(&snippet).await?;
                render(payload, || json!({ "created": true }))
            }

            ToolCall::UpdateSnippet(args) => {
                let (id, changes) = args.into_parts();
                let id = required(id, "Snippet ID is required")?;
                if changes.is_empty() {
                    return Err(ToolError::MissingArgument(
                        "No changes given: provide at least one of title, code, language, \
                         description, tags, group"
                            .to_string(),
                    ));
                }
                let payload = self.client.update_snippet(&id, &changes).await?;
                render(payload, || json!({ "id": id, "updated": true }))
            }

            ToolCall::DeleteSnippet(args) => {
                let id = required(args.id, "Snippet ID is required")?;
                let payload = self.client.delete_snippet(&id).await?;
                render(payload, || json!({ "id": id, "deleted": true }))
            }
        }
    }
}

/// Renders a response body as tool text: JSON pretty-printed with two-space
/// indentation, text verbatim, and `on_empty` for an empty body.
fn render(payload: Payload, on_empty: impl FnOnce() -> Value) -> Result<String, ToolError> {
    match payload {
        Payload::Json(value) => Ok(serde_json::to_string_pretty(&value)?),
        Payload::Text(text) => Ok(text),
        Payload::Empty => Ok(serde_json::to_string_pretty(&on_empty())?),
    }
}
