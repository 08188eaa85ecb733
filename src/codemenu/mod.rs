//! CodeMenu snippet API access.
//!
//! The local CodeMenu API (default `http://127.0.0.1:1300/v1`) exposes:
//!
//! | Endpoint                 | Used by                          |
//! |--------------------------|----------------------------------|
//! | `GET /snippets/`         | `list_snippets`, `get_snippet`   |
//! | `GET /snippets/{id}/`    | `get_snippet` (direct lookup)    |
//! | `POST /snippets/`        | `create_snippet`                 |
//! | `PATCH /snippets/{id}/`  | `update_snippet`                 |
//! | `DELETE /snippets/{id}/` | `delete_snippet`                 |
//! | `GET /tags/`             | `list_tags`                      |
//! | `GET /groups/`           | `list_groups`                    |
//!
//! Only the listing endpoints are served by the local API; the direct lookup
//! and mutation endpoints are for hosted deployments and are opt-in.

pub mod client;
pub mod error;
pub mod model;

pub use client::{AuthScheme, ClientSettings, CodeMenuClient, Payload, SnippetLookup};
pub use error::{ApiError, ApiResult};
pub use model::{summarize_snippet, NewSnippet, SnippetChanges, SnippetFilter};
