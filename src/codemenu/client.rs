//! HTTP client for the CodeMenu API.
//!
//! Each public method performs exactly one request. There are no retries and
//! no timeout beyond the `reqwest` defaults; a call either completes or fails
//! with an [`ApiError`].

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::error::{ApiError, ApiResult};
use super::model::{snippet_has_id, NewSnippet, SnippetChanges, SnippetFilter};

/// How the API key is sent to CodeMenu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `?key=<api key>` on every request (the local CodeMenu API).
    #[default]
    Query,
    /// `Authorization: Bearer <api key>` header.
    Bearer,
}

/// How a single snippet is fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetLookup {
    /// List every snippet and pick the matching one locally.
    #[default]
    Scan,
    /// `GET /snippets/{id}/`.
    Direct,
}

/// Everything the client needs to reach CodeMenu.
#[derive(Clone)]
pub struct ClientSettings {
    /// API base URL, including any version prefix (e.g. `/v1`).
    pub base_url: Url,
    /// API key, if one is required.
    pub api_key: Option<String>,
    /// How the key is sent.
    pub auth: AuthScheme,
    /// How `get_snippet` finds a snippet.
    pub snippet_lookup: SnippetLookup,
}

impl ClientSettings {
    /// Settings for an unauthenticated API at `base_url`.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            auth: AuthScheme::Query,
            snippet_lookup: SnippetLookup::Scan,
        }
    }
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("auth", &self.auth)
            .field("snippet_lookup", &self.snippet_lookup)
            .finish()
    }
}

/// A successfully received response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// JSON document.
    Json(Value),
    /// Non-JSON text.
    Text(String),
    /// Zero-length (or whitespace-only) body.
    Empty,
}

impl Payload {
    fn from_body(body: String, declared_json: bool) -> Result<Self, serde_json::Error> {
        if body.trim().is_empty() {
            return Ok(Self::Empty);
        }
        if declared_json {
            return serde_json::from_str(&body).map(Self::Json);
        }
        // Some servers label JSON as text/plain; only accept structured documents.
        match serde_json::from_str::<Value>(&body) {
            Ok(value @ (Value::Array(_) | Value::Object(_))) => Ok(Self::Json(value)),
            _ => Ok(Self::Text(body)),
        }
    }
}

/// Client for the CodeMenu snippet API.
#[derive(Debug, Clone)]
pub struct CodeMenuClient {
    http: Client,
    settings: ClientSettings,
}

impl CodeMenuClient {
    /// Creates a client for the given settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key cannot be used as a header value or
    /// the HTTP client cannot be built.
    pub fn new(settings: ClientSettings) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        if settings.auth == AuthScheme::Bearer {
            if let Some(ref api_key) = settings.api_key {
                let mut value = HeaderValue::from_str(&format!("Bearer {api_key}"))
                    .map_err(|_| ApiError::InvalidApiKey)?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
        }

        let http = Client::builder()
            .user_agent(concat!("codemenu-mcp/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self { http, settings })
    }

    /// Builds the URL for an endpoint.
    ///
    /// `segments` are appended to the base path (percent-encoded) followed by
    /// a trailing slash. The API key comes first in the query string when the
    /// query authentication scheme is in use, then `query` in order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidSegment`] for a `.` or `..` segment, which
    /// URL normalisation would otherwise drop or resolve against the parent.
    /// Returns [`ApiError::InvalidBaseUrl`] if the base URL cannot take a path.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> ApiResult<Url> {
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(ApiError::InvalidSegment {
                segment: (*segment).to_string(),
            });
        }

        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend(segments)
            .push("");

        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(query.len() + 1);
        if self.settings.auth == AuthScheme::Query {
            if let Some(ref api_key) = self.settings.api_key {
                pairs.push(("key", api_key.as_str()));
            }
        }
        pairs.extend_from_slice(query);

        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }

    /// Lists snippets matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not a JSON array.
    pub async fn list_snippets(&self, filter: &SnippetFilter) -> ApiResult<Vec<Value>> {
        let url = self.endpoint(&["snippets"], &filter.query_pairs())?;
        let payload = self.send(self.http.get(url.clone()), &url).await?;
        expect_array(payload, &url)
    }

    /// Fetches one snippet by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::SnippetNotFound`] if no snippet has this identifier,
    /// or any other error from the underlying request.
    pub async fn get_snippet(&self, id: &str) -> ApiResult<Value> {
        match self.settings.snippet_lookup {
            SnippetLookup::Scan => {
                let snippets = self.list_snippets(&SnippetFilter::default()).await?;
                snippets
                    .into_iter()
                    .find(|s| snippet_has_id(s, id))
                    .ok_or_else(|| ApiError::SnippetNotFound { id: id.to_string() })
            }
            SnippetLookup::Direct => {
                let url = self.endpoint(&["snippets", id], &[])?;
                let payload = self
                    .send(self.http.get(url.clone()), &url)
                    .await
                    .map_err(|e| not_found_for(e, id))?;
                match payload {
                    Payload::Json(snippet @ Value::Object(_)) => Ok(snippet),
                    _ => Err(ApiError::UnexpectedShape {
                        url: redact(&url),
                        reason: "expected a JSON object".to_string(),
                    }),
                }
            }
        }
    }

    /// Lists all tags.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_tags(&self) -> ApiResult<Payload> {
        let url = self.endpoint(&["tags"], &[])?;
        self.send(self.http.get(url.clone()), &url).await
    }

    /// Lists all groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_groups(&self) -> ApiResult<Payload> {
        let url = self.endpoint(&["groups"], &[])?;
        self.send(self.http.get(url.clone()), &url).await
    }

    /// Creates a snippet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create_snippet(&self, snippet: &NewSnippet) -> ApiResult<Payload> {
        let url = self.endpoint(&["snippets"], &[])?;
        self.send(self.http.post(url.clone()).json(snippet), &url)
            .await
    }

    /// Applies a partial update to a snippet.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::SnippetNotFound`] on a 404, or any other error from
    /// the underlying request.
    pub async fn update_snippet(&self, id: &str, changes: &SnippetChanges) -> ApiResult<Payload> {
        let url = self.endpoint(&["snippets", id], &[])?;
        self.send(self.http.patch(url.clone()).json(changes), &url)
            .await
            .map_err(|e| not_found_for(e, id))
    }

    /// Deletes a snippet.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::SnippetNotFound`] on a 404, or any other error from
    /// the underlying request.
    pub async fn delete_snippet(&self, id: &str) -> ApiResult<Payload> {
        let url = self.endpoint(&["snippets", id], &[])?;
        self.send(self.http.delete(url.clone()), &url)
            .await
            .map_err(|e| not_found_for(e, id))
    }

    /// Sends a request and classifies the outcome.
    async fn send(&self, request: RequestBuilder, url: &Url) -> ApiResult<Payload> {
        let display_url = redact(url);
        debug!(url = %display_url, "CodeMenu API request");

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Unreachable {
                url: display_url.clone(),
                source: e.without_url(),
            })?;

        let status = response.status();
        let declared_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let body = response.text().await.map_err(|e| ApiError::Body {
            url: display_url.clone(),
            source: e.without_url(),
        })?;

        debug!(url = %display_url, status = status.as_u16(), bytes = body.len(), "CodeMenu API response");

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        Payload::from_body(body, declared_json).map_err(|e| ApiError::UnexpectedShape {
            url: display_url,
            reason: format!("invalid JSON: {e}"),
        })
    }
}

/// Returns `url` without its query string.
fn redact(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url
}

fn expect_array(payload: Payload, url: &Url) -> ApiResult<Vec<Value>> {
    match payload {
        Payload::Json(Value::Array(items)) => Ok(items),
        Payload::Empty => Ok(Vec::new()),
        _ => Err(ApiError::UnexpectedShape {
            url: redact(url),
            reason: "expected a JSON array".to_string(),
        }),
    }
}

fn not_found_for(error: ApiError, id: &str) -> ApiError {
    match error {
        ApiError::Status { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
            ApiError::SnippetNotFound { id: id.to_string() }
        }
        other => other,
    }
}
